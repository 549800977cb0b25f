use axum::{routing::any, Router};

use crate::server::AppRouter;

pub(super) fn router() -> AppRouter {
    Router::new().route("/ping", any(ping))
}

async fn ping() -> &'static str {
    "pong"
}
