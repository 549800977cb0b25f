use std::time::Duration;

use app_media::{MediaInfo, MediaRequest};
use axum::{
    error_handling::HandleErrorLayer,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    BoxError, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tower::{timeout::error::Elapsed, ServiceBuilder};
use tracing::warn;

use crate::server::{
    app_response::{ApiError, ApiResult, InlineMedia},
    AppRouter, AppState,
};

#[derive(Debug, Deserialize)]
struct UrlQuery {
    url: Option<String>,
}

pub(super) fn router(info_timeout: Duration) -> AppRouter {
    Router::new()
        .route(
            "/api/info",
            get(info).layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(info_failed))
                    .timeout(info_timeout),
            ),
        )
        .route("/api/stream", get(stream))
}

async fn info(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<UrlQuery>, ApiError>,
) -> ApiResult<Json<MediaInfo>> {
    let request = MediaRequest::parse(query.url.as_deref(), None)?;

    let info = state.media.fetch_info(&request).await?;

    Ok(Json(info))
}

async fn info_failed(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        warn!("Media info lookup ran out of time");
        return ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Media info lookup timed out",
        );
    }

    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

async fn stream(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<UrlQuery>, ApiError>,
) -> ApiResult<InlineMedia> {
    let request = MediaRequest::parse(query.url.as_deref(), None)?;

    let body = state.media.preview_stream(&request.url).await?;

    Ok(InlineMedia::video(body))
}
