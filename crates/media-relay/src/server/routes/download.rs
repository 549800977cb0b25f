use app_media::MediaRequest;
use axum::{
    extract::{Query, State},
    routing::get,
    Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use tracing::info;

use crate::server::{
    app_response::{ApiError, ApiResult, Attachment},
    AppRouter, AppState,
};

#[derive(Debug, Deserialize)]
struct DownloadQuery {
    url: Option<String>,
    quality: Option<String>,
}

pub(super) fn router() -> AppRouter {
    Router::new().route("/download", get(download))
}

async fn download(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<DownloadQuery>, ApiError>,
) -> ApiResult<Attachment> {
    let request = MediaRequest::parse(query.url.as_deref(), query.quality.as_deref())?;

    let download = state.media.stream_download(&request).await?;

    info!(
        file_name = %download.file_name,
        content_type = %download.content_type,
        "Sending download"
    );

    Ok(Attachment(download))
}
