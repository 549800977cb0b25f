use app_helpers::file_name::attachment_disposition;
use app_media::{ByteStream, MediaDownload, MediaError};
use axum::{
    body::Body,
    extract::rejection::QueryRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, warn};

pub type ApiResult<T> = Result<T, ApiError>;

const OCTET_STREAM: &str = "application/octet-stream";

/// A JSON `{"error": "..."}` response
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiError {
    pub fn new<T: Into<String>>(status: StatusCode, message: T) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found<T: Into<String>>(message: T) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: &self.message,
            }),
        )
            .into_response()
    }
}

const fn media_error_status(err: &MediaError) -> StatusCode {
    match err {
        MediaError::MissingParameter | MediaError::InvalidUrl(_) | MediaError::ExtractionFailed(_) => {
            StatusCode::BAD_REQUEST
        }
        MediaError::MediaNotFound => StatusCode::NOT_FOUND,
        MediaError::Busy => StatusCode::SERVICE_UNAVAILABLE,
        MediaError::ExtractionTimeout(_)
        | MediaError::DownloadFailed(_)
        | MediaError::UpstreamConnectionFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        let status = media_error_status(&err);

        if status.is_server_error() {
            warn!(?err, status = status.as_u16(), "Request failed");
        } else {
            debug!(?err, status = status.as_u16(), "Request rejected");
        }

        Self::new(status, err.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

/// Media played back inline by the browser
pub struct InlineMedia {
    content_type: &'static str,
    body: ByteStream,
}

impl InlineMedia {
    pub fn video(body: ByteStream) -> Self {
        Self {
            content_type: app_media::handlers::VIDEO_CONTENT_TYPE,
            body,
        }
    }
}

impl IntoResponse for InlineMedia {
    fn into_response(self) -> Response {
        (
            [(header::CONTENT_TYPE, HeaderValue::from_static(self.content_type))],
            Body::from_stream(self.body),
        )
            .into_response()
    }
}

/// A file the browser should save instead of display
pub struct Attachment(pub MediaDownload);

impl IntoResponse for Attachment {
    fn into_response(self) -> Response {
        let MediaDownload {
            content_type,
            file_name,
            body,
        } = self.0;

        let content_type = HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static(OCTET_STREAM));
        let disposition = HeaderValue::from_str(&attachment_disposition(&file_name))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

        (
            [
                (header::CONTENT_TYPE, content_type),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            Body::from_stream(body),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn media_errors_map_to_statuses() {
        for (err, status) in [
            (MediaError::MissingParameter, 400),
            (MediaError::InvalidUrl("x".into()), 400),
            (MediaError::ExtractionFailed("x".into()), 400),
            (MediaError::DownloadFailed("x".into()), 500),
            (MediaError::ExtractionTimeout(Duration::from_secs(1)), 500),
            (MediaError::MediaNotFound, 404),
            (MediaError::UpstreamConnectionFailed("x".into()), 500),
            (MediaError::Busy, 503),
        ] {
            assert_eq!(media_error_status(&err).as_u16(), status, "{err:?}");
        }
    }
}
