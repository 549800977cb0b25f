use std::any::Any;

use axum::{
    extract::OriginalUri,
    handler::HandlerWithoutStateExt,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, services::ServeDir};

use super::{app_response::ApiError, AppRouter, RouterOptions};

mod api;
mod download;
mod index;

pub(super) fn router(options: &RouterOptions) -> AppRouter {
    let router = Router::new()
        .merge(index::router())
        .merge(api::router(options.info_timeout))
        .merge(download::router());

    let router = match &options.public_dir {
        Some(public_dir) => router.fallback_service(
            ServeDir::new(public_dir).not_found_service(handle_404.into_service()),
        ),
        None => router.fallback(handle_404),
    };

    router.layer(CatchPanicLayer::custom(
        |err: Box<dyn Any + Send + 'static>| -> Response<_> {
            let details = err.downcast_ref::<String>().map_or_else(
                || {
                    err.downcast_ref::<&str>().map_or_else(
                        || "Unknown panic message".to_string(),
                        |s| (*s).to_string(),
                    )
                },
                std::clone::Clone::clone,
            );

            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, details).into_response()
        },
    ))
}

async fn handle_404(method: Method, OriginalUri(uri): OriginalUri) -> ApiError {
    ApiError::not_found(format!("Unknown route: [{method}] {}", uri.path()))
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
        time::Duration,
    };

    use app_media::{
        ByteStream, ExtractorInfo, MediaError, MediaExtractor, MediaHandlers, StreamRequest,
        UpstreamBody, WebFetcher,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
    };
    use bytes::Bytes;
    use futures::{stream, StreamExt};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use url::Url;

    use super::*;
    use crate::server::{app, AppState};

    #[derive(Default)]
    struct FakeExtractor {
        info: Option<Value>,
        error: Option<fn() -> MediaError>,
        delay: Option<Duration>,
        info_calls: AtomicUsize,
        formats: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl MediaExtractor for FakeExtractor {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn fetch_info(
            &self,
            _url: &Url,
            _format: Option<&str>,
        ) -> Result<ExtractorInfo, MediaError> {
            self.info_calls.fetch_add(1, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            if let Some(error) = self.error {
                return Err(error());
            }

            self.info
                .clone()
                .map(|x| serde_json::from_value(x).expect("valid info"))
                .ok_or_else(|| MediaError::ExtractionFailed("Unsupported URL".to_string()))
        }

        async fn stream(&self, request: StreamRequest) -> Result<ByteStream, MediaError> {
            self.formats.lock().expect("lock").push(request.format);

            if let Some(error) = self.error {
                return Err(error());
            }

            Ok(stream::iter([Ok(Bytes::from_static(b"video-bytes"))]).boxed())
        }
    }

    fn timed_out() -> MediaError {
        MediaError::ExtractionTimeout(Duration::from_secs(15))
    }

    const fn busy() -> MediaError {
        MediaError::Busy
    }

    struct FakeWeb;

    #[async_trait::async_trait]
    impl WebFetcher for FakeWeb {
        async fn og_image(&self, _page: &Url) -> Result<Option<Url>, MediaError> {
            Ok(None)
        }

        async fn open(&self, _url: &Url) -> Result<UpstreamBody, MediaError> {
            Ok(UpstreamBody {
                content_type: Some("application/pdf".to_string()),
                body: stream::iter([Ok(Bytes::from_static(b"file-bytes"))]).boxed(),
            })
        }
    }

    fn options() -> RouterOptions {
        RouterOptions {
            public_dir: None,
            info_timeout: Duration::from_secs(5),
        }
    }

    fn test_app(extractor: Arc<FakeExtractor>, options: &RouterOptions) -> axum::Router {
        let state = AppState {
            media: MediaHandlers::new(extractor, Arc::new(FakeWeb)),
        };

        app(state, options)
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Response<Body>) {
        let res = app
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");

        (res.status(), res)
    }

    async fn body(res: Response<Body>) -> Bytes {
        to_bytes(res.into_body(), usize::MAX).await.expect("body")
    }

    async fn json_body(res: Response<Body>) -> Value {
        serde_json::from_slice(&body(res).await).expect("json body")
    }

    #[tokio::test]
    async fn ping_pongs_with_request_id() {
        let app = test_app(Arc::default(), &options());

        let (status, res) = get(app, "/ping").await;

        assert_eq!(status, StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
        assert_eq!(body(res).await, "pong");
    }

    #[tokio::test]
    async fn info_requires_url() {
        let extractor = Arc::new(FakeExtractor::default());
        let app = test_app(extractor.clone(), &options());

        let (status, res) = get(app, "/api/info").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await, json!({"error": "URL is required"}));
        assert_eq!(extractor.info_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn info_rejects_non_http_urls() {
        let app = test_app(Arc::default(), &options());

        let (status, _) = get(app, "/api/info?url=ftp%3A%2F%2Fexample.com%2Ffile").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn youtube_info_is_answered_without_extractor() {
        let extractor = Arc::new(FakeExtractor::default());
        let app = test_app(extractor.clone(), &options());

        let (status, res) = get(
            app,
            "/api/info?url=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3DdQw4w9WgXcQ%26t%3D1",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_body(res).await,
            json!({
                "title": "YouTube Video",
                "thumbnail": "https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg",
                "type": "youtube",
                "videoId": "dQw4w9WgXcQ"
            })
        );
        assert_eq!(extractor.info_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn generic_info_failure_is_bad_request() {
        let app = test_app(Arc::default(), &options());

        let (status, res) = get(app, "/api/info?url=https://example.com/page").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(res).await,
            json!({"error": "Failed to fetch media info: Unsupported URL"})
        );
    }

    #[tokio::test]
    async fn info_timeout_is_server_error() {
        let extractor = Arc::new(FakeExtractor {
            error: Some(timed_out),
            ..FakeExtractor::default()
        });
        let app = test_app(extractor, &options());

        let (status, _) = get(app, "/api/info?url=https://vimeo.com/1").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn stuck_info_lookup_answers_with_json() {
        let extractor = Arc::new(FakeExtractor {
            delay: Some(Duration::from_secs(5)),
            ..FakeExtractor::default()
        });
        let options = RouterOptions {
            info_timeout: Duration::from_millis(50),
            ..options()
        };
        let app = test_app(extractor, &options);

        let (status, res) = get(app, "/api/info?url=https://vimeo.com/1").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(res).await,
            json!({"error": "Media info lookup timed out"})
        );
    }

    #[tokio::test]
    async fn stream_is_inline_video() {
        let extractor = Arc::new(FakeExtractor::default());
        let app = test_app(extractor.clone(), &options());

        let (status, res) = get(app, "/api/stream?url=https://vimeo.com/1").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "video/mp4");
        assert!(!res.headers().contains_key(header::CONTENT_DISPOSITION));
        assert_eq!(body(res).await, "video-bytes");
        assert_eq!(*extractor.formats.lock().expect("lock"), vec!["best"]);
    }

    #[tokio::test]
    async fn busy_extractor_is_unavailable() {
        let extractor = Arc::new(FakeExtractor {
            error: Some(busy),
            ..FakeExtractor::default()
        });
        let app = test_app(extractor, &options());

        let (status, res) = get(app, "/api/stream?url=https://vimeo.com/1").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(json_body(res).await["error"].is_string());
    }

    #[tokio::test]
    async fn youtube_download_is_an_attachment() {
        let extractor = Arc::new(FakeExtractor {
            info: Some(json!({"title": "Über clip", "ext": "mp4"})),
            ..FakeExtractor::default()
        });
        let app = test_app(extractor.clone(), &options());

        let (status, res) = get(app, "/download?url=https://youtu.be/abc&quality=1080").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "video/mp4");
        assert_eq!(
            res.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"_ber clip.mp4\"; filename*=UTF-8''%C3%9Cber%20clip.mp4"
        );
        assert_eq!(body(res).await, "video-bytes");
        assert_eq!(
            *extractor.formats.lock().expect("lock"),
            vec!["bestvideo[height<=1080]+bestaudio/best[height<=1080]/best"]
        );
    }

    #[tokio::test]
    async fn youtube_download_failure_is_server_error() {
        let app = test_app(Arc::default(), &options());

        let (status, _) = get(app, "/download?url=https://youtu.be/abc").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn private_instagram_post_is_not_found() {
        let app = test_app(Arc::default(), &options());

        let (status, res) = get(app, "/download?url=https://www.instagram.com/p/abc/").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(res).await,
            json!({"error": "Media not found. It might be a private post."})
        );
    }

    #[tokio::test]
    async fn direct_download_keeps_upstream_type_and_name() {
        let app = test_app(Arc::default(), &options());

        let (status, res) = get(app, "/download?url=https://example.com/files/report.pdf").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            res.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"report.pdf\"; filename*=UTF-8''report.pdf"
        );
        assert_eq!(body(res).await, "file-bytes");
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let app = test_app(Arc::default(), &options());

        let (status, res) = get(app, "/nope").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(res).await,
            json!({"error": "Unknown route: [GET] /nope"})
        );
    }

    #[tokio::test]
    async fn public_dir_is_served() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("index.html"), "<h1>media</h1>").expect("write");
        let options = RouterOptions {
            public_dir: Some(dir.path().to_path_buf()),
            ..options()
        };

        let (status, res) = get(test_app(Arc::default(), &options), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body(res).await, "<h1>media</h1>");

        let (status, _) = get(test_app(Arc::default(), &options), "/missing.js").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, res) = get(test_app(Arc::default(), &options), "/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body(res).await, "pong");
    }
}
