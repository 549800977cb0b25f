use std::{io, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use app_config::Config;
use app_media::{extractor::YtDlp, web::WebClient, MediaHandlers};
use axum::{
    http::{header, HeaderValue, Request},
    response::Response,
};
use listenfd::ListenFd;
use once_cell::sync::Lazy;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{self, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{debug, field, info, trace, warn, Span};

mod app_response;
mod routes;

/// Extra time the info route gets on top of the extractor's own timeout
const INFO_ROUTE_GRACE: Duration = Duration::from_secs(5);

pub async fn run(config: &Config) -> anyhow::Result<()> {
    info!("Starting server...");
    let state = AppState::from_config(config)?;
    trace!(state = ?state, "Created app state");

    let router = app(state, &RouterOptions::from(config));

    trace!(?router, "Finished building app router");

    let mut listenfd = ListenFd::from_env();
    let listener = match listenfd.take_tcp_listener(0)? {
        Some(listener) => {
            listener.set_nonblocking(true)?;
            TcpListener::from_std(listener)?
        }
        None => {
            let server = config.server();

            bind(&server.host, server.port, server.port_attempts).await?
        }
    };

    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Bind `port`, moving on to the following ports while they are taken
async fn bind(host: &str, port: u16, attempts: u16) -> io::Result<TcpListener> {
    let mut last_err = None;

    for offset in 0..attempts.max(1) {
        let Some(port) = port.checked_add(offset) else {
            break;
        };

        match TcpListener::bind((host, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                warn!(port, "Port is already in use, trying the next one");
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrInUse, "No free port left to try")
    }))
}

static CACHE_CONTROL: Lazy<HeaderValue> =
    Lazy::new(|| HeaderValue::from_static("private, max-age=0"));

#[derive(Clone)]
struct MakeRequestUlid;
impl MakeRequestId for MakeRequestUlid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let mut id = ulid::Ulid::new().to_string();
        id.make_ascii_lowercase();
        let val = HeaderValue::from_str(&id).ok()?;

        Some(RequestId::new(val))
    }
}

type AppRouter = axum::Router<AppState>;

#[derive(Debug, Clone)]
struct AppState {
    pub media: MediaHandlers,
}

impl AppState {
    fn from_config(config: &Config) -> anyhow::Result<Self> {
        let extractor = YtDlp::from_config(config);
        info!(path = ?extractor.path(), "Using yt-dlp");

        let web = WebClient::from_config(config)?;

        Ok(Self {
            media: MediaHandlers::new(Arc::new(extractor), Arc::new(web)),
        })
    }
}

#[derive(Debug, Clone)]
struct RouterOptions {
    pub public_dir: Option<PathBuf>,
    pub info_timeout: Duration,
}

impl From<&Config> for RouterOptions {
    fn from(config: &Config) -> Self {
        Self {
            public_dir: config.server().public_dir.clone(),
            info_timeout: config.extractor().info_timeout() + INFO_ROUTE_GRACE,
        }
    }
}

fn app(state: AppState, options: &RouterOptions) -> axum::Router {
    add_middlewares(routes::router(options)).with_state(state)
}

fn add_middlewares<T>(router: axum::Router<T>) -> axum::Router<T>
where
    T: std::clone::Clone + Send + Sync + 'static,
{
    router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUlid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &Request<_>| {
                            let m = request.method();
                            let p = request.uri().path();
                            let id = request
                                .extensions()
                                .get::<RequestId>()
                                .and_then(|id| id.header_value().to_str().ok())
                                .unwrap_or("-");
                            let dur = field::Empty;

                            tracing::info_span!("", %id, %m, ?p, dur)
                        })
                        .on_request(|request: &Request<_>, _span: &Span| {
                            let headers = request.headers();
                            info!(
                                target: "request",
                                "START \"{method} {uri} {http_type:?}\" {user_agent:?} {ip:?}",
                                http_type = request.version(),
                                method = request.method(),
                                uri = request.uri(),
                                user_agent = headers
                                    .get(header::USER_AGENT)
                                    .map_or("-", |x| x.to_str().unwrap_or("-")),
                                ip = headers
                                    .get("x-forwarded-for")
                                    .map_or("-", |x| x.to_str().unwrap_or("-")),
                            );
                        })
                        .on_response(|response: &Response<_>, latency, span: &Span| {
                            span.record("dur", field::debug(latency));
                            info!(
                                target: "request",
                                "END {status}",
                                status = response.status().as_u16(),
                            );
                        })
                        .on_body_chunk(())
                        .on_eos(|_trailers: Option<&_>, stream_duration, span: &Span| {
                            span.record("dur", field::debug(stream_duration));
                            debug!(target: "request", "Body finished");
                        })
                        .on_failure(|error, latency, span: &Span| {
                            span.record("dur", field::debug(latency));
                            debug!(
                                target: "request",
                                err = ?error,
                                "ERR: something went wrong",
                            );
                        }),
                )
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::CACHE_CONTROL,
                    |_response: &Response<_>| Some(CACHE_CONTROL.clone()),
                )),
        )
        .layer(
            CorsLayer::new()
                .allow_methods(cors::AllowMethods::mirror_request())
                .allow_origin(cors::AllowOrigin::mirror_request()),
        )
}
