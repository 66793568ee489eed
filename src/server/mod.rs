//! HTTP endpoint exposing the registry for Prometheus scrapes.
//!
//! Serves the text exposition on the telemetry path and, when that path is
//! not `/`, a small landing page on `/` linking to it. A [`WebConfig`] adds
//! TLS and basic authentication in front of every route.

mod web_config;

pub use web_config::{BasicAuth, TlsServerConfig, WebConfig};

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use prometheus::Registry;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, error, info};

use crate::error::{ServerError, WebConfigError};
use crate::metrics::{content_type, export_metrics};

/// Default listen address.
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:9162";

/// Default path of the scrape endpoint.
pub const DEFAULT_TELEMETRY_PATH: &str = "/metrics";

static NOTFOUND: &[u8] = b"Not found";
static METHOD_NOT_ALLOWED: &[u8] = b"Method not allowed";
static UNAUTHORIZED: &[u8] = b"Unauthorized";

struct State {
    registry: Registry,
    telemetry_path: String,
    landing_page: String,
    auth: Option<BasicAuth>,
}

/// Scrape endpoint bound to a TCP listener.
pub struct MetricsServer {
    listener: TcpListener,
    state: State,
    tls: Option<TlsAcceptor>,
}

impl MetricsServer {
    /// Bind the listener. The registry is gathered on every scrape.
    pub async fn bind(
        addr: &str,
        registry: Registry,
        telemetry_path: &str,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        let telemetry_path = normalize_path(telemetry_path);
        let landing_page = landing_page(&telemetry_path);

        Ok(Self {
            listener,
            state: State {
                registry,
                telemetry_path,
                landing_page,
                auth: None,
            },
            tls: None,
        })
    }

    /// Enable the TLS and basic auth settings of a web configuration file.
    pub fn with_web_config(mut self, config: &WebConfig) -> Result<Self, WebConfigError> {
        self.tls = config.tls_acceptor()?;
        self.state.auth = config.basic_auth();
        Ok(self)
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` fires or its sender is dropped.
    pub async fn serve(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        info!(
            address = %self.local_addr()?,
            telemetry_path = %self.state.telemetry_path,
            tls = self.tls.is_some(),
            basic_auth = self.state.auth.is_some(),
            "Listening for scrapes"
        );

        let Self {
            listener,
            state,
            tls,
        } = self;
        let state = Arc::new(state);

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    let (stream, peer) = match accept_result {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };
                    let state = Arc::clone(&state);
                    let tls = tls.clone();

                    tokio::task::spawn(async move {
                        match tls {
                            Some(acceptor) => match acceptor.accept(stream).await {
                                Ok(stream) => serve_connection(stream, state, peer).await,
                                Err(e) => debug!(peer = %peer, error = %e, "TLS handshake failed"),
                            },
                            None => serve_connection(stream, state, peer).await,
                        }
                    });
                }
                _ = shutdown.recv() => {
                    info!("Scrape endpoint shutting down");
                    return Ok(());
                }
            }
        }
    }
}

async fn serve_connection<S>(stream: S, state: Arc<State>, peer: SocketAddr)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let service = service_fn(move |req| {
        let state = Arc::clone(&state);
        async move { handle_request(req, &state) }
    });
    if let Err(err) = http1::Builder::new()
        .serve_connection(TokioIo::new(stream), service)
        .await
    {
        debug!(peer = %peer, error = %err, "Error serving connection");
    }
}

fn handle_request<B>(
    req: Request<B>,
    state: &State,
) -> Result<Response<Full<Bytes>>, Infallible> {
    if let Some(auth) = &state.auth {
        if !auth.authorize(req.headers().get(AUTHORIZATION)) {
            let mut response = plain(StatusCode::UNAUTHORIZED, UNAUTHORIZED);
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Basic"));
            return Ok(response);
        }
    }

    let path = req.uri().path();
    let is_metrics = path == state.telemetry_path;
    let is_landing = path == "/" && state.telemetry_path != "/";

    if !is_metrics && !is_landing {
        debug!(method = %req.method(), path = path, "Request to unknown endpoint");
        return Ok(plain(StatusCode::NOT_FOUND, NOTFOUND));
    }

    if req.method() != Method::GET && req.method() != Method::HEAD {
        return Ok(plain(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED));
    }

    if is_landing {
        return Ok(respond(
            StatusCode::OK,
            "text/html; charset=utf-8",
            Bytes::from(state.landing_page.clone()),
        ));
    }

    match export_metrics(&state.registry) {
        Ok(body) => Ok(respond(StatusCode::OK, &content_type(), Bytes::from(body))),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            Ok(plain(
                StatusCode::INTERNAL_SERVER_ERROR,
                b"Internal Server Error",
            ))
        }
    }
}

fn plain(status: StatusCode, body: &'static [u8]) -> Response<Full<Bytes>> {
    respond(status, "text/plain; charset=utf-8", Bytes::from_static(body))
}

fn respond(status: StatusCode, content_type: &str, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    if let Ok(value) = content_type.parse() {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}

fn normalize_path(path: &str) -> String {
    let path = path.trim();
    if path.is_empty() {
        "/".to_string()
    } else if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

fn landing_page(telemetry_path: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>OVH Exporter</title></head>
<body>
<h1>OVH Exporter</h1>
<p>Prometheus OVH API Exporter</p>
<p>Version: {version}</p>
<ul><li><a href="{path}">Metrics</a></li></ul>
</body>
</html>
"#,
        version = env!("CARGO_PKG_VERSION"),
        path = telemetry_path,
    )
}
