//! HTTP transport binding.
//!
//! # Responsibilities
//! - Create the Axum Router whose fallback feeds every request to the Engine
//! - Wire up middleware layers (timeout, request ID, tracing)
//! - Enforce header and body size limits before dispatch
//! - Run the synchronous dispatch on the blocking pool
//! - Drain outstanding handler work on shutdown, bounded by a deadline
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → axum (SetRequestId, TraceLayer, PropagateRequestId, Timeout)
//!     → dispatch(): limits, buffer body, build Request
//!     → spawn_blocking(Engine::serve)
//!     → Response → axum response
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{LimitsConfig, ServerConfig};
use crate::dispatch::Engine;
use crate::error::ServerError;
use crate::http::request::Request;
use crate::lifecycle::{InFlight, ShutdownSignal};

/// State injected into the fallback handler.
#[derive(Clone)]
struct AppState {
    engine: Arc<Engine>,
    limits: LimitsConfig,
}

/// HTTP server driving one [`Engine`].
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    in_flight: InFlight,
}

impl HttpServer {
    /// Create a new HTTP server around a fully configured engine.
    pub fn new(engine: Arc<Engine>, config: ServerConfig) -> Self {
        let in_flight = engine.in_flight();
        let state = AppState {
            engine,
            limits: config.limits.clone(),
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            in_flight,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new().fallback(dispatch).with_state(state).layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// Bind a listener on `address`.
    pub async fn bind(address: &str) -> Result<TcpListener, ServerError> {
        TcpListener::bind(address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.to_string(),
                source,
            })
    }

    /// Serve on `listener` until `shutdown` fires, then drain.
    ///
    /// After the signal, open connections finish their current request and
    /// work registered through `Context::track_work` is awaited. Both are
    /// bounded by `timeouts.shutdown_secs`; whatever is still running then
    /// is abandoned.
    pub async fn run(self, listener: TcpListener, mut shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let mut server_signal = shutdown.clone();
        let serve = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { server_signal.recv().await });
        let mut server = tokio::spawn(async move { serve.await });

        tokio::select! {
            joined = &mut server => {
                // Stopped without a shutdown request.
                return match joined {
                    Ok(result) => result.map_err(ServerError::from),
                    Err(e) => Err(ServerError::Io(std::io::Error::other(e))),
                };
            }
            _ = shutdown.recv() => {}
        }

        let deadline = Duration::from_secs(self.config.timeouts.shutdown_secs);
        tracing::info!(
            deadline_secs = deadline.as_secs(),
            outstanding = self.in_flight.count(),
            "Draining"
        );

        let in_flight = self.in_flight.clone();
        let drained = tokio::time::timeout(deadline, async {
            let served = (&mut server).await;
            in_flight.wait_idle().await;
            served
        })
        .await;

        match drained {
            Ok(Ok(result)) => result?,
            Ok(Err(e)) => return Err(ServerError::Io(std::io::Error::other(e))),
            Err(_) => {
                tracing::warn!(
                    outstanding = self.in_flight.count(),
                    "Drain deadline passed, abandoning remaining work"
                );
                server.abort();
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Fallback handler: every request goes through the Engine.
async fn dispatch(State(state): State<AppState>, request: axum::extract::Request) -> axum::response::Response {
    let (parts, body) = request.into_parts();

    let header_bytes = header_size(&parts.headers);
    if header_bytes > state.limits.max_header_bytes {
        tracing::warn!(
            path = %parts.uri.path(),
            size = header_bytes,
            limit = state.limits.max_header_bytes,
            "Request headers too large"
        );
        return (StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE, "request headers too large").into_response();
    }

    let body = match axum::body::to_bytes(body, state.limits.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                path = %parts.uri.path(),
                limit = state.limits.max_body_bytes,
                error = %e,
                "Failed to buffer request body"
            );
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };

    let request = Request::from_parts(parts.method, parts.uri, parts.headers, body);
    let engine = Arc::clone(&state.engine);
    match tokio::task::spawn_blocking(move || engine.serve(request)).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Dispatch worker failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn header_size(headers: &HeaderMap) -> usize {
    headers
        .iter()
        .map(|(name, value)| name.as_str().len() + value.len())
        .sum()
}
