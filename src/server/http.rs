//! HTTP server implementation
//!
//! hyper http1 with TokioIo, one task per connection. Every request goes
//! through the gate before the router sees it.

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::config::{Args, ExecutionMode, GateConfig};
use crate::gate::Gate;
use crate::routes;
use crate::server::response::BoxBody;
use crate::session::JwtSessionRefresher;
use crate::types::GateError;

/// Shared application state, read-only after startup
pub struct AppState {
    pub args: Args,
    pub gate: Gate,
}

impl AppState {
    /// Build the gate and its collaborators from parsed arguments
    pub fn new(args: Args) -> Result<Self, GateError> {
        let config = Arc::new(GateConfig::from_args(&args));
        let jwt = args.jwt_validator()?;
        let refresher = JwtSessionRefresher::new(
            jwt.clone(),
            config.session_cookie.clone(),
            args.session_refresh_window_secs,
            config.mode,
        );

        Ok(Self {
            gate: Gate::new(config, jwt, Arc::new(refresher)),
            args,
        })
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), GateError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("recruit-gate listening on {}", state.args.listen);

    let config = state.gate.config();
    match config.mode {
        ExecutionMode::Development => {
            warn!("Development mode enabled - API origin restricted to localhost")
        }
        ExecutionMode::Production if config.site_origin.is_none() => {
            warn!("SITE_URL not set - every API request will be forbidden")
        }
        ExecutionMode::Production => {}
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

async fn handle_request<B>(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<B>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let span = tracing::info_span!("request", id = %Uuid::new_v4(), peer = %addr);

    async move {
        info!("{} {}", req.method(), req.uri().path());
        let response = handle(&state, req).await;
        info!(status = response.status().as_u16(), "done");
        Ok(response)
    }
    .instrument(span)
    .await
}

/// Gate the request, then route it
pub async fn handle<B>(state: &AppState, req: Request<B>) -> Response<BoxBody> {
    let gate = &state.gate;
    gate.intercept(req, |req| async move { routes::dispatch(gate, &req) })
        .await
}
