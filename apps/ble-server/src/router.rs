#![cfg_attr(feature = "strict", deny(warnings))]

use std::any::Any;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use ble_core::BleCore;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{Span, info, info_span};

use crate::ServerConfig;
use crate::dto::response::{ErrorResponse, panic_message};
use crate::endpoint::tool;

pub(crate) struct InternalAppState {
    pub core: BleCore,
    pub config: Arc<ServerConfig>,
}

pub(crate) type AppState = Arc<InternalAppState>;

pub async fn start_server(listener: TcpListener, core: BleCore, config: ServerConfig) {
    listener
        .set_nonblocking(true)
        .expect("Failed to set listener non-blocking");

    let state: AppState = Arc::new(InternalAppState {
        core,
        config: Arc::new(config),
    });

    let addr = listener.local_addr().expect("Invalid TCP listener");
    info!("Starting server at http://{addr}");

    axum::serve(
        tokio::net::TcpListener::from_std(listener)
            .expect("failed to convert to tokio TcpListener"),
        router(state).into_make_service(),
    )
    .await
    .expect("Failed to start axum server");
}

fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/tool/v1", get(tool::controller::get_tools))
        .route("/api/tool/v1/{name}", post(tool::controller::call_tool));

    let technical_endpoints = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(api)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    info_span!(
                        "http_request",
                        method = %request.method(),
                        path = request.uri().path(),
                        service = "ble-server",
                    )
                })
                .on_request(|request: &Request<_>, _span: &Span| {
                    tracing::debug!(
                        "SERVICE CALL START {} {}",
                        request.method(),
                        request.uri().path()
                    )
                })
                .on_failure(|_, _, _: &_| {}) // override default on_failure handler
                .on_response(|response: &Response<_>, _: Duration, _span: &Span| {
                    tracing::debug!("SERVICE CALL END {}", response.status())
                }),
        )
        .merge(technical_endpoints)
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let message = panic_message(err);

    tracing::error!("PANIC occurred in request: {message}");

    ErrorResponse::for_panic(message).into_response()
}
