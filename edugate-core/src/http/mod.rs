// edugate-core/src/http/mod.rs

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum_server::{Handle, Server};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use edugate_common::traits::AccountRepository;

use crate::auth::TokenCodec;
use crate::services::{AccessGate, CodePoolService, RedemptionService};
use crate::Error;

pub mod error;
pub mod extract;
pub mod i18n;
pub mod routes;

/// Everything a handler can reach.
#[derive(Clone)]
pub struct AppState {
    pub codes: Arc<CodePoolService>,
    pub redemptions: Arc<RedemptionService>,
    pub gate: Arc<AccessGate>,
    pub accounts: Arc<dyn AccountRepository + Send + Sync>,
    pub tokens: TokenCodec,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::student::routes())
        .nest("/admin", routes::admin::routes())
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Serves `app` on `addr` until `handle` is told to shut down.
pub async fn serve(addr: SocketAddr, app: Router, handle: Handle) -> Result<(), Error> {
    info!("HTTP server listening on http://{}", addr);
    Server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    info!("HTTP server shut down.");
    Ok(())
}
