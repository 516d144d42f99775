use axum::{middleware, routing::get, Extension, Router};
use std::sync::Arc;

use crate::{controllers, gate, health_with_pool, AppState};

/// Router completo: `/` (GET e POST, protetti dal secret) e `/health`.
pub fn router(state: Arc<AppState>) -> Router {
    let sync = Router::new()
        .route("/", get(controllers::get_sync).post(controllers::post_sync))
        .route_layer(middleware::from_fn(gate::require_secret));

    Router::new()
        .route("/health", get(|Extension(state): Extension<Arc<AppState>>| async move {
            health_with_pool(&state.pool).await
        }))
        .merge(sync)
        .layer(Extension(state))
}
