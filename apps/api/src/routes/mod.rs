pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::forecast::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/forecasts", post(handlers::handle_predict))
        .route(
            "/api/v1/forecasts/options",
            get(handlers::handle_forecast_options),
        )
        .with_state(state)
}
