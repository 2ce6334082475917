use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Onboarding calibration
        .route("/calibration/deck", get(handlers::get_calibration_deck))
        .nest("/investors/:investor_id", investor_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Routes scoped to one investor session
fn investor_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/preferences",
            get(handlers::get_preferences).put(handlers::put_preferences),
        )
        .route(
            "/calibration",
            get(handlers::get_calibration)
                .post(handlers::post_calibration)
                .delete(handlers::delete_calibration),
        )
        .route("/recommendations", post(handlers::recommend))
        .route("/score", post(handlers::score))
        .route(
            "/interactions",
            get(handlers::get_interactions).post(handlers::post_interaction),
        )
}
