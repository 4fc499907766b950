//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::FromRef,
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domains::member::MembershipRegistry;
use crate::server::routes::{
    confirm_handler, get_member_handler, health_handler, register_member_handler,
    resend_confirmation_handler,
};

/// Shared application state
#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: PgPool,
    pub registry: Arc<MembershipRegistry>,
}

/// Build the Axum application router
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/confirm", get(confirm_handler))
        .route("/api/members", post(register_member_handler))
        .route("/api/members/:student_id", get(get_member_handler))
        .route(
            "/api/members/:student_id/resend",
            post(resend_confirmation_handler),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    match cors_layer(allowed_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// CORS for the sign-up frontend; `None` when no origins are configured
fn cors_layer(allowed_origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([CONTENT_TYPE]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_disabled_without_origins() {
        assert!(cors_layer(&[]).is_none());
    }

    #[test]
    fn test_cors_skips_invalid_origins() {
        assert!(cors_layer(&["bad\norigin".to_string()]).is_none());
        assert!(cors_layer(&["https://club.example.org".to_string()]).is_some());
    }
}
