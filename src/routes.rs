use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/admin/login", post(handlers::admin::login))
        .route("/api/admin/me", get(handlers::admin::me))
        .route(
            "/api/bookings",
            post(handlers::bookings::create_booking).get(handlers::bookings::list_bookings),
        )
        .route(
            "/api/bookings/admin/stats",
            get(handlers::bookings::booking_stats),
        )
        .route(
            "/api/bookings/admin/events",
            get(handlers::bookings::booking_events),
        )
        .route(
            "/api/bookings/:id",
            get(handlers::bookings::get_booking)
                .patch(handlers::bookings::update_booking)
                .delete(handlers::bookings::delete_booking),
        )
        .route(
            "/api/custom-trips",
            post(handlers::custom_trips::create_custom_trip)
                .get(handlers::custom_trips::list_custom_trips),
        )
        .route(
            "/api/custom-trips/admin/stats",
            get(handlers::custom_trips::custom_trip_stats),
        )
        .route(
            "/api/custom-trips/:id",
            get(handlers::custom_trips::get_custom_trip)
                .patch(handlers::custom_trips::update_custom_trip)
                .delete(handlers::custom_trips::delete_custom_trip),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match config
        .cors_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    {
        Some(origin) => layer.allow_origin(origin).allow_credentials(true),
        None => layer.allow_origin(Any),
    }
}
