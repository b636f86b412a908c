use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::db::queries::{self, CustomTripFilter};
use crate::errors::AppError;
use crate::handlers::bookings::status_filter;
use crate::handlers::extract::{AppJson, AppQuery};
use crate::models::{
    AdminClaims, CreateCustomTripRequest, CustomTripStatus, ListQuery, PageRequest,
    UpdateCustomTripRequest,
};
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::NotFound("No custom trip request found with that ID".to_string())
}

// POST /api/custom-trips
pub async fn create_custom_trip(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<CreateCustomTripRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let new = body.validate()?;

    let trip = {
        let db = state.db()?;
        queries::insert_custom_trip(&db, new)?
    };

    tracing::info!(id = %trip.id, destination = %trip.destination, "custom trip request created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": { "customTrip": trip } })),
    ))
}

// GET /api/custom-trips
pub async fn list_custom_trips(
    State(state): State<Arc<AppState>>,
    _admin: AdminClaims,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<Value>, AppError> {
    let filter = CustomTripFilter {
        status: status_filter(query.status.as_deref(), CustomTripStatus::parse)?,
        search: query.search,
        page: PageRequest::new(query.page, query.limit),
    };

    let page = {
        let db = state.db()?;
        queries::list_custom_trips(&db, &filter)?
    };
    let pagination = page.pagination();

    Ok(Json(json!({
        "status": "success",
        "results": page.items.len(),
        "data": {
            "customTrips": page.items,
            "pagination": pagination,
        },
    })))
}

// GET /api/custom-trips/:id
pub async fn get_custom_trip(
    State(state): State<Arc<AppState>>,
    _admin: AdminClaims,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let trip = {
        let db = state.db()?;
        queries::get_custom_trip(&db, &id)?
    }
    .ok_or_else(not_found)?;

    Ok(Json(json!({ "status": "success", "data": { "customTrip": trip } })))
}

// PATCH /api/custom-trips/:id
pub async fn update_custom_trip(
    State(state): State<Arc<AppState>>,
    admin: AdminClaims,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateCustomTripRequest>,
) -> Result<Json<Value>, AppError> {
    let update = body.validate()?;

    let trip = {
        let db = state.db()?;
        queries::update_custom_trip(&db, &id, &update)?
    }
    .ok_or_else(not_found)?;

    tracing::info!(
        id = %trip.id,
        status = trip.status.as_str(),
        admin = %admin.email,
        "custom trip request updated"
    );

    Ok(Json(json!({ "status": "success", "data": { "customTrip": trip } })))
}

// DELETE /api/custom-trips/:id
pub async fn delete_custom_trip(
    State(state): State<Arc<AppState>>,
    admin: AdminClaims,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {

    let deleted = {
        let db = state.db()?;
        queries::delete_custom_trip(&db, &id)?
    };
    if !deleted {
        return Err(not_found());
    }

    tracing::info!(id = %id, admin = %admin.email, "custom trip request deleted");

    Ok(Json(json!({ "status": "success", "data": null })))
}

// GET /api/custom-trips/admin/stats
pub async fn custom_trip_stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminClaims,
) -> Result<Json<Value>, AppError> {
    let stats = {
        let db = state.db()?;
        queries::custom_trip_stats(&db)?
    };

    Ok(Json(json!({ "status": "success", "data": { "stats": stats } })))
}
