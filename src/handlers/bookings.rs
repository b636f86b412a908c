use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::StreamExt;

use crate::db::queries::{self, BookingFilter};
use crate::errors::{AppError, FieldError};
use crate::handlers::extract::{AppJson, AppQuery};
use crate::models::{
    AdminClaims, BookingEventKind, BookingStatus, CreateBookingRequest, ListQuery, PageRequest,
    UpdateBookingRequest,
};
use crate::services::auth::{authorize, credential_from_headers};
use crate::services::events::publish_booking_event;
use crate::state::AppState;

fn not_found() -> AppError {
    AppError::NotFound("No booking found with that ID".to_string())
}

/// `None` for an absent, empty or `all` filter.
pub(crate) fn status_filter<S>(
    raw: Option<&str>,
    parse: impl Fn(&str) -> Option<S>,
) -> Result<Option<S>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all")) {
        None => Ok(None),
        Some(s) => parse(s).map(Some).ok_or_else(|| {
            AppError::Validation(vec![FieldError::new("status", format!("unknown status '{s}'"))])
        }),
    }
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    AppJson(body): AppJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let new = body.validate()?;

    let booking = {
        let mut db = state.db()?;
        queries::insert_booking(&mut db, new)?
    };

    tracing::info!(
        id = %booking.id,
        booking_code = %booking.booking_code,
        trip_id = %booking.trip_id,
        travelers = booking.travelers,
        "booking created"
    );
    publish_booking_event(&state, BookingEventKind::Created, &booking);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": { "booking": booking } })),
    ))
}

// GET /api/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    _admin: AdminClaims,
    AppQuery(query): AppQuery<ListQuery>,
) -> Result<Json<Value>, AppError> {
    let filter = BookingFilter {
        status: status_filter(query.status.as_deref(), BookingStatus::parse)?,
        search: query.search,
        page: PageRequest::new(query.page, query.limit),
    };

    let page = {
        let db = state.db()?;
        queries::list_bookings(&db, &filter)?
    };
    let pagination = page.pagination();

    Ok(Json(json!({
        "status": "success",
        "results": page.items.len(),
        "data": {
            "bookings": page.items,
            "pagination": pagination,
        },
    })))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    _admin: AdminClaims,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let booking = {
        let db = state.db()?;
        queries::get_booking(&db, &id)?
    }
    .ok_or_else(not_found)?;

    Ok(Json(json!({ "status": "success", "data": { "booking": booking } })))
}

// PATCH /api/bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    admin: AdminClaims,
    Path(id): Path<String>,
    AppJson(body): AppJson<UpdateBookingRequest>,
) -> Result<Json<Value>, AppError> {
    let update = body.validate()?;

    let booking = {
        let db = state.db()?;
        queries::update_booking(&db, &id, &update)?
    }
    .ok_or_else(not_found)?;

    tracing::info!(
        id = %booking.id,
        booking_code = %booking.booking_code,
        status = booking.status.as_str(),
        admin = %admin.email,
        "booking status updated"
    );
    publish_booking_event(&state, BookingEventKind::Updated, &booking);

    Ok(Json(json!({ "status": "success", "data": { "booking": booking } })))
}

// DELETE /api/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    admin: AdminClaims,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {

    let booking = {
        let mut db = state.db()?;
        queries::delete_booking(&mut db, &id)?
    }
    .ok_or_else(not_found)?;

    tracing::info!(
        id = %booking.id,
        booking_code = %booking.booking_code,
        admin = %admin.email,
        "booking deleted"
    );
    publish_booking_event(&state, BookingEventKind::Deleted, &booking);

    Ok(Json(json!({ "status": "success", "data": null })))
}

// GET /api/bookings/admin/stats
pub async fn booking_stats(
    State(state): State<Arc<AppState>>,
    _admin: AdminClaims,
) -> Result<Json<Value>, AppError> {
    let stats = {
        let db = state.db()?;
        queries::booking_stats(&db)?
    };

    Ok(Json(json!({ "status": "success", "data": { "stats": stats } })))
}

/// A named SSE event carrying `payload` as JSON. Payloads that fail to
/// serialize are logged and dropped.
fn sse_frame<T: Serialize>(name: &str, payload: &T) -> Option<Event> {
    match serde_json::to_string(payload) {
        Ok(data) => Some(Event::default().event(name).data(data)),
        Err(e) => {
            tracing::error!(error = %e, event = name, "failed to serialize event payload");
            None
        }
    }
}

// GET /api/bookings/admin/events (SSE)
#[derive(Deserialize)]
pub struct EventsQuery {
    pub token: Option<String>,
}

pub async fn booking_events(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    // EventSource can't set headers, so the token may come in the query string.
    let credential = query.token.or_else(|| credential_from_headers(&headers));
    let admin = authorize(credential.as_deref(), &state.config.jwt_secret)?;
    tracing::debug!(admin = %admin.email, "booking event subscriber connected");

    let live_stream = BroadcastStream::new(state.booking_events.subscribe()).filter_map(
        |result| match result {
            Ok(event) => sse_frame("booking", &event).map(Ok::<_, Infallible>),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "booking event subscriber lagged");
                None
            }
        },
    );

    let keepalive_stream = IntervalStream::new(tokio::time::interval(Duration::from_secs(30)))
        .map(|_| Ok::<_, Infallible>(Event::default().comment("keepalive")));

    Ok(Sse::new(StreamExt::merge(live_stream, keepalive_stream)))
}
