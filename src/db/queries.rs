use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use rusqlite::types::{ToSql, Type};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    Booking, BookingStats, BookingStatus, BookingUpdate, CustomTrip, CustomTripStats,
    CustomTripStatus, CustomTripUpdate, NewBooking, NewCustomTrip, Page, PageRequest,
};
use crate::services::booking_code::allocate_booking_code;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Millisecond precision, matching what is stored.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Stored as naive UTC text.
fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_ts(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S"))
        .map(|ts| ts.and_utc())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// `%term%` with LIKE wildcards escaped; pair with `ESCAPE '\'`.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// WHERE clause and bound values for a status filter plus free-text search.
fn build_filter(
    status: Option<&'static str>,
    search: Option<&str>,
    search_columns: &[&str],
) -> (String, Vec<Box<dyn ToSql>>) {
    let mut clauses = vec![];
    let mut values: Vec<Box<dyn ToSql>> = vec![];

    if let Some(status) = status {
        values.push(Box::new(status));
        clauses.push(format!("status = ?{}", values.len()));
    }

    if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
        values.push(Box::new(like_pattern(term)));
        let idx = values.len();
        let any_column = search_columns
            .iter()
            .map(|col| format!("{col} LIKE ?{idx} ESCAPE '\\'"))
            .collect::<Vec<_>>()
            .join(" OR ");
        clauses.push(format!("({any_column})"));
    }

    let sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (sql, values)
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, booking_code, trip_id, trip_name, customer_name, email, phone, message, \
     travelers, selected_date, selected_price, total_amount, status, created_at, updated_at";

#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub search: Option<String>,
    pub page: PageRequest,
}

/// Inserts a validated booking, allocating its code when none was supplied.
pub fn insert_booking(conn: &mut Connection, new: NewBooking) -> Result<Booking, AppError> {
    let tx = conn.transaction()?;

    let booking_code = match new.booking_code {
        Some(code) => code,
        None => allocate_booking_code(&tx)?,
    };

    let created_at = now();
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        booking_code,
        trip_id: new.trip_id,
        trip_name: new.trip_name,
        customer_name: new.customer_name,
        email: new.email,
        phone: new.phone,
        message: new.message,
        travelers: new.travelers,
        selected_date: new.selected_date,
        selected_price: new.selected_price,
        total_amount: new.total_amount,
        status: BookingStatus::Pending,
        created_at,
        updated_at: created_at,
    };

    tx.execute(
        &format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        ),
        params![
            booking.id,
            booking.booking_code,
            booking.trip_id,
            booking.trip_name,
            booking.customer_name,
            booking.email,
            booking.phone,
            booking.message,
            booking.travelers,
            booking.selected_date,
            booking.selected_price,
            booking.total_amount,
            booking.status.as_str(),
            format_ts(&booking.created_at),
            format_ts(&booking.updated_at),
        ],
    )?;
    tx.commit()?;

    Ok(booking)
}

/// Newest first; ties on creation time fall back to insertion order.
pub fn list_bookings(conn: &Connection, filter: &BookingFilter) -> Result<Page<Booking>, AppError> {
    let (where_sql, mut values) = build_filter(
        filter.status.map(|s| s.as_str()),
        filter.search.as_deref(),
        &["customer_name", "email", "trip_name", "booking_code"],
    );

    let total: i64 = {
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        conn.query_row(
            &format!("SELECT COUNT(*) FROM bookings{where_sql}"),
            refs.as_slice(),
            |row| row.get(0),
        )?
    };

    values.push(Box::new(filter.page.limit));
    values.push(Box::new(filter.page.offset()));
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings{where_sql} ORDER BY created_at DESC, rowid DESC LIMIT ?{} OFFSET ?{}",
        values.len() - 1,
        values.len()
    );

    let mut stmt = conn.prepare(&sql)?;
    let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(refs.as_slice(), parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }

    Ok(Page {
        items: bookings,
        total,
        request: filter.page,
    })
}

pub fn get_booking(conn: &Connection, id: &str) -> Result<Option<Booking>, AppError> {
    let booking = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            parse_booking_row,
        )
        .optional()?;
    Ok(booking)
}

/// Applies an admin update. Never touches `booking_code` or `created_at`.
pub fn update_booking(
    conn: &Connection,
    id: &str,
    update: &BookingUpdate,
) -> Result<Option<Booking>, AppError> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![update.status.as_str(), format_ts(&now()), id],
    )?;
    if count == 0 {
        return Ok(None);
    }
    get_booking(conn, id)
}

/// Hard delete. Returns the removed record.
pub fn delete_booking(conn: &mut Connection, id: &str) -> Result<Option<Booking>, AppError> {
    let tx = conn.transaction()?;
    let Some(booking) = get_booking(&tx, id)? else {
        return Ok(None);
    };
    tx.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    tx.commit()?;
    Ok(Some(booking))
}

pub fn booking_stats(conn: &Connection) -> Result<BookingStats, AppError> {
    let mut stats = BookingStats::default();

    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*), COALESCE(SUM(total_amount), 0.0) FROM bookings GROUP BY status",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, f64>(2)?,
        ))
    })?;

    for row in rows {
        let (status, count, amount) = row?;
        stats.total_bookings += count;
        match BookingStatus::parse(&status) {
            Some(BookingStatus::Pending) => {
                stats.pending_bookings += count;
                stats.total_revenue += amount;
            }
            Some(BookingStatus::Confirmed) => {
                stats.confirmed_bookings += count;
                stats.total_revenue += amount;
                stats.confirmed_revenue += amount;
            }
            Some(BookingStatus::Cancelled) => stats.cancelled_bookings += count,
            None => tracing::warn!(status = %status, count, "bookings with unknown status"),
        }
    }

    Ok(stats)
}

fn parse_booking_row(row: &Row) -> rusqlite::Result<Booking> {
    let status_str: String = row.get(12)?;

    Ok(Booking {
        id: row.get(0)?,
        booking_code: row.get(1)?,
        trip_id: row.get(2)?,
        trip_name: row.get(3)?,
        customer_name: row.get(4)?,
        email: row.get(5)?,
        phone: row.get(6)?,
        message: row.get(7)?,
        travelers: row.get(8)?,
        selected_date: row.get(9)?,
        selected_price: row.get(10)?,
        total_amount: row.get(11)?,
        status: BookingStatus::parse(&status_str).unwrap_or(BookingStatus::Pending),
        created_at: parse_ts(row, 13)?,
        updated_at: parse_ts(row, 14)?,
    })
}

// ── Custom Trips ──

const CUSTOM_TRIP_COLUMNS: &str = "id, name, email, phone, destination, travel_date, duration, travelers, \
     budget, interests, message, status, admin_notes, quoted_price, created_at, updated_at";

#[derive(Debug, Default, Clone)]
pub struct CustomTripFilter {
    pub status: Option<CustomTripStatus>,
    pub search: Option<String>,
    pub page: PageRequest,
}

pub fn insert_custom_trip(conn: &Connection, new: NewCustomTrip) -> Result<CustomTrip, AppError> {
    let created_at = now();
    let trip = CustomTrip {
        id: Uuid::new_v4().to_string(),
        name: new.name,
        email: new.email,
        phone: new.phone,
        destination: new.destination,
        travel_date: new.travel_date,
        duration: new.duration,
        travelers: new.travelers,
        budget: new.budget,
        interests: new.interests,
        message: new.message,
        status: CustomTripStatus::Pending,
        admin_notes: None,
        quoted_price: None,
        created_at,
        updated_at: created_at,
    };

    let interests = serde_json::to_string(&trip.interests)
        .map_err(|e| AppError::Internal(format!("failed to encode interests: {e}")))?;

    conn.execute(
        &format!(
            "INSERT INTO custom_trips ({CUSTOM_TRIP_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
        ),
        params![
            trip.id,
            trip.name,
            trip.email,
            trip.phone,
            trip.destination,
            trip.travel_date,
            trip.duration,
            trip.travelers,
            trip.budget,
            interests,
            trip.message,
            trip.status.as_str(),
            trip.admin_notes,
            trip.quoted_price,
            format_ts(&trip.created_at),
            format_ts(&trip.updated_at),
        ],
    )?;

    Ok(trip)
}

pub fn list_custom_trips(
    conn: &Connection,
    filter: &CustomTripFilter,
) -> Result<Page<CustomTrip>, AppError> {
    let (where_sql, mut values) = build_filter(
        filter.status.map(|s| s.as_str()),
        filter.search.as_deref(),
        &["name", "email", "destination"],
    );

    let total: i64 = {
        let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        conn.query_row(
            &format!("SELECT COUNT(*) FROM custom_trips{where_sql}"),
            refs.as_slice(),
            |row| row.get(0),
        )?
    };

    values.push(Box::new(filter.page.limit));
    values.push(Box::new(filter.page.offset()));
    let sql = format!(
        "SELECT {CUSTOM_TRIP_COLUMNS} FROM custom_trips{where_sql} ORDER BY created_at DESC, rowid DESC LIMIT ?{} OFFSET ?{}",
        values.len() - 1,
        values.len()
    );

    let mut stmt = conn.prepare(&sql)?;
    let refs: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let rows = stmt.query_map(refs.as_slice(), parse_custom_trip_row)?;

    let mut trips = vec![];
    for row in rows {
        trips.push(row?);
    }

    Ok(Page {
        items: trips,
        total,
        request: filter.page,
    })
}

pub fn get_custom_trip(conn: &Connection, id: &str) -> Result<Option<CustomTrip>, AppError> {
    let trip = conn
        .query_row(
            &format!("SELECT {CUSTOM_TRIP_COLUMNS} FROM custom_trips WHERE id = ?1"),
            params![id],
            parse_custom_trip_row,
        )
        .optional()?;
    Ok(trip)
}

/// Fields left as `None` in the update keep their stored value.
pub fn update_custom_trip(
    conn: &Connection,
    id: &str,
    update: &CustomTripUpdate,
) -> Result<Option<CustomTrip>, AppError> {
    let count = conn.execute(
        "UPDATE custom_trips SET
           status = COALESCE(?1, status),
           admin_notes = COALESCE(?2, admin_notes),
           quoted_price = COALESCE(?3, quoted_price),
           updated_at = ?4
         WHERE id = ?5",
        params![
            update.status.map(|s| s.as_str()),
            update.admin_notes,
            update.quoted_price,
            format_ts(&now()),
            id,
        ],
    )?;
    if count == 0 {
        return Ok(None);
    }
    get_custom_trip(conn, id)
}

pub fn delete_custom_trip(conn: &Connection, id: &str) -> Result<bool, AppError> {
    let count = conn.execute("DELETE FROM custom_trips WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn custom_trip_stats(conn: &Connection) -> Result<CustomTripStats, AppError> {
    let mut stats = CustomTripStats::default();

    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM custom_trips GROUP BY status")?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

    for row in rows {
        let (status, count) = row?;
        stats.total += count;
        match CustomTripStatus::parse(&status) {
            Some(CustomTripStatus::Pending) => stats.pending += count,
            Some(CustomTripStatus::InProgress) => stats.in_progress += count,
            Some(CustomTripStatus::Quoted) => stats.quoted += count,
            Some(CustomTripStatus::Confirmed) => stats.confirmed += count,
            Some(CustomTripStatus::Cancelled) => stats.cancelled += count,
            None => tracing::warn!(status = %status, count, "custom trips with unknown status"),
        }
    }

    Ok(stats)
}

fn parse_custom_trip_row(row: &Row) -> rusqlite::Result<CustomTrip> {
    let interests_json: String = row.get(9)?;
    let status_str: String = row.get(11)?;

    Ok(CustomTrip {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        destination: row.get(4)?,
        travel_date: row.get(5)?,
        duration: row.get(6)?,
        travelers: row.get(7)?,
        budget: row.get(8)?,
        interests: serde_json::from_str(&interests_json).unwrap_or_default(),
        message: row.get(10)?,
        status: CustomTripStatus::parse(&status_str).unwrap_or(CustomTripStatus::Pending),
        admin_notes: row.get(12)?,
        quoted_price: row.get(13)?,
        created_at: parse_ts(row, 14)?,
        updated_at: parse_ts(row, 15)?,
    })
}
