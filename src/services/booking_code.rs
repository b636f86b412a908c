//! Human-readable booking codes: `BK` followed by a zero-padded ordinal.

use rusqlite::{params, Connection};

use crate::errors::AppError;

pub const BOOKING_CODE_PREFIX: &str = "BK";
pub const MAX_BOOKING_ORDINAL: i64 = 999_999;
const BOOKING_COUNTER: &str = "booking";

pub fn format_booking_code(ordinal: i64) -> String {
    format!("{BOOKING_CODE_PREFIX}{ordinal:06}")
}

/// Takes the next booking code.
///
/// The counter row is created on first use from the current number of
/// bookings plus one, so a fresh store starts at `BK000001` and a store that
/// predates the counter continues from its record count. After that the value
/// only ever increments in a single statement, so two creates can never be
/// handed the same code, and deleting a booking never causes a code to be
/// reissued. Ordinals whose code is already held by a booking (one created
/// with a caller-supplied code) are stepped over.
///
/// Call this inside the transaction that inserts the booking so a rejected
/// insert gives the number back.
pub fn allocate_booking_code(conn: &Connection) -> Result<String, AppError> {
    loop {
        let ordinal: i64 = conn.query_row(
            "INSERT INTO counters (name, value)
             VALUES (?1, (SELECT COUNT(*) FROM bookings) + 1)
             ON CONFLICT(name) DO UPDATE SET value = value + 1
             RETURNING value",
            params![BOOKING_COUNTER],
            |row| row.get(0),
        )?;

        if ordinal > MAX_BOOKING_ORDINAL {
            tracing::error!(ordinal, "booking code range exhausted");
            return Err(AppError::Internal("booking code range exhausted".to_string()));
        }

        let code = format_booking_code(ordinal);
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM bookings WHERE booking_code = ?1)",
            params![code],
            |row| row.get(0),
        )?;
        if !taken {
            return Ok(code);
        }
    }
}
