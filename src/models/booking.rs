use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, FieldError};
use crate::models::validation::{optional_text, required_email, required_text};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub booking_code: String,
    pub trip_id: String,
    pub trip_name: String,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub message: Option<String>,
    pub travelers: i64,
    pub selected_date: Option<String>,
    pub selected_price: Option<f64>,
    pub total_amount: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Any status may move to any other; there are no guarded transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

/// Body of `POST /bookings`. Required fields are optional here so that a
/// missing field is reported alongside every other failing field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub booking_code: Option<String>,
    pub trip_id: Option<String>,
    pub trip_name: Option<String>,
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub travelers: Option<i64>,
    pub selected_date: Option<String>,
    pub selected_price: Option<f64>,
    pub total_amount: Option<f64>,
}

/// A create request that passed validation.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub booking_code: Option<String>,
    pub trip_id: String,
    pub trip_name: String,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub message: Option<String>,
    pub travelers: i64,
    pub selected_date: Option<String>,
    pub selected_price: Option<f64>,
    pub total_amount: f64,
}

impl CreateBookingRequest {
    pub fn validate(self) -> Result<NewBooking, AppError> {
        let mut errors = Vec::new();

        let trip_id = required_text("tripId", self.trip_id, &mut errors);
        let trip_name = required_text("tripName", self.trip_name, &mut errors);
        let customer_name = required_text("customerName", self.customer_name, &mut errors);
        let email = required_email("email", self.email, &mut errors);
        let phone = required_text("phone", self.phone, &mut errors);

        let travelers = match self.travelers {
            None => {
                errors.push(FieldError::new("travelers", "is required"));
                0
            }
            Some(n) if n < 1 => {
                errors.push(FieldError::new("travelers", "must be at least 1"));
                n
            }
            Some(n) => n,
        };

        if matches!(self.selected_price, Some(p) if p < 0.0) {
            errors.push(FieldError::new("selectedPrice", "cannot be negative"));
        }

        let total_amount = match self.total_amount {
            None => {
                errors.push(FieldError::new("totalAmount", "is required"));
                0.0
            }
            Some(amount) if amount < 0.0 => {
                errors.push(FieldError::new("totalAmount", "cannot be negative"));
                amount
            }
            Some(amount) => amount,
        };

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(NewBooking {
            booking_code: optional_text(self.booking_code),
            trip_id,
            trip_name,
            customer_name,
            email,
            phone,
            message: optional_text(self.message),
            travelers,
            selected_date: optional_text(self.selected_date),
            selected_price: self.selected_price,
            total_amount,
        })
    }
}

/// Body of `PATCH /bookings/{id}`. Code and creation time are not updatable
/// and are ignored if sent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookingUpdate {
    pub status: BookingStatus,
}

impl UpdateBookingRequest {
    pub fn validate(self) -> Result<BookingUpdate, AppError> {
        match self.status.as_deref().map(BookingStatus::parse) {
            Some(Some(status)) => Ok(BookingUpdate { status }),
            Some(None) => Err(AppError::Validation(vec![FieldError::new(
                "status",
                "must be one of Pending, Confirmed, Cancelled",
            )])),
            None => Err(AppError::Validation(vec![FieldError::new(
                "status",
                "is required",
            )])),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingStats {
    pub total_bookings: i64,
    pub pending_bookings: i64,
    pub confirmed_bookings: i64,
    pub cancelled_bookings: i64,
    /// Sum of `totalAmount` over bookings that are not cancelled.
    pub total_revenue: f64,
    pub confirmed_revenue: f64,
}
