use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, FieldError};
use crate::models::validation::{optional_text, required_email, required_text};

/// An open-ended "design my trip" inquiry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomTrip {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub destination: String,
    pub travel_date: Option<String>,
    pub duration: Option<String>,
    pub travelers: i64,
    pub budget: Option<String>,
    pub interests: Vec<String>,
    pub message: Option<String>,
    pub status: CustomTripStatus,
    pub admin_notes: Option<String>,
    pub quoted_price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum CustomTripStatus {
    Pending,
    InProgress,
    Quoted,
    Confirmed,
    Cancelled,
}

impl CustomTripStatus {
    pub const ALL: [CustomTripStatus; 5] = [
        CustomTripStatus::Pending,
        CustomTripStatus::InProgress,
        CustomTripStatus::Quoted,
        CustomTripStatus::Confirmed,
        CustomTripStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CustomTripStatus::Pending => "pending",
            CustomTripStatus::InProgress => "in-progress",
            CustomTripStatus::Quoted => "quoted",
            CustomTripStatus::Confirmed => "confirmed",
            CustomTripStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomTripRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub destination: Option<String>,
    pub travel_date: Option<String>,
    pub duration: Option<String>,
    pub travelers: Option<i64>,
    pub budget: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCustomTrip {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub destination: String,
    pub travel_date: Option<String>,
    pub duration: Option<String>,
    pub travelers: i64,
    pub budget: Option<String>,
    pub interests: Vec<String>,
    pub message: Option<String>,
}

impl CreateCustomTripRequest {
    pub fn validate(self) -> Result<NewCustomTrip, AppError> {
        let mut errors = Vec::new();

        let name = required_text("name", self.name, &mut errors);
        let email = required_email("email", self.email, &mut errors);
        let phone = required_text("phone", self.phone, &mut errors);
        let destination = required_text("destination", self.destination, &mut errors);

        let travelers = self.travelers.unwrap_or(1);
        if travelers < 1 {
            errors.push(FieldError::new("travelers", "must be at least 1"));
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(NewCustomTrip {
            name,
            email,
            phone,
            destination,
            travel_date: optional_text(self.travel_date),
            duration: optional_text(self.duration),
            travelers,
            budget: optional_text(self.budget),
            interests: self
                .interests
                .into_iter()
                .filter_map(|i| optional_text(Some(i)))
                .collect(),
            message: optional_text(self.message),
        })
    }
}

/// Admin-only fields. At least one must be present.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomTripRequest {
    pub status: Option<String>,
    pub admin_notes: Option<String>,
    pub quoted_price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomTripUpdate {
    pub status: Option<CustomTripStatus>,
    pub admin_notes: Option<String>,
    pub quoted_price: Option<f64>,
}

impl UpdateCustomTripRequest {
    pub fn validate(self) -> Result<CustomTripUpdate, AppError> {
        let mut errors = Vec::new();

        let status = match self.status.as_deref() {
            Some(raw) => {
                let parsed = CustomTripStatus::parse(raw);
                if parsed.is_none() {
                    errors.push(FieldError::new(
                        "status",
                        "must be one of pending, in-progress, quoted, confirmed, cancelled",
                    ));
                }
                parsed
            }
            None => None,
        };

        if matches!(self.quoted_price, Some(p) if p < 0.0) {
            errors.push(FieldError::new("quotedPrice", "cannot be negative"));
        }

        if self.status.is_none() && self.admin_notes.is_none() && self.quoted_price.is_none() {
            errors.push(FieldError::new(
                "status",
                "one of status, adminNotes, quotedPrice is required",
            ));
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(CustomTripUpdate {
            status,
            admin_notes: self.admin_notes.map(|n| n.trim().to_string()),
            quoted_price: self.quoted_price,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTripStats {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub quoted: i64,
    pub confirmed: i64,
    pub cancelled: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn travelers_default_to_one() {
        let trip = CreateCustomTripRequest {
            name: Some("Ravi".into()),
            email: Some("ravi@example.com".into()),
            phone: Some("555".into()),
            destination: Some("Ladakh".into()),
            interests: vec!["trekking".into(), " ".into()],
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(trip.travelers, 1);
        assert_eq!(trip.interests, vec!["trekking".to_string()]);
    }

    #[test]
    fn missing_contact_fields_rejected() {
        let err = CreateCustomTripRequest::default().validate().unwrap_err();
        match err {
            AppError::Validation(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["name", "email", "phone", "destination"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn status_uses_kebab_case() {
        assert_eq!(
            serde_json::to_value(CustomTripStatus::InProgress).unwrap(),
            "in-progress"
        );
        assert_eq!(CustomTripStatus::parse("In-Progress"), Some(CustomTripStatus::InProgress));
        assert_eq!(CustomTripStatus::parse("done"), None);
    }

    #[test]
    fn update_needs_at_least_one_field() {
        assert!(UpdateCustomTripRequest::default().validate().is_err());

        let update = UpdateCustomTripRequest {
            quoted_price: Some(120000.0),
            admin_notes: Some(" call back Monday ".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(update.status, None);
        assert_eq!(update.admin_notes.as_deref(), Some("call back Monday"));

        let negative = UpdateCustomTripRequest {
            quoted_price: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(negative.validate(), Err(AppError::Validation(_))));
    }
}
