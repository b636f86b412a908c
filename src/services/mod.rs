pub mod auth;
pub mod booking_code;
pub mod events;
