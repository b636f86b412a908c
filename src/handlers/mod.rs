pub mod admin;
pub mod bookings;
pub mod custom_trips;
pub mod extract;
pub mod health;
