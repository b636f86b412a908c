pub mod admin;
pub mod booking;
pub mod custom_trip;
pub mod event;
pub mod pagination;
pub mod validation;

pub use admin::{AdminClaims, AdminProfile, LoginRequest};
pub use booking::{
    Booking, BookingStats, BookingStatus, BookingUpdate, CreateBookingRequest, NewBooking,
    UpdateBookingRequest,
};
pub use custom_trip::{
    CreateCustomTripRequest, CustomTrip, CustomTripStats, CustomTripStatus, CustomTripUpdate,
    NewCustomTrip, UpdateCustomTripRequest,
};
pub use event::{BookingEvent, BookingEventKind};
pub use pagination::{ListQuery, Page, PageRequest, Pagination};
