use crate::models::{Booking, BookingEvent, BookingEventKind};
use crate::state::AppState;

pub fn publish_booking_event(state: &AppState, kind: BookingEventKind, booking: &Booking) {
    let event = BookingEvent {
        kind,
        booking: booking.clone(),
    };
    // No subscribers is the normal case when no admin console is open.
    if state.booking_events.send(event).is_err() {
        tracing::trace!(booking_code = %booking.booking_code, "no booking event subscribers");
    }
}
