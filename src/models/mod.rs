pub mod availability;
pub mod booking;
pub mod notification;

pub use availability::{AvailabilityPayload, AvailabilityResponse, BusinessHours, Slot, TimeInterval};
pub use booking::{
    BookingCategory, BookingOutcome, BookingPayload, BookingRequest, BookingResponse,
    BookingWarning,
};
pub use notification::LeadNotification;
