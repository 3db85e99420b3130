pub mod availability;
pub mod calendar;
pub mod notification;
pub mod rate_limit;
pub mod reservation;
pub mod scheduling;
pub mod voice;
