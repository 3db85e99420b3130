//! Four-step booking flow: contact details, date, time, confirmation.
//!
//! [`BookingWizard`] is a plain state machine. Network calls happen outside
//! it: starting a fetch hands out a ticket stamped with the wizard's
//! generation, and the response is applied with that ticket. Opening,
//! closing or stepping back bumps the generation, so a response that
//! arrives for an abandoned session is dropped instead of leaking into the
//! new one. [`WizardSession`] drives the async side.

pub mod api;
pub mod calendar;
pub mod session;

use chrono::NaiveDate;

use crate::models::{BookingCategory, BookingPayload, BookingResponse, BusinessHours};
use crate::services::scheduling::default_slot_labels;

pub use api::{ApiError, BookingApi, HttpBookingApi};
pub use calendar::{is_bookable, MonthGrid};
pub use session::WizardSession;

pub const BOOKING_FAILED_MESSAGE: &str = "Something went wrong. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    Details,
    Date,
    Time,
    Success,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Name,
    Email,
    Phone,
    BusinessName,
    Industry,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub business_name: String,
    pub industry: String,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
}

impl WizardForm {
    pub fn details_complete(&self) -> bool {
        [
            &self.name,
            &self.email,
            &self.phone,
            &self.business_name,
            &self.industry,
        ]
        .iter()
        .all(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("the booking window is closed")]
    Closed,
    #[error("not available in the {0:?} step")]
    WrongStep(WizardStep),
    #[error("all contact details are required")]
    IncompleteDetails,
    #[error("{0} cannot be booked")]
    DateNotBookable(NaiveDate),
    #[error("{0} is not an offered time")]
    UnknownSlot(String),
    #[error("a request is already in progress")]
    Busy,
    #[error("no date selected")]
    MissingDate,
    #[error("no time selected")]
    MissingTime,
}

/// Ticket for an in-flight availability fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityTicket {
    generation: u64,
    pub date: NaiveDate,
}

/// Ticket for an in-flight booking submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ReservationTicket {
    generation: u64,
    pub payload: BookingPayload,
}

/// Whether a response was applied or discarded as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Current,
    Stale,
}

#[derive(Debug, Clone)]
pub struct BookingWizard {
    is_open: bool,
    category: BookingCategory,
    step: WizardStep,
    form: WizardForm,
    available_slots: Vec<String>,
    is_loading: bool,
    last_error: Option<String>,
    generation: u64,
    fallback_slots: Vec<String>,
}

impl Default for BookingWizard {
    fn default() -> Self {
        Self::new(BusinessHours::default())
    }
}

impl BookingWizard {
    /// `hours` supplies the slots offered when availability cannot be fetched.
    pub fn new(hours: BusinessHours) -> Self {
        Self {
            is_open: false,
            category: BookingCategory::General,
            step: WizardStep::Details,
            form: WizardForm::default(),
            available_slots: Vec::new(),
            is_loading: false,
            last_error: None,
            generation: 0,
            fallback_slots: default_slot_labels(hours),
        }
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn category(&self) -> BookingCategory {
        self.category
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form(&self) -> &WizardForm {
        &self.form
    }

    pub fn available_slots(&self) -> &[String] {
        &self.available_slots
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Starts a fresh session, discarding anything from the previous one.
    pub fn open(&mut self, category: BookingCategory) {
        self.generation += 1;
        self.is_open = true;
        self.category = category;
        self.step = WizardStep::Details;
        self.form = WizardForm::default();
        self.available_slots.clear();
        self.is_loading = false;
        self.last_error = None;
    }

    /// In-flight calls keep running but their responses will be dropped.
    pub fn close(&mut self) {
        self.generation += 1;
        self.is_open = false;
        self.is_loading = false;
    }

    pub fn set_field(&mut self, field: DetailField, value: impl Into<String>) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Details)?;
        let value = value.into();
        match field {
            DetailField::Name => self.form.name = value,
            DetailField::Email => self.form.email = value,
            DetailField::Phone => self.form.phone = value,
            DetailField::BusinessName => self.form.business_name = value,
            DetailField::Industry => self.form.industry = value,
        }
        Ok(())
    }

    pub fn can_advance(&self) -> bool {
        self.is_open && self.step == WizardStep::Details && self.form.details_complete()
    }

    /// Details → date. Later steps advance through their own actions.
    pub fn next(&mut self) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Details)?;
        if !self.form.details_complete() {
            return Err(WizardError::IncompleteDetails);
        }
        self.step = WizardStep::Date;
        Ok(())
    }

    pub fn back(&mut self) -> Result<(), WizardError> {
        if !self.is_open {
            return Err(WizardError::Closed);
        }
        self.step = match self.step {
            WizardStep::Time => WizardStep::Date,
            WizardStep::Date => WizardStep::Details,
            other => return Err(WizardError::WrongStep(other)),
        };
        self.generation += 1;
        self.is_loading = false;
        self.last_error = None;
        Ok(())
    }

    pub fn select_date(
        &mut self,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<AvailabilityTicket, WizardError> {
        self.expect_step(WizardStep::Date)?;
        if self.is_loading {
            return Err(WizardError::Busy);
        }
        if !is_bookable(date, today) {
            return Err(WizardError::DateNotBookable(date));
        }

        self.form.date = Some(date);
        self.form.time = None;
        self.available_slots.clear();
        self.is_loading = true;
        self.last_error = None;

        Ok(AvailabilityTicket {
            generation: self.generation,
            date,
        })
    }

    /// A failed fetch falls back to the default business hours; either way
    /// the wizard moves on to the time step, even with zero slots.
    pub fn apply_availability(
        &mut self,
        ticket: AvailabilityTicket,
        result: Result<Vec<String>, ApiError>,
    ) -> Applied {
        if !self.is_current(ticket.generation) || self.step != WizardStep::Date {
            tracing::debug!(date = %ticket.date, "discarding stale availability response");
            return Applied::Stale;
        }

        self.available_slots = result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, date = %ticket.date, "availability fetch failed, offering default hours");
            self.fallback_slots.clone()
        });
        self.is_loading = false;
        self.step = WizardStep::Time;
        Applied::Current
    }

    pub fn select_time(&mut self, label: &str) -> Result<(), WizardError> {
        self.expect_step(WizardStep::Time)?;
        if !self.available_slots.iter().any(|s| s == label) {
            return Err(WizardError::UnknownSlot(label.to_string()));
        }
        self.form.time = Some(label.to_string());
        Ok(())
    }

    pub fn confirm(&mut self) -> Result<ReservationTicket, WizardError> {
        self.expect_step(WizardStep::Time)?;
        if self.is_loading {
            return Err(WizardError::Busy);
        }
        let date = self.form.date.ok_or(WizardError::MissingDate)?;
        let time = self.form.time.clone().ok_or(WizardError::MissingTime)?;

        self.is_loading = true;
        self.last_error = None;

        Ok(ReservationTicket {
            generation: self.generation,
            payload: BookingPayload {
                name: Some(self.form.name.clone()),
                email: Some(self.form.email.clone()),
                phone: Some(self.form.phone.clone()),
                business_name: Some(self.form.business_name.clone()),
                industry: Some(self.form.industry.clone()),
                date: Some(date.format("%Y-%m-%d").to_string()),
                time: Some(time),
                category: Some(self.category.as_str().to_string()),
            },
        })
    }

    /// Anything short of an explicit refusal counts as booked: an
    /// unreachable server still lands on the success screen.
    pub fn apply_reservation(
        &mut self,
        ticket: ReservationTicket,
        result: Result<BookingResponse, ApiError>,
    ) -> Applied {
        if !self.is_current(ticket.generation) || self.step != WizardStep::Time {
            tracing::debug!("discarding stale booking response");
            return Applied::Stale;
        }

        self.is_loading = false;
        match result {
            Ok(response) if response.success => self.step = WizardStep::Success,
            Ok(_) => self.last_error = Some(BOOKING_FAILED_MESSAGE.to_string()),
            Err(e) if e.is_client_error() => {
                tracing::warn!(error = %e, "booking rejected");
                self.last_error = Some(BOOKING_FAILED_MESSAGE.to_string());
            }
            Err(e) => {
                tracing::warn!(error = %e, "booking request failed, assuming success");
                self.step = WizardStep::Success;
            }
        }
        Applied::Current
    }

    fn is_current(&self, generation: u64) -> bool {
        self.is_open && generation == self.generation
    }

    fn expect_step(&self, step: WizardStep) -> Result<(), WizardError> {
        if !self.is_open {
            return Err(WizardError::Closed);
        }
        if self.step != step {
            return Err(WizardError::WrongStep(self.step));
        }
        Ok(())
    }
}
