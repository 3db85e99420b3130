use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;

use super::api::BookingApi;
use super::{Applied, BookingWizard, WizardError};

/// Runs a [`BookingWizard`] against a [`BookingApi`]. The lock is released
/// while a request is in flight, so the wizard can be closed or reopened
/// meanwhile; the late response is then discarded.
pub struct WizardSession<A> {
    wizard: Mutex<BookingWizard>,
    api: A,
}

impl<A: BookingApi> WizardSession<A> {
    pub fn new(wizard: BookingWizard, api: A) -> Self {
        Self {
            wizard: Mutex::new(wizard),
            api,
        }
    }

    /// Synchronous access for field edits, navigation and open/close.
    pub fn with<R>(&self, f: impl FnOnce(&mut BookingWizard) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn state(&self) -> BookingWizard {
        self.lock().clone()
    }

    pub async fn choose_date(&self, date: NaiveDate, today: NaiveDate) -> Result<Applied, WizardError> {
        let ticket = self.lock().select_date(date, today)?;
        let result = self.api.availability(ticket.date).await;
        Ok(self.lock().apply_availability(ticket, result))
    }

    pub async fn confirm(&self) -> Result<Applied, WizardError> {
        let ticket = self.lock().confirm()?;
        let result = self.api.book(&ticket.payload).await;
        Ok(self.lock().apply_reservation(ticket, result))
    }

    fn lock(&self) -> MutexGuard<'_, BookingWizard> {
        self.wizard.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
