//! External business integrations
//!
//! CRM lead creation and calendar scheduling behind narrow async traits.
//! Both are fire-and-forget side effects triggered when a call ends: their
//! failure is logged, never retried, and never blocks the farewell turn.

pub mod calendar;
pub mod crm;

pub use calendar::{
    parse_meeting_datetime, CalendarIntegration, EventOutcome, StubCalendarIntegration,
};
pub use crm::{CrmIntegration, Lead, StubCrmIntegration};

use thiserror::Error;

/// Integration errors
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("CRM error: {0}")]
    Crm(String),

    #[error("Unparseable meeting time: {0}")]
    MeetingTime(String),
}

impl From<IntegrationError> for sales_agent_core::Error {
    fn from(err: IntegrationError) -> Self {
        sales_agent_core::Error::Integration(err.to_string())
    }
}
