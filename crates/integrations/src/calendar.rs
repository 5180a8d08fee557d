//! Calendar scheduling
//!
//! Creates a one-hour consultation event from the entity record's meeting
//! fields. Only invoked when both `meeting_date` and `meeting_time` are set;
//! unparseable input yields a failed outcome with a descriptive error, never
//! a panic or an `Err`.

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use sales_agent_core::EntityRecord;

use crate::IntegrationError;

/// Accepted meeting date/time formats, tried in order
const MEETING_FORMATS: [&str; 3] = [
    // 12-hour with meridiem: 30-01-2025 11:00 AM
    "%d-%m-%Y %I:%M %p",
    // 24-hour: 30-01-2025 14:00
    "%d-%m-%Y %H:%M",
    // 12-hour without meridiem: 30-01-2025 11:00
    "%d-%m-%Y %I:%M",
];

/// Parse the entity record's meeting fields into a start time
pub fn parse_meeting_datetime(date: &str, time: &str) -> Result<NaiveDateTime, IntegrationError> {
    let combined = format!("{date} {time}");

    for format in MEETING_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&combined, format) {
            return Ok(parsed);
        }
    }

    Err(IntegrationError::MeetingTime(format!(
        "could not parse '{combined}'; expected DD-MM-YYYY HH:MM AM/PM or DD-MM-YYYY HH:MM"
    )))
}

/// Outcome of an event-creation attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventOutcome {
    pub success: bool,
    pub event_link: Option<String>,
    pub error: Option<String>,
}

impl EventOutcome {
    pub fn created(link: impl Into<String>) -> Self {
        Self {
            success: true,
            event_link: Some(link.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            event_link: None,
            error: Some(error.into()),
        }
    }
}

/// Scheduled event, as recorded by the stub
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub summary: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub attendee_email: Option<String>,
}

/// Calendar seam
#[async_trait]
pub trait CalendarIntegration: Send + Sync {
    /// Create a consultation event from the entity record
    async fn create_event(&self, entities: &EntityRecord) -> EventOutcome;
}

/// In-memory calendar used in development and tests
#[derive(Default)]
pub struct StubCalendarIntegration {
    events: Mutex<Vec<ScheduledEvent>>,
}

impl StubCalendarIntegration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far
    pub fn scheduled_events(&self) -> Vec<ScheduledEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl CalendarIntegration for StubCalendarIntegration {
    async fn create_event(&self, entities: &EntityRecord) -> EventOutcome {
        let (Some(date), Some(time)) = (&entities.meeting_date, &entities.meeting_time) else {
            return EventOutcome::failed("Missing meeting date or time");
        };

        let start = match parse_meeting_datetime(date, time) {
            Ok(start) => start,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected calendar event");
                return EventOutcome::failed(e.to_string());
            }
        };

        let company = entities
            .company_name
            .as_deref()
            .unwrap_or("Potential Client");
        let event = ScheduledEvent {
            summary: format!("Sales Consultation - {company}"),
            start,
            end: start + Duration::hours(1),
            attendee_email: entities.email.clone(),
        };

        tracing::info!(summary = %event.summary, start = %event.start, "Scheduled calendar event");

        let mut events = self.events.lock();
        events.push(event);
        EventOutcome::created(format!("stub://calendar/event/{}", events.len()))
    }
}
