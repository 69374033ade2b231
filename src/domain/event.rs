use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CalendarError, CalendarResult};

/// Classification tag for a calendar event. Opaque to the expansion engine;
/// presentation layers use it to pick icons and wording.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EventType {
    BudgetLimit,
    PaymentReminder,
    RecurringExpense,
    UpcomingBill,
    Custom,
}

/// Repetition schedule of an event series, anchored at `scheduled_at`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Recurrence {
    None,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Recurrence {
    pub fn is_recurring(self) -> bool {
        !matches!(self, Recurrence::None)
    }

    pub fn label(self) -> &'static str {
        match self {
            Recurrence::None => "One-off",
            Recurrence::Daily => "Daily",
            Recurrence::Weekly => "Weekly",
            Recurrence::Monthly => "Monthly",
            Recurrence::Quarterly => "Quarterly",
            Recurrence::Yearly => "Yearly",
        }
    }
}

/// Mutable portion of a calendar event, shared by creation and update.
///
/// `scheduled_at` must already be normalized to UTC by the caller; the
/// service layer converts boundary timestamps before building details.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDetails {
    pub title: String,
    pub notes: Option<String>,
    pub event_type: EventType,
    pub scheduled_at: DateTime<Utc>,
    pub reminder_offset_minutes: Option<i64>,
    pub recurrence: Recurrence,
    pub linked_expense_id: Option<Uuid>,
}

/// A calendar event definition: a single occurrence or the anchor of a
/// recurring series. Plain immutable record; state changes go through the
/// transition functions which return new values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub notes: Option<String>,
    pub event_type: EventType,
    /// Anchor occurrence, always UTC. The only occurrence for one-off
    /// events, the first of the series for recurring ones.
    pub scheduled_at: DateTime<Utc>,
    pub reminder_offset_minutes: Option<i64>,
    pub recurrence: Recurrence,
    pub linked_expense_id: Option<Uuid>,
    /// Dismissal watermark: occurrences at or before this instant are
    /// suppressed from query results.
    pub dismissed_until_utc: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CalendarEvent {
    /// Builds a new event for `user_id`, validating and trimming the
    /// details. Fails with a validation error when the title is blank.
    pub fn create(user_id: Uuid, details: EventDetails) -> CalendarResult<Self> {
        let details = validated(details)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            title: details.title,
            notes: details.notes,
            event_type: details.event_type,
            scheduled_at: details.scheduled_at,
            reminder_offset_minutes: details.reminder_offset_minutes,
            recurrence: details.recurrence,
            linked_expense_id: details.linked_expense_id,
            dismissed_until_utc: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns a copy with all mutable fields rewritten from `details`.
    ///
    /// Rescheduling can clear the dismissal watermark: a one-off event whose
    /// watermark is at or before the new anchor reappears, and a recurring
    /// series drops a watermark older than its new anchor.
    pub fn with_details(&self, details: EventDetails) -> CalendarResult<Self> {
        let details = validated(details)?;
        let dismissed_until_utc =
            carried_watermark(self.dismissed_until_utc, details.recurrence, details.scheduled_at);
        Ok(Self {
            title: details.title,
            notes: details.notes,
            event_type: details.event_type,
            scheduled_at: details.scheduled_at,
            reminder_offset_minutes: details.reminder_offset_minutes,
            recurrence: details.recurrence,
            linked_expense_id: details.linked_expense_id,
            dismissed_until_utc,
            updated_at: Utc::now(),
            ..self.clone()
        })
    }

    /// Returns a copy with the dismissal watermark raised to `occurrence_utc`.
    pub fn with_dismissal(&self, occurrence_utc: DateTime<Utc>) -> Self {
        Self {
            dismissed_until_utc: Some(occurrence_utc),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Whether an occurrence at `instant` falls under the dismissal
    /// watermark.
    pub fn is_dismissed_at(&self, instant: DateTime<Utc>) -> bool {
        match self.dismissed_until_utc {
            Some(watermark) => instant <= watermark,
            None => false,
        }
    }
}

fn validated(details: EventDetails) -> CalendarResult<EventDetails> {
    let title = details.title.trim().to_string();
    if title.is_empty() {
        return Err(CalendarError::Validation("Title cannot be empty.".into()));
    }
    let notes = details
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|notes| !notes.is_empty())
        .map(str::to_string);
    Ok(EventDetails {
        title,
        notes,
        ..details
    })
}

fn carried_watermark(
    watermark: Option<DateTime<Utc>>,
    recurrence: Recurrence,
    new_anchor: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let watermark = watermark?;
    let reset = if recurrence.is_recurring() {
        watermark < new_anchor
    } else {
        watermark <= new_anchor
    };
    if reset {
        None
    } else {
        Some(watermark)
    }
}
