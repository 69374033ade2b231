pub mod json_backend;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::CalendarEvent;
use crate::errors::CalendarResult;

/// Abstraction over persistence backends holding calendar event records.
///
/// Reads are pre-filtered the way the query service consumes them: one-off
/// events by anchor window, recurring events by upper bound only (a series
/// anchored far in the past can still produce in-window occurrences).
/// Missing records on write paths are reported as `Ok(false)`, not errors.
pub trait EventRepository: Send + Sync {
    fn find(&self, user_id: Uuid, event_id: Uuid) -> CalendarResult<Option<CalendarEvent>>;

    fn single_events_in_window(
        &self,
        user_id: Uuid,
        from_utc: DateTime<Utc>,
        to_utc: DateTime<Utc>,
    ) -> CalendarResult<Vec<CalendarEvent>>;

    fn recurring_events_until(
        &self,
        user_id: Uuid,
        to_utc: DateTime<Utc>,
    ) -> CalendarResult<Vec<CalendarEvent>>;

    fn insert(&mut self, event: CalendarEvent) -> CalendarResult<()>;

    /// Replaces the stored record with the same id and owner. Returns
    /// `false` when no such record exists.
    fn save(&mut self, event: &CalendarEvent) -> CalendarResult<bool>;

    fn remove(&mut self, user_id: Uuid, event_id: Uuid) -> CalendarResult<bool>;
}

pub use json_backend::{JsonEventStore, STORE_SCHEMA_VERSION};
