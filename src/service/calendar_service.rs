//! Query and mutation surface for calendar events.
//!
//! Orchestrates repository fetches and occurrence expansion, and derives the
//! record shapes consumed by the event list, the alert panel, and the
//! dashboard.

use chrono::{DateTime, Duration, FixedOffset, Local, LocalResult, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use crate::config::CalendarConfig;
use crate::domain::{CalendarEvent, EventDetails, EventType, Recurrence};
use crate::errors::CalendarResult;
use crate::expansion::{self, ExpansionLimits};
use crate::storage::EventRepository;

/// Payload for creating a calendar event. The anchor may arrive in any
/// offset; it is normalized to UTC before the event is built.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateEventRequest {
    pub user_id: Uuid,
    pub title: String,
    pub notes: Option<String>,
    pub event_type: EventType,
    pub scheduled_at: DateTime<FixedOffset>,
    pub reminder_offset_minutes: Option<i64>,
    pub linked_expense_id: Option<Uuid>,
    pub recurrence: Recurrence,
}

/// Payload for rewriting an existing event's mutable fields.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateEventRequest {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub notes: Option<String>,
    pub event_type: EventType,
    pub scheduled_at: DateTime<FixedOffset>,
    pub reminder_offset_minutes: Option<i64>,
    pub linked_expense_id: Option<Uuid>,
    pub recurrence: Recurrence,
}

/// One materialized occurrence with the full static fields of its event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventOccurrence {
    pub event_id: Uuid,
    pub title: String,
    pub notes: Option<String>,
    pub occurs_at: DateTime<Utc>,
    pub reminder_offset_minutes: Option<i64>,
    pub recurrence: Recurrence,
    pub linked_expense_id: Option<Uuid>,
    pub event_type: EventType,
    pub dismissed_until_utc: Option<DateTime<Utc>>,
}

/// Lighter occurrence record used by alert and reminder presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct OccurrenceItem {
    pub event_id: Uuid,
    pub title: String,
    pub occurs_at: DateTime<Utc>,
    pub event_type: EventType,
    pub recurrence: Recurrence,
    pub is_recurring: bool,
}

/// Dashboard reminder: an occurrence falling within the current local day.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderItem {
    pub event_id: Uuid,
    pub title: String,
    pub occurs_at: DateTime<Utc>,
    pub event_type: EventType,
    pub is_recurring: bool,
}

/// Calendar query service over a persistence backend.
pub struct CalendarService<R: EventRepository> {
    repository: R,
    limits: ExpansionLimits,
    dashboard_lookahead: Duration,
}

impl<R: EventRepository> CalendarService<R> {
    pub fn new(repository: R) -> Self {
        Self::with_config(repository, &CalendarConfig::default())
    }

    pub fn with_config(repository: R, config: &CalendarConfig) -> Self {
        Self {
            repository,
            limits: config.expansion_limits(),
            dashboard_lookahead: Duration::days(config.dashboard_lookahead_days),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Materialized occurrences for the user's window, one record per
    /// surviving occurrence, sorted by instant then title.
    pub fn upcoming_events(
        &self,
        user_id: Uuid,
        from_utc: DateTime<Utc>,
        to_utc: DateTime<Utc>,
    ) -> CalendarResult<Vec<EventOccurrence>> {
        let expanded = self.expand_window(user_id, from_utc, to_utc)?;
        Ok(expanded
            .into_iter()
            .map(|(event, occurs_at)| EventOccurrence {
                event_id: event.id,
                title: event.title,
                notes: event.notes,
                occurs_at,
                reminder_offset_minutes: event.reminder_offset_minutes,
                recurrence: event.recurrence,
                linked_expense_id: event.linked_expense_id,
                event_type: event.event_type,
                dismissed_until_utc: event.dismissed_until_utc,
            })
            .collect())
    }

    /// Same expansion as [`Self::upcoming_events`] with a lighter record
    /// shape carrying a recurrence flag.
    pub fn upcoming_occurrences(
        &self,
        user_id: Uuid,
        from_utc: DateTime<Utc>,
        to_utc: DateTime<Utc>,
    ) -> CalendarResult<Vec<OccurrenceItem>> {
        let expanded = self.expand_window(user_id, from_utc, to_utc)?;
        Ok(expanded.into_iter().map(to_occurrence_item).collect())
    }

    /// Reminders for the dashboard: occurrences inside the lookahead window
    /// narrowed to the current local calendar day.
    pub fn dashboard_reminders(&self, user_id: Uuid) -> CalendarResult<Vec<ReminderItem>> {
        self.dashboard_reminders_at(user_id, Utc::now(), &Local)
    }

    /// Clock- and zone-injectable variant of [`Self::dashboard_reminders`].
    pub fn dashboard_reminders_at<Tz: TimeZone>(
        &self,
        user_id: Uuid,
        now_utc: DateTime<Utc>,
        tz: &Tz,
    ) -> CalendarResult<Vec<ReminderItem>> {
        let horizon_utc = now_utc + self.dashboard_lookahead;
        let (day_start_utc, day_end_utc) = local_day_bounds(tz, now_utc);

        let occurrences = self.upcoming_occurrences(user_id, now_utc, horizon_utc)?;
        Ok(occurrences
            .into_iter()
            .filter(|item| item.occurs_at >= day_start_utc && item.occurs_at < day_end_utc)
            .map(|item| ReminderItem {
                event_id: item.event_id,
                title: item.title,
                occurs_at: item.occurs_at,
                event_type: item.event_type,
                is_recurring: item.is_recurring,
            })
            .collect())
    }

    /// Creates a new event and returns its identifier.
    pub fn create_event(&mut self, request: CreateEventRequest) -> CalendarResult<Uuid> {
        let event = CalendarEvent::create(
            request.user_id,
            EventDetails {
                title: request.title,
                notes: request.notes,
                event_type: request.event_type,
                scheduled_at: request.scheduled_at.with_timezone(&Utc),
                reminder_offset_minutes: request.reminder_offset_minutes,
                recurrence: request.recurrence,
                linked_expense_id: request.linked_expense_id,
            },
        )?;
        let event_id = event.id;
        self.repository.insert(event)?;
        tracing::debug!(%event_id, "Calendar event created.");
        Ok(event_id)
    }

    /// Rewrites the mutable fields of the event owned by
    /// `(event_id, user_id)`. Returns `Ok(false)` when no such event
    /// exists.
    pub fn update_event(&mut self, request: UpdateEventRequest) -> CalendarResult<bool> {
        let Some(event) = self.repository.find(request.user_id, request.event_id)? else {
            return Ok(false);
        };
        let updated = event.with_details(EventDetails {
            title: request.title,
            notes: request.notes,
            event_type: request.event_type,
            scheduled_at: request.scheduled_at.with_timezone(&Utc),
            reminder_offset_minutes: request.reminder_offset_minutes,
            recurrence: request.recurrence,
            linked_expense_id: request.linked_expense_id,
        })?;
        let saved = self.repository.save(&updated)?;
        tracing::debug!(event_id = %request.event_id, saved, "Calendar event updated.");
        Ok(saved)
    }

    /// Removes the event. Returns `Ok(false)` when it does not exist for
    /// that user.
    pub fn delete_event(&mut self, user_id: Uuid, event_id: Uuid) -> CalendarResult<bool> {
        let removed = self.repository.remove(user_id, event_id)?;
        tracing::debug!(%event_id, removed, "Calendar event deleted.");
        Ok(removed)
    }

    /// Raises the event's dismissal watermark to `occurrence_utc`,
    /// suppressing that occurrence and everything before it. Returns
    /// `Ok(false)` when the event does not exist for that user.
    pub fn dismiss_occurrence(
        &mut self,
        user_id: Uuid,
        event_id: Uuid,
        occurrence: DateTime<FixedOffset>,
    ) -> CalendarResult<bool> {
        let Some(event) = self.repository.find(user_id, event_id)? else {
            return Ok(false);
        };
        let dismissed = event.with_dismissal(occurrence.with_timezone(&Utc));
        let saved = self.repository.save(&dismissed)?;
        tracing::debug!(%event_id, saved, "Calendar occurrence dismissed.");
        Ok(saved)
    }

    /// Shared expansion path for both read shapes: fetches one-off events
    /// inside the window and recurring events anchored at or before its end,
    /// expands each, and sorts the merged occurrences by instant with a
    /// title tie-break.
    fn expand_window(
        &self,
        user_id: Uuid,
        from_utc: DateTime<Utc>,
        to_utc: DateTime<Utc>,
    ) -> CalendarResult<Vec<(CalendarEvent, DateTime<Utc>)>> {
        if to_utc < from_utc {
            return Ok(Vec::new());
        }

        let mut events = self
            .repository
            .single_events_in_window(user_id, from_utc, to_utc)?;
        events.extend(self.repository.recurring_events_until(user_id, to_utc)?);

        let mut expanded = Vec::new();
        for event in events {
            for occurs_at in expansion::occurrences_with(&event, from_utc, to_utc, &self.limits) {
                expanded.push((event.clone(), occurs_at));
            }
        }
        expanded.sort_by(|left, right| {
            left.1
                .cmp(&right.1)
                .then_with(|| left.0.title.cmp(&right.0.title))
        });
        Ok(expanded)
    }
}

fn to_occurrence_item((event, occurs_at): (CalendarEvent, DateTime<Utc>)) -> OccurrenceItem {
    OccurrenceItem {
        event_id: event.id,
        title: event.title,
        occurs_at,
        event_type: event.event_type,
        recurrence: event.recurrence,
        is_recurring: event.recurrence.is_recurring(),
    }
}

/// UTC bounds of the local calendar day containing `now_utc`.
fn local_day_bounds<Tz: TimeZone>(tz: &Tz, now_utc: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now_utc.with_timezone(tz).date_naive();
    let start_local = today.and_time(NaiveTime::MIN);
    let end_local = start_local + Duration::days(1);
    (resolve_local(tz, start_local), resolve_local(tz, end_local))
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, at: chrono::NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&at) {
        LocalResult::Single(resolved) => resolved.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // DST gap: fall back to reading the wall-clock value as UTC.
        LocalResult::None => Utc.from_utc_datetime(&at),
    }
}
