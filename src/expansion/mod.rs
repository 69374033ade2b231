//! Occurrence expansion for calendar events.
//!
//! Pure functions mapping an event definition and a UTC window to the
//! ordered occurrence instants inside that window. Recurring series are
//! never materialized beyond a configurable horizon past their anchor.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};

use crate::domain::{CalendarEvent, Recurrence};

/// Hard cap on candidates examined per series, independent of the horizon.
const MAX_EXPANSION_STEPS: usize = 4096;

const DEFAULT_HORIZON_DAYS: i64 = 365;

/// Bounds applied while expanding recurring series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionLimits {
    /// Maximum distance past the anchor a recurring series is expanded,
    /// regardless of how far the requested window extends.
    pub horizon: Duration,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        Self {
            horizon: Duration::days(DEFAULT_HORIZON_DAYS),
        }
    }
}

impl ExpansionLimits {
    pub fn with_horizon_days(days: i64) -> Self {
        Self {
            horizon: Duration::days(days),
        }
    }
}

/// Expands `event` over `[from_utc, to_utc]` with the default limits.
pub fn occurrences(
    event: &CalendarEvent,
    from_utc: DateTime<Utc>,
    to_utc: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    occurrences_with(event, from_utc, to_utc, &ExpansionLimits::default())
}

/// Expands `event` over `[from_utc, to_utc]`, returning the ascending
/// occurrence instants that survive the dismissal watermark.
///
/// Inverted windows yield an empty result rather than an error. One-off
/// events contribute their anchor when it lies inside the window; recurring
/// series are aligned to the window start without stepping through every
/// skipped period, then enumerated until the window end or the horizon cap,
/// whichever comes first.
pub fn occurrences_with(
    event: &CalendarEvent,
    from_utc: DateTime<Utc>,
    to_utc: DateTime<Utc>,
    limits: &ExpansionLimits,
) -> Vec<DateTime<Utc>> {
    if to_utc < from_utc {
        return Vec::new();
    }

    let anchor = event.scheduled_at;
    if !event.recurrence.is_recurring() {
        let inside = anchor >= from_utc && anchor <= to_utc;
        return if inside && !event.is_dismissed_at(anchor) {
            vec![anchor]
        } else {
            Vec::new()
        };
    }

    let effective_to = to_utc.min(anchor + limits.horizon);
    let mut found = Vec::new();
    let mut index = aligned_index(anchor, event.recurrence, from_utc);
    let mut previous: Option<DateTime<Utc>> = None;

    for _ in 0..MAX_EXPANSION_STEPS {
        let candidate = nth_occurrence(anchor, event.recurrence, index);
        if candidate > effective_to {
            break;
        }
        // Guards degenerate steps that fail to advance.
        if previous.is_some_and(|prior| candidate <= prior) {
            break;
        }
        if candidate >= from_utc && !event.is_dismissed_at(candidate) {
            found.push(candidate);
        }
        previous = Some(candidate);
        index += 1;
    }

    found
}

/// Occurrence `index` of a series: the anchor advanced by `index` periods.
///
/// Month and year steps are computed from the anchor rather than chained
/// through intermediate occurrences, so a month-end anchor returns to the
/// month end after passing through a shorter month (Jan 31, Feb 29, Mar 31).
fn nth_occurrence(anchor: DateTime<Utc>, recurrence: Recurrence, index: i64) -> DateTime<Utc> {
    match recurrence {
        Recurrence::None => anchor,
        Recurrence::Daily => anchor + Duration::days(index),
        Recurrence::Weekly => anchor + Duration::weeks(index),
        Recurrence::Monthly => shift_months(anchor, index),
        Recurrence::Quarterly => shift_months(anchor, index * 3),
        Recurrence::Yearly => shift_months(anchor, index * 12),
    }
}

/// Index of the first candidate at or after `from_utc`, computed without
/// iterating every skipped period. Month and year estimates may land one or
/// two periods short of the window; the enumeration loop skips those.
fn aligned_index(anchor: DateTime<Utc>, recurrence: Recurrence, from_utc: DateTime<Utc>) -> i64 {
    if anchor >= from_utc {
        return 0;
    }
    match recurrence {
        Recurrence::None => 0,
        Recurrence::Daily => periods_between(anchor, from_utc, Duration::days(1)),
        Recurrence::Weekly => periods_between(anchor, from_utc, Duration::weeks(1)),
        Recurrence::Monthly => month_steps(anchor, from_utc, 1),
        Recurrence::Quarterly => month_steps(anchor, from_utc, 3),
        Recurrence::Yearly => year_steps(anchor, from_utc),
    }
}

fn periods_between(anchor: DateTime<Utc>, target: DateTime<Utc>, period: Duration) -> i64 {
    let elapsed = (target - anchor).num_milliseconds();
    elapsed.div_ceil(period.num_milliseconds())
}

fn month_steps(anchor: DateTime<Utc>, target: DateTime<Utc>, step_months: i64) -> i64 {
    let mut months = i64::from(target.year() - anchor.year()) * 12
        + i64::from(target.month()) - i64::from(anchor.month());
    if target.day() > anchor.day() {
        months += 1;
    }
    months.div_ceil(step_months).max(0)
}

fn year_steps(anchor: DateTime<Utc>, target: DateTime<Utc>) -> i64 {
    let mut years = i64::from(target.year() - anchor.year());
    if target.ordinal() > anchor.ordinal() {
        years += 1;
    }
    years.max(0)
}

/// Calendar month arithmetic: the anchor's day-of-month is clamped to the
/// target month's length, the time of day is preserved.
fn shift_months(at: DateTime<Utc>, months: i64) -> DateTime<Utc> {
    let date = at.date_naive();
    let total = i64::from(date.year()) * 12 + i64::from(date.month0()) + months;
    let year = total.div_euclid(12) as i32;
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    let shifted = NaiveDate::from_ymd_opt(year, month, day).unwrap_or(date);
    Utc.from_utc_datetime(&shifted.and_time(at.time()))
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 28).unwrap());
    let last_current = first_next - Duration::days(1);
    last_current.day()
}
