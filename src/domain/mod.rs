pub mod event;

pub use event::{CalendarEvent, EventDetails, EventType, Recurrence};
