pub mod calendar_service;

pub use calendar_service::{
    CalendarService, CreateEventRequest, EventOccurrence, OccurrenceItem, ReminderItem,
    UpdateEventRequest,
};
