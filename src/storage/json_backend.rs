use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};
use uuid::Uuid;

use crate::domain::CalendarEvent;
use crate::errors::CalendarResult;

use super::EventRepository;

const TMP_SUFFIX: &str = "tmp";
const STORE_FILE: &str = "calendar_events.json";

pub const STORE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    schema_version: u32,
    events: Vec<CalendarEvent>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            schema_version: STORE_SCHEMA_VERSION,
            events: Vec::new(),
        }
    }
}

/// File-backed event store: the whole collection lives in one JSON document
/// rewritten atomically on every mutation. Suited to the single-user desktop
/// deployment this crate targets; writes are last-writer-wins.
pub struct JsonEventStore {
    path: PathBuf,
    events: Vec<CalendarEvent>,
}

impl JsonEventStore {
    /// Opens the store at `path`, treating a missing file as empty.
    pub fn open(path: impl Into<PathBuf>) -> CalendarResult<Self> {
        let path = path.into();
        let events = if path.exists() {
            let data = fs::read_to_string(&path)?;
            let document: StoreDocument = serde_json::from_str(&data)?;
            if document.schema_version != STORE_SCHEMA_VERSION {
                tracing::warn!(
                    found = document.schema_version,
                    expected = STORE_SCHEMA_VERSION,
                    "Calendar store schema version mismatch; loading anyway."
                );
            }
            document.events
        } else {
            Vec::new()
        };
        Ok(Self { path, events })
    }

    /// Opens the store at its default location under the user data
    /// directory.
    pub fn open_default() -> CalendarResult<Self> {
        let base = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calendar_core");
        ensure_dir(&base)?;
        Self::open(base.join(STORE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn persist(&self) -> CalendarResult<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let document = StoreDocument {
            schema_version: STORE_SCHEMA_VERSION,
            events: self.events.clone(),
        };
        let json = serde_json::to_string_pretty(&document)?;
        write_atomic(&self.path, &json)
    }

    fn position(&self, user_id: Uuid, event_id: Uuid) -> Option<usize> {
        self.events
            .iter()
            .position(|event| event.id == event_id && event.user_id == user_id)
    }
}

impl EventRepository for JsonEventStore {
    fn find(&self, user_id: Uuid, event_id: Uuid) -> CalendarResult<Option<CalendarEvent>> {
        Ok(self.position(user_id, event_id).map(|at| self.events[at].clone()))
    }

    fn single_events_in_window(
        &self,
        user_id: Uuid,
        from_utc: DateTime<Utc>,
        to_utc: DateTime<Utc>,
    ) -> CalendarResult<Vec<CalendarEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|event| {
                event.user_id == user_id
                    && !event.recurrence.is_recurring()
                    && event.scheduled_at >= from_utc
                    && event.scheduled_at <= to_utc
            })
            .cloned()
            .collect())
    }

    fn recurring_events_until(
        &self,
        user_id: Uuid,
        to_utc: DateTime<Utc>,
    ) -> CalendarResult<Vec<CalendarEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|event| {
                event.user_id == user_id
                    && event.recurrence.is_recurring()
                    && event.scheduled_at <= to_utc
            })
            .cloned()
            .collect())
    }

    fn insert(&mut self, event: CalendarEvent) -> CalendarResult<()> {
        self.events.push(event);
        self.persist()
    }

    fn save(&mut self, event: &CalendarEvent) -> CalendarResult<bool> {
        match self.position(event.user_id, event.id) {
            Some(at) => {
                self.events[at] = event.clone();
                self.persist()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&mut self, user_id: Uuid, event_id: Uuid) -> CalendarResult<bool> {
        match self.position(user_id, event_id) {
            Some(at) => {
                self.events.remove(at);
                self.persist()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn ensure_dir(path: &Path) -> CalendarResult<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

fn write_atomic(path: &Path, contents: &str) -> CalendarResult<()> {
    let tmp = tmp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}
