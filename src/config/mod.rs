use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::errors::CalendarResult;
use crate::expansion::ExpansionLimits;

/// Tunable behavior of the calendar query service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalendarConfig {
    /// How far past its anchor a recurring series is ever expanded.
    pub expansion_horizon_days: i64,
    /// Width of the window scanned when building dashboard reminders.
    pub dashboard_lookahead_days: i64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            expansion_horizon_days: 365,
            dashboard_lookahead_days: 30,
        }
    }
}

impl CalendarConfig {
    /// Loads the configuration from `path`, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> CalendarResult<Self> {
        if path.exists() {
            let data = fs::read_to_string(path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> CalendarResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn expansion_limits(&self) -> ExpansionLimits {
        ExpansionLimits::with_horizon_days(self.expansion_horizon_days)
    }
}
