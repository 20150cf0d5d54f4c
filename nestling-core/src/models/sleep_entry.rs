use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::record_id::RecordId;

/// A sleep interval. An entry with no `end_time` is still running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepEntry {
    pub id: RecordId,
    pub baby_id: RecordId,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepState {
    Active,
    Stopped,
}

impl fmt::Display for SleepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SleepState::Active => write!(f, "active"),
            SleepState::Stopped => write!(f, "stopped"),
        }
    }
}

impl SleepEntry {
    pub fn state(&self) -> SleepState {
        if self.end_time.is_some() {
            SleepState::Stopped
        } else {
            SleepState::Active
        }
    }

    pub fn is_active(&self) -> bool {
        self.state() == SleepState::Active
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.end_time.unwrap_or(now) - self.start_time
    }

    /// True for a running entry that has gone on longer than `max`.
    pub fn is_stale(&self, now: DateTime<Utc>, max: Duration) -> bool {
        self.is_active() && now - self.start_time > max
    }
}

impl fmt::Display for SleepEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}",
            self.id,
            self.start_time.format("%Y-%m-%d %H:%M")
        )?;
        match (self.end_time, self.duration_minutes) {
            (Some(end), Some(minutes)) => {
                write!(f, " - {} ({}h{:02}m)", end.format("%H:%M"), minutes / 60, minutes % 60)?
            }
            (Some(end), None) => write!(f, " - {}", end.format("%H:%M"))?,
            (None, _) => write!(f, " (sleeping)")?,
        }
        if let Some(notes) = &self.notes {
            write!(f, "  {}", notes)?;
        }
        Ok(())
    }
}

/// Input for starting a sleep entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSleepEntry {
    pub baby_id: RecordId,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl NewSleepEntry {
    pub fn new(baby_id: RecordId, user_id: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            baby_id,
            user_id: user_id.into(),
            start_time,
            end_time: None,
            notes: None,
        }
    }

    pub fn with_end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Duration implied by the start and end times, if the entry is closed.
    pub fn duration_minutes(&self) -> Option<i64> {
        self.end_time
            .map(|end| (end - self.start_time).num_minutes())
    }
}

/// Partial update for a sleep entry; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepPatch {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub notes: Option<String>,
}

impl SleepPatch {
    /// Closes an entry at `end_time`, computing the duration from `start_time`.
    pub fn stop(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            end_time: Some(end_time),
            duration_minutes: Some((end_time - start_time).num_minutes()),
            ..Default::default()
        }
    }

    /// Applies the patch. Moving either end of a closed entry recomputes its
    /// duration unless the patch sets one.
    pub fn apply(&self, entry: &mut SleepEntry) {
        if let Some(start) = self.start_time {
            entry.start_time = start;
        }
        if let Some(end) = self.end_time {
            entry.end_time = Some(end);
        }
        match self.duration_minutes {
            Some(minutes) => entry.duration_minutes = Some(minutes),
            None if self.start_time.is_some() || self.end_time.is_some() => {
                entry.duration_minutes = entry
                    .end_time
                    .map(|end| (end - entry.start_time).num_minutes());
            }
            None => {}
        }
        if let Some(notes) = &self.notes {
            entry.notes = Some(notes.clone());
        }
    }
}
