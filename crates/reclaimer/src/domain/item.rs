#![forbid(unsafe_code)]

use crate::domain::EntityKind;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A container or image as seen by one inventory snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryItem {
    pub id: String,
    pub kind: EntityKind,
    pub timestamp: DateTime<Utc>,
}

impl InventoryItem {
    pub fn new(id: impl Into<String>, kind: EntityKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            kind,
            timestamp,
        }
    }

    /// Age of the item at `now`. Timestamps in the future count as zero.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        age_between(self.timestamp, now)
    }
}

pub(crate) fn age_between(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - timestamp).to_std().unwrap_or(Duration::ZERO)
}
