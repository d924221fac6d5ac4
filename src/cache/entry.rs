use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::types::identifiers::EntityId;

/// On-disk layout: normalized entity → entry. `BTreeMap` keeps the file stable.
pub type CacheData = BTreeMap<EntityId, CacheEntry>;

/// Cached lookups for one entity.
///
/// `timestamp` is the last write time as ISO-8601 text. It stays a string so a
/// single malformed entry makes only that entry stale instead of failing the
/// whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub searches: BTreeMap<String, String>,
}

impl CacheEntry {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            timestamp: format_timestamp(now),
            searches: BTreeMap::new(),
        }
    }

    /// Slide the expiry window forward.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.timestamp = format_timestamp(now);
    }

    /// Parsed last-write time. Offset-less timestamps are read as UTC.
    pub fn freshness(&self) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Fresh while `now - freshness < ttl`. Unreadable timestamps are stale;
    /// timestamps in the future count as fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match self.freshness() {
            Some(ts) => match now.signed_duration_since(ts).to_std() {
                Ok(age) => age < ttl,
                Err(_) => true,
            },
            None => false,
        }
    }
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
