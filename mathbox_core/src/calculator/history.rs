//! Calculation history: newest first, capped, persisted as one JSON array.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::CalcResult;
use crate::storage::{load_json, store_json, KeyValueStore};

/// Storage key for the persisted history
pub const HISTORY_KEY: &str = "calc-history";

/// Entries kept; older ones fall off the end
pub const MAX_HISTORY: usize = 50;

/// One finished calculation.
///
/// ## JSON Example
///
/// ```json
/// { "expression": "5 + 3", "result": "8", "timestamp": "2025-01-01T12:00:00Z" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub expression: String,
    pub result: String,
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(expression: impl Into<String>, result: impl Into<String>) -> Self {
        HistoryEntry {
            expression: expression.into(),
            result: result.into(),
            timestamp: Utc::now(),
        }
    }

    /// `"5 + 3 = 8"`
    pub fn display(&self) -> String {
        format!("{} = {}", self.expression, self.result)
    }
}

/// Bounded, newest-first list of [`HistoryEntry`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry at the front, dropping the oldest past [`MAX_HISTORY`]
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(MAX_HISTORY);
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Read the persisted history. A missing or unreadable value starts
    /// an empty history rather than failing.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json::<History, _>(store, HISTORY_KEY) {
            Ok(Some(mut history)) => {
                history.entries.truncate(MAX_HISTORY);
                history
            }
            Ok(None) => History::new(),
            Err(e) => {
                warn!(error = %e, "discarding unreadable calculation history");
                History::new()
            }
        }
    }

    /// Write the whole history back under [`HISTORY_KEY`]
    pub fn save(&self, store: &mut dyn KeyValueStore) -> CalcResult<()> {
        store_json(store, HISTORY_KEY, self)
    }
}
