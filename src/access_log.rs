//! In-memory access log for RouterWatch
//! Keeps the most recent requests, newest first, and derives statistics on demand

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use uuid::Uuid;

/// Number of records kept when no capacity is given.
pub const MAX_CAPACITY: usize = 1000;
/// Page size used by filtered listings when no limit is given.
pub const DEFAULT_LIMIT: usize = 100;
/// User agent stored when the request did not send one.
pub const UNKNOWN_USER_AGENT: &str = "Unknown";

/// One observed request
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccessRecord {
    pub id: Uuid,
    pub source_address: String,
    pub user_agent: String,
    pub path: String,
    pub method: String,
    pub timestamp: DateTime<Utc>,
    pub status: Option<u16>,
    #[serde(rename = "duration")]
    pub duration_ms: Option<u64>,
}

/// Filter and pagination options for [`AccessLog::list_filtered`].
///
/// Every filter is optional and they combine with AND. An empty string
/// counts as not supplied.
#[derive(Clone, Debug, Default)]
pub struct LogQuery {
    /// Exact match on the source address.
    pub source_address: Option<String>,
    /// Case-sensitive substring match on the path.
    pub path_substring: Option<String>,
    /// Exact match on the method token.
    pub method: Option<String>,
    /// Defaults to [`DEFAULT_LIMIT`]; zero also means the default.
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl LogQuery {
    pub fn page(limit: Option<usize>, offset: Option<usize>) -> Self {
        Self {
            limit,
            offset,
            ..Self::default()
        }
    }

    fn matches(&self, record: &AccessRecord) -> bool {
        if let Some(addr) = non_empty(&self.source_address) {
            if record.source_address != addr {
                return false;
            }
        }
        if let Some(fragment) = non_empty(&self.path_substring) {
            if !record.path.contains(fragment) {
                return false;
            }
        }
        if let Some(method) = non_empty(&self.method) {
            if record.method != method {
                return false;
            }
        }
        true
    }

    fn limit(&self) -> usize {
        match self.limit {
            Some(0) | None => DEFAULT_LIMIT,
            Some(n) => n,
        }
    }

    fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Aggregate view over every held record
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccessStats {
    pub total_access: usize,
    pub unique_source_address_count: usize,
    pub method_counts: BTreeMap<String, usize>,
    pub path_counts: BTreeMap<String, usize>,
    pub source_address_counts: BTreeMap<String, usize>,
    pub most_recent_timestamp: Option<DateTime<Utc>>,
}

/// Bounded, newest-first store of access records.
///
/// Shared between request handlers behind an `Arc`; every operation takes the
/// lock for its whole duration so readers always see a consistent snapshot.
pub struct AccessLog {
    records: RwLock<VecDeque<AccessRecord>>,
    capacity: usize,
}

impl Default for AccessLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessLog {
    pub fn new() -> Self {
        Self::with_capacity(MAX_CAPACITY)
    }

    /// Create a store holding at most `capacity` records (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Record a request. The new record becomes the first one listed; if the
    /// store is full the oldest record is dropped.
    pub fn insert(
        &self,
        source_address: &str,
        path: &str,
        method: &str,
        user_agent: Option<&str>,
        status: Option<u16>,
        duration_ms: Option<u64>,
    ) -> AccessRecord {
        let record = AccessRecord {
            id: Uuid::new_v4(),
            source_address: source_address.to_string(),
            user_agent: user_agent.unwrap_or(UNKNOWN_USER_AGENT).to_string(),
            path: path.to_string(),
            method: method.to_string(),
            timestamp: Utc::now(),
            status,
            duration_ms,
        };

        {
            let mut records = self.records.write();
            records.push_front(record.clone());
            if records.len() > self.capacity {
                records.pop_back();
            }
        }

        tracing::debug!(
            method = %record.method,
            path = %record.path,
            source = %record.source_address,
            status = ?record.status,
            "access recorded"
        );
        record
    }

    /// Snapshot of every record, newest first.
    pub fn list_all(&self) -> Vec<AccessRecord> {
        self.records.read().iter().cloned().collect()
    }

    /// Records matching `query`, newest first, after skipping `offset` and
    /// taking at most `limit`.
    pub fn list_filtered(&self, query: &LogQuery) -> Vec<AccessRecord> {
        self.page(query).0
    }

    /// Like [`list_filtered`](Self::list_filtered), also returning the number
    /// of held records from the same snapshot.
    pub fn page(&self, query: &LogQuery) -> (Vec<AccessRecord>, usize) {
        let records = self.records.read();
        let page = records
            .iter()
            .filter(|r| query.matches(r))
            .skip(query.offset())
            .take(query.limit())
            .cloned()
            .collect();
        (page, records.len())
    }

    /// Distinct source addresses, ascending.
    pub fn unique_source_addresses(&self) -> Vec<String> {
        let records = self.records.read();
        let unique: BTreeSet<&str> = records.iter().map(|r| r.source_address.as_str()).collect();
        unique.into_iter().map(str::to_string).collect()
    }

    pub fn stats(&self) -> AccessStats {
        let records = self.records.read();
        let mut stats = AccessStats {
            total_access: records.len(),
            most_recent_timestamp: records.front().map(|r| r.timestamp),
            ..AccessStats::default()
        };

        for record in records.iter() {
            *stats.method_counts.entry(record.method.clone()).or_default() += 1;
            *stats.path_counts.entry(record.path.clone()).or_default() += 1;
            *stats
                .source_address_counts
                .entry(record.source_address.clone())
                .or_default() += 1;
        }
        stats.unique_source_address_count = stats.source_address_counts.len();
        stats
    }

    /// Drop every record. Maintenance only.
    pub fn clear(&self) {
        let removed = {
            let mut records = self.records.write();
            let n = records.len();
            records.clear();
            n
        };
        tracing::info!(removed, "access log cleared");
    }

    /// Pretty-printed JSON array of all records, newest first.
    pub fn export_json(&self) -> serde_json::Result<String> {
        let records = self.records.read();
        serde_json::to_string_pretty(&*records)
    }
}
