//! In-memory log of recent authentication attempts.
//!
//! Entries are kept newest first, capped by size and pruned by age. Only masked phone
//! numbers are ever stored. Counters are independent of the log and survive pruning.

use crate::relay::{OutcomeKind, VerificationOutcome, mask_msisdn};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::{
    collections::VecDeque,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};
use tracing::{debug, info};
use utoipa::ToSchema;

/// Lower bound for the configured log size.
pub const MIN_EVENT_LOG_SIZE: usize = 100;
/// Absolute upper bound for the configured log size.
pub const HARD_MAX_EVENT_LOG_SIZE: usize = 50_000;

const PRUNE_INTERVAL: u64 = 50;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventEntry {
    pub phone_number: String,
    pub outcome: OutcomeKind,
    pub response_code: Option<String>,
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_attempts: u64,
    pub total_success: u64,
    pub total_rejected: u64,
    pub total_timeout: u64,
    pub total_errors: u64,
    pub event_log_size: usize,
    pub event_log_max_size: usize,
    pub event_ttl_hours: u64,
}

#[derive(Debug, Default)]
struct Counters {
    attempts: AtomicU64,
    success: AtomicU64,
    rejected: AtomicU64,
    timeout: AtomicU64,
    errors: AtomicU64,
}

#[derive(Debug)]
pub struct EventLog {
    entries: Mutex<VecDeque<EventEntry>>,
    max_size: AtomicUsize,
    ttl_hours: AtomicU64,
    counters: Counters,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(
            crate::cli::globals::DEFAULT_EVENT_LOG_MAX_SIZE,
            crate::cli::globals::DEFAULT_EVENT_TTL_HOURS,
        )
    }
}

impl EventLog {
    #[must_use]
    pub fn new(max_size: usize, ttl_hours: u64) -> Self {
        let log = Self {
            entries: Mutex::new(VecDeque::new()),
            max_size: AtomicUsize::new(MIN_EVENT_LOG_SIZE),
            ttl_hours: AtomicU64::new(1),
            counters: Counters::default(),
        };
        log.apply_config(max_size, ttl_hours);
        log
    }

    /// Update size and age limits. Sizes are clamped to
    /// `[MIN_EVENT_LOG_SIZE, HARD_MAX_EVENT_LOG_SIZE]`, the TTL to at least one hour.
    pub fn apply_config(&self, max_size: usize, ttl_hours: u64) {
        let max_size = max_size.clamp(MIN_EVENT_LOG_SIZE, HARD_MAX_EVENT_LOG_SIZE);
        self.max_size.store(max_size, Ordering::Relaxed);
        self.ttl_hours.store(ttl_hours.max(1), Ordering::Relaxed);

        let mut entries = self.lock();
        entries.truncate(max_size);
    }

    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn ttl_hours(&self) -> u64 {
        self.ttl_hours.load(Ordering::Relaxed)
    }

    /// Record the outcome of an attempt for `phone`. The number is masked before storage.
    pub fn record(
        &self,
        phone: &str,
        outcome: &VerificationOutcome,
        ip_address: Option<String>,
        duration_ms: u64,
    ) {
        let kind = outcome.kind();
        let entry = EventEntry {
            phone_number: mask_msisdn(phone),
            outcome: kind,
            response_code: outcome.code().map(str::to_string),
            ip_address,
            timestamp: Utc::now(),
            duration_ms,
            error_message: outcome.error_message().map(str::to_string),
        };
        self.push(entry);

        let attempts = self.counters.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        let counter = match kind {
            OutcomeKind::Success => &self.counters.success,
            OutcomeKind::Rejected => &self.counters.rejected,
            OutcomeKind::Timeout => &self.counters.timeout,
            OutcomeKind::Error => &self.counters.errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if attempts % PRUNE_INTERVAL == 0 {
            self.prune_old_events();
        }
    }

    fn push(&self, entry: EventEntry) {
        let max_size = self.max_size();
        let mut entries = self.lock();
        entries.push_front(entry);
        entries.truncate(max_size);
    }

    /// Most recent entries, newest first.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<EventEntry> {
        self.lock().iter().take(limit).cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop entries older than the TTL. Returns the number of entries removed.
    pub fn prune_old_events(&self) -> usize {
        let ttl_hours = i64::try_from(self.ttl_hours()).unwrap_or(i64::MAX);
        let Some(cutoff) = ChronoDuration::try_hours(ttl_hours)
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        else {
            return 0;
        };
        self.prune_before(cutoff)
    }

    fn prune_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut pruned = 0;
        let mut entries = self.lock();
        while entries
            .back()
            .is_some_and(|entry| entry.timestamp < cutoff)
        {
            entries.pop_back();
            pruned += 1;
        }
        drop(entries);

        if pruned > 0 {
            debug!("Pruned {} expired event log entries", pruned);
        }
        pruned
    }

    #[must_use]
    pub fn stats(&self) -> Stats {
        Stats {
            total_attempts: self.counters.attempts.load(Ordering::Relaxed),
            total_success: self.counters.success.load(Ordering::Relaxed),
            total_rejected: self.counters.rejected.load(Ordering::Relaxed),
            total_timeout: self.counters.timeout.load(Ordering::Relaxed),
            total_errors: self.counters.errors.load(Ordering::Relaxed),
            event_log_size: self.len(),
            event_log_max_size: self.max_size(),
            event_ttl_hours: self.ttl_hours(),
        }
    }

    pub fn reset_stats(&self) {
        for counter in [
            &self.counters.attempts,
            &self.counters.success,
            &self.counters.rejected,
            &self.counters.timeout,
            &self.counters.errors,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        info!("Statistics counters reset");
    }

    pub fn clear(&self) {
        self.lock().clear();
        info!("Event log cleared");
    }

    // A panic while holding the lock cannot leave the deque inconsistent.
    fn lock(&self) -> MutexGuard<'_, VecDeque<EventEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
