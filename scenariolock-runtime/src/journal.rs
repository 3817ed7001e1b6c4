//! Lock activity journal and export
//!
//! The journal is an append-only list of [`LockEvent`]s. Events that change
//! ownership are appended while the registry mutex is held, so the sequence
//! numbers give a total order of acquisitions and releases per resource.

use crate::event::LockEvent;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Append-only event log
#[derive(Debug, Default)]
pub struct Journal {
    enabled: bool,
    inner: Mutex<JournalInner>,
}

#[derive(Debug, Default)]
struct JournalInner {
    next_seq: u64,
    events: Vec<LockEvent>,
}

impl Journal {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            inner: Mutex::new(JournalInner::default()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append the event built from the next sequence number
    pub fn record(&self, build: impl FnOnce(u64) -> LockEvent) {
        if !self.enabled {
            return;
        }

        let mut inner = self.inner.lock();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.events.push(build(seq));
    }

    /// Snapshot of all recorded events
    pub fn events(&self) -> Vec<LockEvent> {
        self.inner.lock().events.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.events.clear();
        inner.next_seq = 0;
    }
}

/// One scenario's hold on one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoldInterval {
    pub resource: String,
    pub scenario: String,
    pub token: u64,
    pub acquired_at: u64,
    /// `None` while still held
    pub released_at: Option<u64>,
}

impl HoldInterval {
    pub fn is_open(&self) -> bool {
        self.released_at.is_none()
    }

    /// Check if two holds on the same resource overlap
    pub fn overlaps_with(&self, other: &HoldInterval) -> bool {
        if self.resource != other.resource {
            return false;
        }

        let self_end = self.released_at.unwrap_or(u64::MAX);
        let other_end = other.released_at.unwrap_or(u64::MAX);

        self.acquired_at < other_end && other.acquired_at < self_end
    }
}

/// Rebuild hold intervals from an event stream
pub fn intervals(events: &[LockEvent]) -> Vec<HoldInterval> {
    let mut open: HashMap<(String, u64), usize> = HashMap::new();
    let mut result: Vec<HoldInterval> = Vec::new();

    for event in events {
        match event {
            LockEvent::Acquired {
                seq,
                scenario,
                token,
                resource,
            } => {
                open.insert((resource.clone(), *token), result.len());
                result.push(HoldInterval {
                    resource: resource.clone(),
                    scenario: scenario.clone(),
                    token: *token,
                    acquired_at: *seq,
                    released_at: None,
                });
            }
            LockEvent::Released {
                seq,
                token,
                resource,
                ..
            } => {
                if let Some(idx) = open.remove(&(resource.clone(), *token)) {
                    result[idx].released_at = Some(*seq);
                }
            }
            _ => {}
        }
    }

    result
}

/// Pairs of holds on the same resource that overlap in time
pub fn find_overlaps(intervals: &[HoldInterval]) -> Vec<(HoldInterval, HoldInterval)> {
    let mut overlaps = Vec::new();

    for (i, a) in intervals.iter().enumerate() {
        for b in &intervals[i + 1..] {
            if a.token != b.token && a.overlaps_with(b) {
                overlaps.push((a.clone(), b.clone()));
            }
        }
    }

    overlaps
}

/// Journal export format
#[derive(Debug, Serialize)]
pub struct JournalExport {
    pub events: Vec<LockEvent>,
    pub intervals: Vec<HoldInterval>,
    pub summary: JournalSummary,
}

/// Export summary
#[derive(Debug, Default, Serialize)]
pub struct JournalSummary {
    pub total_events: usize,
    pub acquisitions: usize,
    pub reentries: usize,
    pub waits: usize,
    pub releases: usize,
    pub release_failures: usize,
    pub timeouts: usize,
    /// Resources some scenario had to wait for
    pub contended_resources: Vec<String>,
}

impl JournalExport {
    pub fn new(events: Vec<LockEvent>) -> Self {
        let mut summary = JournalSummary {
            total_events: events.len(),
            ..Default::default()
        };
        let mut contended = BTreeSet::new();

        for event in &events {
            match event {
                LockEvent::Acquired { .. } => summary.acquisitions += 1,
                LockEvent::Reentered { .. } => summary.reentries += 1,
                LockEvent::Waiting { resource, .. } => {
                    summary.waits += 1;
                    contended.insert(resource.clone());
                }
                LockEvent::Released { .. } => summary.releases += 1,
                LockEvent::ReleaseFailed { .. } => summary.release_failures += 1,
                LockEvent::TimedOut { .. } => summary.timeouts += 1,
                LockEvent::TokenBound { .. } | LockEvent::TokenClosed { .. } => {}
            }
        }
        summary.contended_resources = contended.into_iter().collect();

        JournalExport {
            intervals: intervals(&events),
            events,
            summary,
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
