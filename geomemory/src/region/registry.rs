//! The insertion-ordered set of regions under monitoring.

use chrono::{DateTime, Utc};
use thiserror::Error;
use serde::{Deserialize, Serialize};

use super::model::{MemoryAttributes, MemoryGeofence, Region};

/// Platform-style limit on concurrently monitored regions.
pub const DEFAULT_REGION_CAPACITY: usize = 20;

/// Errors produced by registry mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The monitored set is full and the region is not already present.
    #[error("region capacity of {limit} reached")]
    CapacityExceeded { limit: usize },
}

/// Last observed inside/outside state for a monitored region.
///
/// The sensor collaborator is the source of truth for presence; until it
/// reports a crossing, presence stays `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presence {
    /// No crossing has been observed since registration.
    Unknown,
    /// Last observed event was an entry.
    Inside,
    /// Last observed event was an exit.
    Outside,
}

/// A monitored region with its bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionEntry {
    /// The monitored region.
    pub region: Region,
    /// Memory attributes, present when registered as a memory geofence.
    pub memory: Option<MemoryAttributes>,
    /// Last observed presence.
    pub presence: Presence,
}

impl RegionEntry {
    /// Whether this entry is an expired memory geofence at `now`.
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.memory
            .as_ref()
            .is_some_and(|memory| memory.is_expired_at(now))
    }
}

/// The set of actively monitored regions.
///
/// Maintains insertion order (replacing a region moves it to most-recent),
/// enforces the capacity limit, and guarantees identifier uniqueness. Small
/// by construction — the capacity is a platform-style constant — so a `Vec`
/// with linear scans is the right shape.
#[derive(Debug)]
pub struct RegionRegistry {
    entries: Vec<RegionEntry>,
    capacity: usize,
}

impl Default for RegionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_REGION_CAPACITY)
    }
}

impl RegionRegistry {
    /// Create a registry with the given capacity limit.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Number of currently monitored regions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no regions are monitored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The capacity limit.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether a region with the identifier is currently monitored.
    pub fn contains(&self, identifier: &str) -> bool {
        self.position(identifier).is_some()
    }

    /// Look up an entry by identifier.
    pub fn get(&self, identifier: &str) -> Option<&RegionEntry> {
        self.position(identifier).map(|idx| &self.entries[idx])
    }

    /// Register a region, replacing any prior region with the same identifier.
    ///
    /// Replacement is atomic: the old entry is removed and the new one
    /// appended in one mutation, so the set never transiently holds two
    /// regions with the same identifier. Replacing resets presence to
    /// `Unknown` — the prior observations applied to the old geometry.
    ///
    /// Fails without mutation when the set is full and the identifier is
    /// not already present; a replacement never grows the set, so it is
    /// allowed at capacity.
    pub fn insert(
        &mut self,
        region: Region,
        memory: Option<MemoryAttributes>,
    ) -> Result<Option<RegionEntry>, RegistryError> {
        let existing = self.position(region.identifier());
        if existing.is_none() && self.entries.len() >= self.capacity {
            return Err(RegistryError::CapacityExceeded {
                limit: self.capacity,
            });
        }

        let replaced = existing.map(|idx| self.entries.remove(idx));
        self.entries.push(RegionEntry {
            region,
            memory,
            presence: Presence::Unknown,
        });
        Ok(replaced)
    }

    /// Remove a region by identifier. Idempotent.
    pub fn remove(&mut self, identifier: &str) -> Option<RegionEntry> {
        self.position(identifier)
            .map(|idx| self.entries.remove(idx))
    }

    /// Remove every region, returning the removed entries in order.
    pub fn clear(&mut self) -> Vec<RegionEntry> {
        std::mem::take(&mut self.entries)
    }

    /// Record an observed crossing for a monitored region.
    ///
    /// Returns the region when it is monitored; `None` for unknown
    /// identifiers, which callers drop — this is what makes stale sensor
    /// callbacks after `clear` harmless.
    pub fn mark_presence(&mut self, identifier: &str, presence: Presence) -> Option<Region> {
        let idx = self.position(identifier)?;
        self.entries[idx].presence = presence;
        Some(self.entries[idx].region.clone())
    }

    /// Snapshot of monitored regions in insertion order.
    pub fn snapshot(&self) -> Vec<Region> {
        self.entries.iter().map(|e| e.region.clone()).collect()
    }

    /// Snapshot of the monitored memory geofences in insertion order.
    pub fn memory_geofences(&self) -> Vec<MemoryGeofence> {
        self.entries
            .iter()
            .filter_map(|entry| {
                entry.memory.as_ref().map(|memory| MemoryGeofence {
                    region: entry.region.clone(),
                    attributes: memory.clone(),
                })
            })
            .collect()
    }

    /// Identifiers of memory geofences expired at `now`, in insertion order.
    pub fn expired_identifiers(&self, now: DateTime<Utc>) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.is_expired_at(now))
            .map(|entry| entry.region.identifier().to_string())
            .collect()
    }

    fn position(&self, identifier: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.region.identifier() == identifier)
    }
}
