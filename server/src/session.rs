//! Entity session tracking and liveness expiry for the rendezvous server
//!
//! This module is the authoritative store for everything the server knows
//! about its clients:
//! - Per-entity position state, exactly as reported by `entity` commands
//! - Per-entity liveness, refreshed by every recognized datagram
//! - Stale-entry expiry, bounding the store's size when clients vanish
//!
//! State and liveness live in a single record per entity id, so they are
//! created, updated and removed together. There is never a position
//! without a liveness timestamp or a timestamp without a record.

use log::info;
use shared::Position;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Everything tracked for one entity id
#[derive(Debug, Clone)]
pub struct EntityRecord {
    /// Last reported position; unset until the first `entity` command
    pub position: Option<Position>,
    /// Last time any datagram arrived from this id
    pub last_seen: Instant,
}

impl EntityRecord {
    fn new(now: Instant) -> Self {
        Self {
            position: None,
            last_seen: now,
        }
    }

    /// Returns true once the full expiry window has elapsed since the
    /// last datagram. The boundary counts: `elapsed == window` is stale.
    pub fn is_stale(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) >= window
    }
}

/// Authoritative mapping from entity id to its record
///
/// A plain owned value with no interior mutability: the server loop owns
/// the store and hands it to the dispatcher per datagram, so all access is
/// single-threaded by construction. Time-dependent operations take `now`
/// as an argument, which lets tests manufacture staleness without sleeping.
pub struct SessionStore {
    entities: HashMap<String, EntityRecord>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
        }
    }

    /// Records that `ident` is alive at `now`
    ///
    /// Creates a record with no position on first contact; thereafter only
    /// refreshes the liveness timestamp. Called for every recognized
    /// datagram regardless of its command.
    pub fn touch(&mut self, ident: &str, now: Instant) {
        match self.entities.entry(ident.to_string()) {
            Entry::Occupied(mut entry) => entry.get_mut().last_seen = now,
            Entry::Vacant(entry) => {
                info!("Entity {} connected", ident);
                entry.insert(EntityRecord::new(now));
            }
        }
    }

    /// Sets the position for `ident`, stored verbatim
    ///
    /// The dispatcher always touches before any handler runs, so the id
    /// normally exists already; if not, the record is created at `now` to
    /// keep position and liveness in lockstep.
    pub fn set_position(&mut self, ident: &str, x: &str, y: &str, now: Instant) {
        let record = self
            .entities
            .entry(ident.to_string())
            .or_insert_with(|| EntityRecord::new(now));
        record.position = Some(Position::new(x, y));
    }

    /// Point-in-time view of all positioned entities, sorted by id
    ///
    /// Ids that were touched but never sent an `entity` command are
    /// omitted. Callers must not rely on the order, but sorting makes
    /// replies deterministic and easy to assert on.
    pub fn snapshot(&self) -> Vec<(String, Position)> {
        let mut entries: Vec<(String, Position)> = self
            .entities
            .iter()
            .filter_map(|(ident, record)| {
                record.position.clone().map(|position| (ident.clone(), position))
            })
            .collect();

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Removes every record whose last datagram is at least `window` old
    ///
    /// Returns the number of entities removed, for observability.
    pub fn expire_older_than(&mut self, now: Instant, window: Duration) -> usize {
        let stale: Vec<String> = self
            .entities
            .iter()
            .filter(|(_, record)| record.is_stale(now, window))
            .map(|(ident, _)| ident.clone())
            .collect();

        for ident in &stale {
            self.entities.remove(ident);
            info!("Entity {} timed out", ident);
        }

        stale.len()
    }

    /// Looks up the record for a specific id
    pub fn get(&self, ident: &str) -> Option<&EntityRecord> {
        self.entities.get(ident)
    }

    /// Returns the number of tracked entities, positioned or not
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if no entities are currently tracked
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
