//! Query cache
//!
//! Owned mapping from query identity to the last response received for it.
//! Views read snapshots from here and, after every mutation, write the
//! server's returned objects back in by id. Nothing is recomputed locally:
//! the returned object replaces the cached one wholesale.
//!
//! Entries are invalidated explicitly; an invalidated entry stays readable
//! but is refetched by the next view that loads it.

use crate::api::{ClientQuery, ReservationUpdate};
use crate::model::{
    ClientRow, CopyTarget, Page, RaceRegistration, RaceSummary, Reservation, Slot, SlotDetail,
    WeekSchedule,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cache shared by every view of one desk session
pub type SharedCache = Arc<RwLock<QueryCache>>;

/// Identity of a cached query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    SlotDetail(i64),
    Week(NaiveDate),
    CopyTargets(i64),
    ClientSearch(ClientQuery),
    RaceSummary(i64),
}

/// Last-known response for a query
#[derive(Debug, Clone, PartialEq)]
pub enum CachedResponse {
    SlotDetail(SlotDetail),
    Week(WeekSchedule),
    CopyTargets(Vec<CopyTarget>),
    ClientSearch(Page<ClientRow>),
    RaceSummary(RaceSummary),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: CachedResponse,
    stale: bool,
}

/// Keyed store of query responses
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CacheEntry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty cache wrapped for sharing between views
    pub fn shared() -> SharedCache {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Store a response, replacing whatever was held for the key
    pub fn insert(&mut self, key: QueryKey, value: CachedResponse) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stale: false,
            },
        );
    }

    pub fn get(&self, key: &QueryKey) -> Option<&CachedResponse> {
        self.entries.get(key).map(|e| &e.value)
    }

    /// Entry that has not been invalidated since it was stored
    pub fn get_fresh(&self, key: &QueryKey) -> Option<&CachedResponse> {
        self.entries
            .get(key)
            .filter(|e| !e.stale)
            .map(|e| &e.value)
    }

    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries.get(key).map(|e| e.stale).unwrap_or(false)
    }

    /// Mark an entry for refetch. Returns false when nothing was held.
    pub fn invalidate(&mut self, key: &QueryKey) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.stale = true;
                true
            }
            None => false,
        }
    }

    // ============ Typed reads ============

    pub fn slot_detail(&self, slot_id: i64) -> Option<&SlotDetail> {
        match self.get(&QueryKey::SlotDetail(slot_id)) {
            Some(CachedResponse::SlotDetail(detail)) => Some(detail),
            _ => None,
        }
    }

    pub fn week(&self, week_start: NaiveDate) -> Option<&WeekSchedule> {
        match self.get(&QueryKey::Week(week_start)) {
            Some(CachedResponse::Week(week)) => Some(week),
            _ => None,
        }
    }

    pub fn race_summary(&self, race_id: i64) -> Option<&RaceSummary> {
        match self.get(&QueryKey::RaceSummary(race_id)) {
            Some(CachedResponse::RaceSummary(summary)) => Some(summary),
            _ => None,
        }
    }

    // ============ Reconciliation ============

    /// Whether any held snapshot contains the slot
    pub fn holds_slot(&self, slot_id: i64) -> bool {
        self.entries.iter().any(|(key, entry)| match (key, &entry.value) {
            (QueryKey::SlotDetail(id), _) => *id == slot_id,
            (_, CachedResponse::Week(week)) => week.slots.iter().any(|s| s.id == slot_id),
            _ => false,
        })
    }

    /// Replace a slot in every snapshot that holds it.
    ///
    /// Slot-detail entries keep their stands and instructor list; only the
    /// slot (with its reservations) is swapped. Returns the number of
    /// snapshots touched.
    pub fn merge_slot(&mut self, slot: &Slot) -> usize {
        let mut touched = 0;

        for entry in self.entries.values_mut() {
            let replaced = match &mut entry.value {
                CachedResponse::SlotDetail(detail) if detail.slot.id == slot.id => {
                    detail.slot = slot.clone();
                    true
                }
                CachedResponse::Week(week) => match week.slots.iter_mut().find(|s| s.id == slot.id)
                {
                    Some(existing) => {
                        *existing = slot.clone();
                        true
                    }
                    None => false,
                },
                _ => false,
            };

            if replaced {
                touched += 1;
            }
        }

        tracing::debug!(slot_id = slot.id, snapshots = touched, "Merged slot into cache");
        touched
    }

    /// Replace a reservation by id in every snapshot of its slot.
    ///
    /// A snapshot that holds the slot but not the reservation is out of date
    /// and gets invalidated instead. Returns the number of snapshots patched.
    pub fn merge_reservation(&mut self, reservation: &Reservation) -> usize {
        let mut touched = 0;

        for entry in self.entries.values_mut() {
            let slot = match &mut entry.value {
                CachedResponse::SlotDetail(detail) if detail.slot.id == reservation.slot_id => {
                    Some(&mut detail.slot)
                }
                CachedResponse::Week(week) => week
                    .slots
                    .iter_mut()
                    .find(|s| s.id == reservation.slot_id),
                _ => None,
            };

            if let Some(slot) = slot {
                if slot.replace_reservation(reservation) {
                        touched += 1;
                } else {
                    tracing::debug!(
                        reservation_id = reservation.id,
                        slot_id = reservation.slot_id,
                        "Reservation missing from cached slot, invalidating"
                    );
                    entry.stale = true;
                }
            }
        }

        touched
    }

    /// Write a reservation patch response back into the cache
    pub fn apply_reservation_update(&mut self, update: &ReservationUpdate) -> usize {
        let mut touched = 0;
        if let Some(slot) = &update.slot {
            touched += self.merge_slot(slot);
        }
        for reservation in update.reservations() {
            touched += self.merge_reservation(reservation);
        }
        touched
    }

    /// Mark every snapshot holding the slot for refetch
    pub fn invalidate_slot(&mut self, slot_id: i64) -> usize {
        let mut invalidated = 0;
        for (key, entry) in self.entries.iter_mut() {
            let holds = match (key, &entry.value) {
                (QueryKey::SlotDetail(id), _) => *id == slot_id,
                (_, CachedResponse::Week(week)) => week.slots.iter().any(|s| s.id == slot_id),
                _ => false,
            };
            if holds {
                entry.stale = true;
                invalidated += 1;
            }
        }
        invalidated
    }

    /// Replace a race registration by id. Returns false when the race
    /// summary is not held or does not list the registration.
    pub fn merge_registration(&mut self, registration: &RaceRegistration) -> bool {
        let key = QueryKey::RaceSummary(registration.race_id);
        match self.entries.get_mut(&key) {
            Some(CacheEntry {
                value: CachedResponse::RaceSummary(summary),
                ..
            }) => summary.replace_registration(registration),
            _ => false,
        }
    }
}
