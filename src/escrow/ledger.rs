//! Gift Ledger
//!
//! Authoritative storage and identifier allocation for gift records.
//! Enforces id density, status monotonicity, and record immutability at
//! the storage boundary. Records are never deleted; terminal records
//! persist for audit.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::core_types::{Amount, GiftId, PartyRef, TimestampMs};

use super::error::EscrowError;
use super::status::GiftStatus;
use super::types::{AssetDescriptor, Gift};

/// Authoritative gift store
///
/// Id allocation is globally serialized through a single counter; record
/// mutation is serialized per gift id by the map's per-key locking. Reads
/// of unrelated gifts never block on another id's mutation.
#[derive(Debug, Default)]
pub struct GiftLedger {
    gifts: DashMap<GiftId, Gift>,
    next_id: AtomicU64,
}

impl GiftLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next id and store a new OPEN record
    ///
    /// Validates the expiry window and the asset; performs no asset
    /// movement. Ids form a dense sequence starting at 0.
    pub fn allocate(
        &self,
        sender: PartyRef,
        recipient: PartyRef,
        asset: AssetDescriptor,
        expiry_days: u32,
        now: TimestampMs,
    ) -> Result<GiftId, EscrowError> {
        if expiry_days == 0 {
            return Err(EscrowError::InvalidExpiry);
        }
        asset.validate()?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let gift = Gift::new(id, sender, recipient, asset, now, expiry_days);
        self.gifts.insert(id, gift);
        Ok(id)
    }

    /// Look up a gift by id
    ///
    /// Returns a clone; stored records are only mutable via
    /// [`transition`](Self::transition).
    pub fn get(&self, id: GiftId) -> Result<Gift, EscrowError> {
        self.gifts
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(EscrowError::NotFound(id))
    }

    /// Atomically move a gift from `from` to `to`
    ///
    /// This compare-and-set is the sole mutation path. Illegal edges fail
    /// closed even when the stored status matches `from`. On a status
    /// mismatch nothing is mutated and the stored status is surfaced in
    /// the error ("Already claimed" / "Already refunded"). Concurrent
    /// callers racing on one id observe exactly one winner.
    pub fn transition(
        &self,
        id: GiftId,
        from: GiftStatus,
        to: GiftStatus,
    ) -> Result<Gift, EscrowError> {
        if !GiftStatus::edge_allowed(from, to) {
            return Err(EscrowError::InvalidStateTransition { actual: from });
        }

        // get_mut holds the shard write lock for this key, making the
        // check-then-set atomic per gift id.
        let mut entry = self.gifts.get_mut(&id).ok_or(EscrowError::NotFound(id))?;
        if entry.status != from {
            return Err(EscrowError::InvalidStateTransition {
                actual: entry.status,
            });
        }
        entry.status = to;
        Ok(entry.value().clone())
    }

    /// Number of gifts ever allocated
    pub fn len(&self) -> usize {
        self.gifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gifts.is_empty()
    }

    /// Sum of asset amounts over all OPEN gifts
    ///
    /// At every quiescent point this equals the units the adapter holds in
    /// custody on behalf of the system.
    pub fn open_total(&self) -> Amount {
        self.gifts
            .iter()
            .filter(|entry| entry.status == GiftStatus::Open)
            .map(|entry| entry.asset.amount())
            .sum()
    }
}
