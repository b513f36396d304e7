//! Event Emitter
//!
//! Append-only, totally ordered log of state-change notifications. One
//! event per successful state transition; skipped sweep elements and failed
//! claims never emit. External systems consume the log for reconciliation,
//! e.g. mapping `GiftCreated.id` back to a draft record.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core_types::{Amount, GiftId, PartyRef, SeqNum};

/// State-change notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EscrowEvent {
    /// Asset entered custody for a new open gift
    GiftCreated {
        id: GiftId,
        sender: PartyRef,
        recipient: PartyRef,
        amount: Amount,
    },
    /// Recipient withdrew the asset before expiry
    GiftClaimed {
        id: GiftId,
        recipient: PartyRef,
        amount: Amount,
    },
    /// Expiry sweep returned the asset to the sender
    GiftExpired {
        id: GiftId,
        sender: PartyRef,
        amount: Amount,
    },
}

impl EscrowEvent {
    /// Gift this event refers to
    pub fn gift_id(&self) -> GiftId {
        match self {
            EscrowEvent::GiftCreated { id, .. }
            | EscrowEvent::GiftClaimed { id, .. }
            | EscrowEvent::GiftExpired { id, .. } => *id,
        }
    }

    /// Get human-readable event name
    pub fn kind(&self) -> &'static str {
        match self {
            EscrowEvent::GiftCreated { .. } => "GIFT_CREATED",
            EscrowEvent::GiftClaimed { .. } => "GIFT_CLAIMED",
            EscrowEvent::GiftExpired { .. } => "GIFT_EXPIRED",
        }
    }
}

/// An event with its position in the total order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedEvent {
    pub seq: SeqNum,
    pub event: EscrowEvent,
}

/// Ordered, append-only event log
///
/// Publishing assigns the next sequence number under the log lock, so
/// observers always see a gap-free total order. Entries are never removed.
#[derive(Debug, Default)]
pub struct EventLog {
    entries: Mutex<Vec<SequencedEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, returning its sequence number
    pub fn publish(&self, event: EscrowEvent) -> SeqNum {
        let mut entries = self.entries.lock().unwrap();
        let seq = entries.len() as SeqNum;
        info!(seq = seq, kind = event.kind(), gift_id = event.gift_id(), "Event published");
        entries.push(SequencedEvent { seq, event });
        seq
    }

    /// Copy of the full log in publish order
    pub fn snapshot(&self) -> Vec<SequencedEvent> {
        self.entries.lock().unwrap().clone()
    }

    /// Number of events published so far
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of events referring to `id`
    pub fn count_for(&self, id: GiftId) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.event.gift_id() == id)
            .count()
    }
}
