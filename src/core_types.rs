//! Core types used throughout the escrow system
//!
//! These are fundamental identifier types used by all modules.
//! They provide semantic meaning and enable future type evolution.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Gift ID - globally unique identifier for an escrowed gift.
///
/// # Constraints:
/// - **Immutable**: Once assigned, NEVER changes
/// - **Dense**: Assigned contiguously (0, 1, 2, ...), never reused
/// - **Monotonic**: Every new id is strictly greater than all prior ids
pub type GiftId = u64;

/// Amount in scaled integer units (smallest unit of the asset).
///
/// All money in the system is `u64` in smallest units; conversion to and
/// from display strings is the embedding layer's job.
pub type Amount = u64;

/// Token ID for non-fungible assets - unique within its contract
pub type TokenId = u64;

/// Contract reference - identifies the asset contract a token lives in
pub type ContractRef = u64;

/// Timestamp in milliseconds since the Unix epoch
pub type TimestampMs = i64;

/// Sequence number for event ordering
pub type SeqNum = u64;

/// Party reference - opaque identity of a sender or recipient.
///
/// The zero value is the null party and is never a valid recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartyRef(u64);

impl PartyRef {
    /// The reserved null party (never a valid recipient)
    pub const NULL: PartyRef = PartyRef(0);

    /// Create a party reference from its raw id
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw id value
    #[inline]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// Check whether this is the reserved null party
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PartyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "party:{}", self.0)
    }
}
