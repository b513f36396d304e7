//! Gift Status Definitions
//!
//! Status IDs are designed for storage as SMALLINT.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Gift lifecycle status
///
/// Terminal states: CLAIMED (1), REFUNDED (2).
/// The only legal edges are `Open -> Claimed` and `Open -> Refunded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum GiftStatus {
    /// Asset is in custody, waiting for the recipient to claim
    Open = 0,

    /// Terminal: recipient withdrew the asset before expiry
    Claimed = 1,

    /// Terminal: expiry sweep returned the asset to the sender
    Refunded = 2,
}

impl GiftStatus {
    /// Check if this is a terminal state (no more transitions possible)
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, GiftStatus::Claimed | GiftStatus::Refunded)
    }

    /// Check whether `from -> to` is a legal status edge
    ///
    /// Everything except `Open -> Claimed` and `Open -> Refunded` is
    /// rejected, including `Open -> Open`.
    pub fn edge_allowed(from: GiftStatus, to: GiftStatus) -> bool {
        matches!(
            (from, to),
            (GiftStatus::Open, GiftStatus::Claimed) | (GiftStatus::Open, GiftStatus::Refunded)
        )
    }

    /// Get the numeric status ID for storage
    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    /// Convert from a stored status ID
    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(GiftStatus::Open),
            1 => Some(GiftStatus::Claimed),
            2 => Some(GiftStatus::Refunded),
            _ => None,
        }
    }

    /// Get human-readable status name
    pub fn as_str(&self) -> &'static str {
        match self {
            GiftStatus::Open => "OPEN",
            GiftStatus::Claimed => "CLAIMED",
            GiftStatus::Refunded => "REFUNDED",
        }
    }

    /// Message surfaced when a transition is refused because the gift is
    /// currently in this status
    pub fn denial_reason(&self) -> &'static str {
        match self {
            GiftStatus::Open => "Gift is still open",
            GiftStatus::Claimed => "Already claimed",
            GiftStatus::Refunded => "Already refunded",
        }
    }
}

impl fmt::Display for GiftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for GiftStatus {
    type Error = ();

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        GiftStatus::from_id(value).ok_or(())
    }
}
