//! Escrow Core Types
//!
//! Type definitions for gifts, assets, and refund sweep outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core_types::{Amount, ContractRef, GiftId, PartyRef, TimestampMs, TokenId};

use super::error::EscrowError;
use super::status::GiftStatus;

/// Milliseconds in one day (expiry windows are whole days)
pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Description of the escrowed asset
///
/// A closed tagged union so transfer logic is an exhaustive match, not
/// runtime type inspection. Exactly one variant is active per gift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssetDescriptor {
    /// Native currency, `amount` in smallest units
    Native { amount: Amount },
    /// Fungible token balance on `contract`, `amount` in smallest units
    Fungible { contract: ContractRef, amount: Amount },
    /// Non-fungible token `token_id` on `contract` (always exactly one unit)
    NonFungible { contract: ContractRef, token_id: TokenId },
}

impl AssetDescriptor {
    /// The amount this asset represents, as a unit count
    ///
    /// Non-fungible tokens always count as one unit.
    #[inline]
    pub fn amount(&self) -> Amount {
        match self {
            AssetDescriptor::Native { amount } => *amount,
            AssetDescriptor::Fungible { amount, .. } => *amount,
            AssetDescriptor::NonFungible { .. } => 1,
        }
    }

    /// Validate the descriptor at creation time
    ///
    /// Zero-amount native or fungible gifts are rejected; an NFT is always
    /// a valid single unit.
    pub fn validate(&self) -> Result<(), EscrowError> {
        match self {
            AssetDescriptor::Native { amount } | AssetDescriptor::Fungible { amount, .. } => {
                if *amount == 0 {
                    return Err(EscrowError::InvalidAsset);
                }
                Ok(())
            }
            AssetDescriptor::NonFungible { .. } => Ok(()),
        }
    }

    /// Get human-readable asset kind name
    pub fn kind(&self) -> &'static str {
        match self {
            AssetDescriptor::Native { .. } => "NATIVE",
            AssetDescriptor::Fungible { .. } => "FUNGIBLE",
            AssetDescriptor::NonFungible { .. } => "NON_FUNGIBLE",
        }
    }
}

impl fmt::Display for AssetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetDescriptor::Native { amount } => write!(f, "NATIVE x{}", amount),
            AssetDescriptor::Fungible { contract, amount } => {
                write!(f, "FUNGIBLE[{}] x{}", contract, amount)
            }
            AssetDescriptor::NonFungible { contract, token_id } => {
                write!(f, "NFT[{}] #{}", contract, token_id)
            }
        }
    }
}

/// A single escrowed gift record
///
/// Everything except `status` is fixed at creation. The ledger hands out
/// clones, so holding a `Gift` never grants write access to stored state;
/// the only mutation path is [`GiftLedger::transition`].
///
/// [`GiftLedger::transition`]: super::ledger::GiftLedger::transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gift {
    /// Unique dense id assigned by the ledger
    pub id: GiftId,
    /// Depositing party
    pub sender: PartyRef,
    /// Party entitled to claim
    pub recipient: PartyRef,
    /// Escrowed asset
    pub asset: AssetDescriptor,
    /// Creation timestamp (millis)
    pub created_at: TimestampMs,
    /// End of the claim window, `created_at + expiry_days` (millis)
    pub expires_at: TimestampMs,
    /// Current lifecycle status
    pub status: GiftStatus,
}

impl Gift {
    /// Create a new gift record in OPEN status
    ///
    /// `expiry_days` must already be validated as strictly positive, so
    /// `expires_at > created_at` holds by construction.
    pub fn new(
        id: GiftId,
        sender: PartyRef,
        recipient: PartyRef,
        asset: AssetDescriptor,
        created_at: TimestampMs,
        expiry_days: u32,
    ) -> Self {
        Self {
            id,
            sender,
            recipient,
            asset,
            created_at,
            expires_at: created_at + expiry_days as i64 * MS_PER_DAY,
            status: GiftStatus::Open,
        }
    }

    /// Check whether the claim window `[created_at, expires_at)` has lapsed
    #[inline]
    pub fn is_expired(&self, now: TimestampMs) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Display for Gift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Gift[{}] {} -> {} asset={} status={}",
            self.id, self.sender, self.recipient, self.asset, self.status
        )
    }
}

/// Why an id was skipped by the refund sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Id was never allocated
    NotFound,
    /// Gift is no longer open (already claimed or already refunded)
    NotEligible,
    /// Claim window has not lapsed yet
    NotExpired,
}

/// Per-element outcome of a `refund_expired` batch
///
/// The sweep never aborts on ineligible ids; each element reports its own
/// outcome instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundOutcome {
    /// Gift was refunded, returning `amount` units to the original sender
    Refunded { amount: Amount },
    /// Gift was left untouched
    Skipped(SkipReason),
}

impl RefundOutcome {
    /// Check if this element actually refunded funds
    #[inline]
    pub fn is_refunded(&self) -> bool {
        matches!(self, RefundOutcome::Refunded { .. })
    }

    /// Check if this element was a no-op
    #[inline]
    pub fn is_skipped(&self) -> bool {
        matches!(self, RefundOutcome::Skipped(_))
    }
}
