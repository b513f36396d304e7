//! Escrow Error Types
//!
//! Defines all error types for the escrow module. Error codes are stable
//! strings for consistent API responses.

use thiserror::Error;

use crate::core_types::GiftId;

use super::adapter::TransferError;
use super::status::GiftStatus;

/// Escrow error types
///
/// Creation-time and claim-time errors leave no state behind; callers may
/// retry with corrected input. `PayoutFailed` is the one documented
/// exception: the status flip stays committed and the gift needs manual
/// recovery.
#[derive(Error, Debug, Clone)]
pub enum EscrowError {
    // === Validation Errors (rejected before any side effect) ===
    #[error("Expiry window must be a positive number of days")]
    InvalidExpiry,

    #[error("Asset amount must be greater than zero")]
    InvalidAsset,

    #[error("Recipient must not be the null party")]
    InvalidRecipient,

    #[error("Refund batch must not be empty")]
    EmptyBatch,

    // === Lookup / Authorization Errors ===
    #[error("Gift not found: {0}")]
    NotFound(GiftId),

    #[error("Not recipient")]
    Unauthorized,

    #[error("Claim window has lapsed")]
    Expired,

    // === State Machine Errors ===
    #[error("{}", .actual.denial_reason())]
    InvalidStateTransition {
        /// Status actually stored when the compare-and-set was attempted
        actual: GiftStatus,
    },

    // === Adapter Errors ===
    #[error("Transfer failed: {0}")]
    Transfer(#[from] TransferError),

    /// Payout failed after the status flip was committed.
    ///
    /// The gift stays in its terminal status; reverting would reopen a
    /// double-spend window. Manual recovery required.
    #[error("Payout failed after commit, manual recovery required: {0}")]
    PayoutFailed(TransferError),
}

impl EscrowError {
    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            EscrowError::InvalidExpiry => "INVALID_EXPIRY",
            EscrowError::InvalidAsset => "INVALID_ASSET",
            EscrowError::InvalidRecipient => "INVALID_RECIPIENT",
            EscrowError::EmptyBatch => "EMPTY_BATCH",
            EscrowError::NotFound(_) => "NOT_FOUND",
            EscrowError::Unauthorized => "UNAUTHORIZED",
            EscrowError::Expired => "EXPIRED",
            EscrowError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            EscrowError::Transfer(_) => "TRANSFER_FAILED",
            EscrowError::PayoutFailed(_) => "PAYOUT_FAILED",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            EscrowError::InvalidExpiry
            | EscrowError::InvalidAsset
            | EscrowError::InvalidRecipient
            | EscrowError::EmptyBatch => 400,
            EscrowError::Unauthorized => 403,
            EscrowError::NotFound(_) => 404,
            EscrowError::Expired | EscrowError::InvalidStateTransition { .. } => 409,
            EscrowError::Transfer(_) => 422,
            EscrowError::PayoutFailed(_) => 500,
        }
    }
}
