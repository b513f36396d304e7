//! Escrow State Machine
//!
//! Orchestrates authorization, timing checks, and the commit order that
//! makes custody transfer safe against concurrent invocation. This is the
//! central component that drives status transitions.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::core_types::{GiftId, PartyRef};

use super::adapter::AssetAdapter;
use super::clock::Clock;
use super::error::EscrowError;
use super::events::{EscrowEvent, EventLog};
use super::ledger::GiftLedger;
use super::status::GiftStatus;
use super::types::{AssetDescriptor, RefundOutcome, SkipReason};

/// Escrow service - drives the gift state machine
///
/// # Commit ordering
///
/// - `send_gift`: transfer-in happens BEFORE the record becomes visible,
///   so a failed deposit never leaves an observable open gift.
/// - `claim_gift` / `refund_expired`: the status flip is committed BEFORE
///   the payout ("effects before interactions"), so a concurrent second
///   attempt loses the compare-and-set instead of racing the transfer.
pub struct EscrowService {
    ledger: Arc<GiftLedger>,
    adapter: Arc<dyn AssetAdapter>,
    clock: Arc<dyn Clock>,
    events: Arc<EventLog>,
}

impl EscrowService {
    /// Create a service with a fresh ledger and event log
    pub fn new(adapter: Arc<dyn AssetAdapter>, clock: Arc<dyn Clock>) -> Self {
        Self::with_parts(
            Arc::new(GiftLedger::new()),
            adapter,
            clock,
            Arc::new(EventLog::new()),
        )
    }

    /// Create a service over existing ledger and event log handles
    pub fn with_parts(
        ledger: Arc<GiftLedger>,
        adapter: Arc<dyn AssetAdapter>,
        clock: Arc<dyn Clock>,
        events: Arc<EventLog>,
    ) -> Self {
        Self {
            ledger,
            adapter,
            clock,
            events,
        }
    }

    /// The authoritative gift store
    pub fn ledger(&self) -> &Arc<GiftLedger> {
        &self.ledger
    }

    /// The ordered notification log
    pub fn events(&self) -> &Arc<EventLog> {
        &self.events
    }

    /// Escrow an asset from `sender` on behalf of `recipient`
    ///
    /// Validates everything before any side effect, then pulls the asset
    /// into custody, then stores the record. The returned id is strictly
    /// greater than every previously returned id.
    pub async fn send_gift(
        &self,
        sender: PartyRef,
        asset: AssetDescriptor,
        recipient: PartyRef,
        expiry_days: u32,
    ) -> Result<GiftId, EscrowError> {
        if recipient.is_null() {
            return Err(EscrowError::InvalidRecipient);
        }
        if expiry_days == 0 {
            return Err(EscrowError::InvalidExpiry);
        }
        asset.validate()?;

        // Transfer-in before record visibility: if the pull fails, no gift
        // is ever observable and no id is burned.
        self.adapter.pull_in(sender, &asset).await?;

        let now = self.clock.now_ms();
        let id = self.ledger.allocate(sender, recipient, asset, expiry_days, now)?;

        self.events.publish(EscrowEvent::GiftCreated {
            id,
            sender,
            recipient,
            amount: asset.amount(),
        });
        info!(
            gift_id = id,
            sender = %sender,
            recipient = %recipient,
            asset = %asset,
            expiry_days = expiry_days,
            "Gift created"
        );
        Ok(id)
    }

    /// Release the escrowed asset to the gift's recipient
    ///
    /// Only the recorded recipient may claim, and only while the claim
    /// window is open. The status flips to CLAIMED before the payout; if
    /// the payout then fails, the gift stays CLAIMED and the failure is
    /// surfaced as [`EscrowError::PayoutFailed`] for manual recovery.
    pub async fn claim_gift(&self, caller: PartyRef, id: GiftId) -> Result<(), EscrowError> {
        let gift = self.ledger.get(id)?;

        if caller != gift.recipient {
            return Err(EscrowError::Unauthorized);
        }
        if gift.is_expired(self.clock.now_ms()) {
            return Err(EscrowError::Expired);
        }

        // Effects before interactions: commit the flip first so a racing
        // second claim fails the CAS instead of double-paying.
        let gift = self
            .ledger
            .transition(id, GiftStatus::Open, GiftStatus::Claimed)?;

        if let Err(e) = self.adapter.push_out(gift.recipient, &gift.asset).await {
            // Do NOT revert the flip: reopening the gift would reopen the
            // double-spend window. Frozen state, manual recovery.
            error!(
                gift_id = id,
                recipient = %gift.recipient,
                error = %e,
                "Payout failed after claim commit; gift stays CLAIMED pending manual recovery"
            );
            return Err(EscrowError::PayoutFailed(e));
        }

        self.events.publish(EscrowEvent::GiftClaimed {
            id,
            recipient: gift.recipient,
            amount: gift.asset.amount(),
        });
        info!(gift_id = id, recipient = %gift.recipient, "Gift claimed");
        Ok(())
    }

    /// Sweep lapsed gifts back to their senders
    ///
    /// Each id is an independent transaction processed in input order;
    /// ineligible ids are skipped, never aborting the rest. The batch only
    /// fails on malformed input (empty list) or adapter unavailability, in
    /// which case already-processed elements stay durably transitioned.
    pub async fn refund_expired(
        &self,
        ids: &[GiftId],
    ) -> Result<Vec<RefundOutcome>, EscrowError> {
        if ids.is_empty() {
            return Err(EscrowError::EmptyBatch);
        }

        let mut outcomes = Vec::with_capacity(ids.len());
        for &id in ids {
            outcomes.push(self.refund_one(id).await?);
        }
        Ok(outcomes)
    }

    async fn refund_one(&self, id: GiftId) -> Result<RefundOutcome, EscrowError> {
        let gift = match self.ledger.get(id) {
            Ok(gift) => gift,
            Err(_) => {
                debug!(gift_id = id, "Refund sweep: unknown id, skipping");
                return Ok(RefundOutcome::Skipped(SkipReason::NotFound));
            }
        };

        if gift.status != GiftStatus::Open {
            debug!(gift_id = id, status = %gift.status, "Refund sweep: not eligible, skipping");
            return Ok(RefundOutcome::Skipped(SkipReason::NotEligible));
        }
        if !gift.is_expired(self.clock.now_ms()) {
            debug!(gift_id = id, "Refund sweep: not expired yet, skipping");
            return Ok(RefundOutcome::Skipped(SkipReason::NotExpired));
        }

        // Status before transfer, same ordering rationale as claim. A lost
        // race against a concurrent claim or sweep downgrades to a skip.
        let gift = match self
            .ledger
            .transition(id, GiftStatus::Open, GiftStatus::Refunded)
        {
            Ok(gift) => gift,
            Err(EscrowError::InvalidStateTransition { .. }) => {
                return Ok(RefundOutcome::Skipped(SkipReason::NotEligible));
            }
            Err(e) => return Err(e),
        };

        if let Err(e) = self.adapter.push_out(gift.sender, &gift.asset).await {
            error!(
                gift_id = id,
                sender = %gift.sender,
                error = %e,
                "Refund payout failed after commit; gift stays REFUNDED pending manual recovery"
            );
            return Err(EscrowError::PayoutFailed(e));
        }

        let amount = gift.asset.amount();
        self.events.publish(EscrowEvent::GiftExpired {
            id,
            sender: gift.sender,
            amount,
        });
        info!(gift_id = id, sender = %gift.sender, amount = amount, "Gift expired and refunded");
        Ok(RefundOutcome::Refunded { amount })
    }
}
