//! Integration Tests for the Escrow State Machine
//!
//! These tests drive the full send/claim/refund flow against the in-memory
//! vault and the simulated clock to verify commit ordering, custody
//! conservation, and batch sweep semantics.

use std::sync::Arc;

use crate::core_types::{Amount, PartyRef};
use crate::escrow::adapter::{InMemoryVault, TransferError};
use crate::escrow::clock::SimulatedClock;
use crate::escrow::error::EscrowError;
use crate::escrow::events::EscrowEvent;
use crate::escrow::service::EscrowService;
use crate::escrow::status::GiftStatus;
use crate::escrow::types::{AssetDescriptor, RefundOutcome, SkipReason};

/// Helper wiring a service to a vault and a simulated clock
struct TestHarness {
    service: Arc<EscrowService>,
    vault: Arc<InMemoryVault>,
    clock: Arc<SimulatedClock>,
    alice: PartyRef,
    bob: PartyRef,
}

impl TestHarness {
    fn new() -> Self {
        let vault = Arc::new(InMemoryVault::new());
        let clock = Arc::new(SimulatedClock::new(0));
        let service = Arc::new(EscrowService::new(vault.clone(), clock.clone()));
        Self {
            service,
            vault,
            clock,
            alice: PartyRef::new(1001),
            bob: PartyRef::new(1002),
        }
    }

    /// Mint native funds for alice
    fn fund_alice(&self, amount: Amount) {
        self.vault.credit(self.alice, &native(amount));
    }

    fn alice_balance(&self) -> Amount {
        self.vault.balance_of(self.alice, &native(1))
    }

    fn bob_balance(&self) -> Amount {
        self.vault.balance_of(self.bob, &native(1))
    }

    /// Custody conservation: adapter holdings equal the sum over open gifts
    fn assert_custody_conserved(&self) {
        assert_eq!(
            self.vault.custody_total(),
            self.service.ledger().open_total(),
            "custody out of sync with open gifts"
        );
    }
}

fn native(amount: Amount) -> AssetDescriptor {
    AssetDescriptor::Native { amount }
}

// ============================================================================
// Send
// ============================================================================

/// Sending escrows the asset and emits GiftCreated with dense ids
#[tokio::test]
async fn test_send_gift_happy_path() {
    let h = TestHarness::new();
    h.fund_alice(100);

    let id = h
        .service
        .send_gift(h.alice, native(10), h.bob, 7)
        .await
        .unwrap();
    assert_eq!(id, 0);

    let gift = h.service.ledger().get(id).unwrap();
    assert_eq!(gift.status, GiftStatus::Open);
    assert_eq!(gift.sender, h.alice);
    assert_eq!(gift.recipient, h.bob);
    assert_eq!(h.alice_balance(), 90);
    assert_eq!(h.vault.custody_total(), 10);
    h.assert_custody_conserved();

    let events = h.service.events().snapshot();
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].event,
        EscrowEvent::GiftCreated {
            id: 0,
            sender: h.alice,
            recipient: h.bob,
            amount: 10,
        }
    );

    // Ids keep increasing strictly
    let id2 = h
        .service
        .send_gift(h.alice, native(5), h.bob, 7)
        .await
        .unwrap();
    assert!(id2 > id);
    assert_eq!(id2, 1);
}

/// A failed deposit never leaves an observable gift or burns an id
#[tokio::test]
async fn test_send_gift_pull_in_failure_rolls_back() {
    let h = TestHarness::new();
    h.fund_alice(100);

    h.vault.set_fail_pull_in(true);
    let result = h.service.send_gift(h.alice, native(10), h.bob, 7).await;
    assert!(matches!(result, Err(EscrowError::Transfer(_))));

    assert!(h.service.ledger().is_empty());
    assert!(h.service.events().is_empty());
    assert_eq!(h.alice_balance(), 100);

    // Next successful send still gets id 0
    h.vault.set_fail_pull_in(false);
    let id = h
        .service
        .send_gift(h.alice, native(10), h.bob, 7)
        .await
        .unwrap();
    assert_eq!(id, 0);
}

/// Insufficient sender funds surface as a transfer error with no state
#[tokio::test]
async fn test_send_gift_insufficient_funds() {
    let h = TestHarness::new();
    h.fund_alice(5);

    let result = h.service.send_gift(h.alice, native(10), h.bob, 7).await;
    assert!(matches!(
        result,
        Err(EscrowError::Transfer(TransferError::InsufficientFunds))
    ));
    assert!(h.service.ledger().is_empty());
    h.assert_custody_conserved();
}

// ============================================================================
// Claim
// ============================================================================

/// Recipient claims an open, unexpired gift exactly once
#[tokio::test]
async fn test_claim_happy_path() {
    let h = TestHarness::new();
    h.fund_alice(100);
    let id = h
        .service
        .send_gift(h.alice, native(10), h.bob, 7)
        .await
        .unwrap();

    h.service.claim_gift(h.bob, id).await.unwrap();

    assert_eq!(h.service.ledger().get(id).unwrap().status, GiftStatus::Claimed);
    assert_eq!(h.bob_balance(), 10);
    assert_eq!(h.vault.custody_total(), 0);
    assert_eq!(h.vault.push_out_count(), 1);
    h.assert_custody_conserved();

    let events = h.service.events().snapshot();
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[1].event,
        EscrowEvent::GiftClaimed {
            id,
            recipient: h.bob,
            amount: 10,
        }
    );
}

/// Claims by anyone but the recorded recipient are refused unchanged
#[tokio::test]
async fn test_claim_by_non_recipient_unauthorized() {
    let h = TestHarness::new();
    h.fund_alice(100);
    let id = h
        .service
        .send_gift(h.alice, native(10), h.bob, 7)
        .await
        .unwrap();

    let other = PartyRef::new(9999);
    let result = h.service.claim_gift(other, id).await;
    assert!(matches!(result, Err(EscrowError::Unauthorized)));
    assert_eq!(result.unwrap_err().to_string(), "Not recipient");

    // Sender cannot claim either
    let result = h.service.claim_gift(h.alice, id).await;
    assert!(matches!(result, Err(EscrowError::Unauthorized)));

    assert_eq!(h.service.ledger().get(id).unwrap().status, GiftStatus::Open);
    assert_eq!(h.vault.push_out_count(), 0);
}

/// Claims at or after the expiry instant are refused
#[tokio::test]
async fn test_claim_after_expiry_rejected() {
    let h = TestHarness::new();
    h.fund_alice(100);
    let id = h
        .service
        .send_gift(h.alice, native(10), h.bob, 1)
        .await
        .unwrap();

    h.clock.advance_days(1);
    let result = h.service.claim_gift(h.bob, id).await;
    assert!(matches!(result, Err(EscrowError::Expired)));
    assert_eq!(h.service.ledger().get(id).unwrap().status, GiftStatus::Open);
    h.assert_custody_conserved();
}

/// A second claim fails the CAS and never transfers twice
#[tokio::test]
async fn test_double_claim_rejected() {
    let h = TestHarness::new();
    h.fund_alice(100);
    let id = h
        .service
        .send_gift(h.alice, native(10), h.bob, 7)
        .await
        .unwrap();

    h.service.claim_gift(h.bob, id).await.unwrap();
    let result = h.service.claim_gift(h.bob, id).await;

    assert!(matches!(
        result,
        Err(EscrowError::InvalidStateTransition {
            actual: GiftStatus::Claimed
        })
    ));
    assert_eq!(result.unwrap_err().to_string(), "Already claimed");
    assert_eq!(h.vault.push_out_count(), 1);
    assert_eq!(h.bob_balance(), 10);
}

/// Claiming an unknown id is NotFound
#[tokio::test]
async fn test_claim_unknown_id() {
    let h = TestHarness::new();
    let result = h.service.claim_gift(h.bob, 42).await;
    assert!(matches!(result, Err(EscrowError::NotFound(42))));
}

/// Payout failure after the flip leaves the gift frozen in CLAIMED
#[tokio::test]
async fn test_claim_payout_failure_freezes_gift() {
    let h = TestHarness::new();
    h.fund_alice(100);
    let id = h
        .service
        .send_gift(h.alice, native(10), h.bob, 7)
        .await
        .unwrap();

    h.vault.set_fail_push_out(true);
    let result = h.service.claim_gift(h.bob, id).await;
    assert!(matches!(result, Err(EscrowError::PayoutFailed(_))));

    // Status stays CLAIMED, no claim event, no funds moved
    assert_eq!(h.service.ledger().get(id).unwrap().status, GiftStatus::Claimed);
    assert_eq!(h.service.events().count_for(id), 1); // only GiftCreated
    assert_eq!(h.bob_balance(), 0);

    // The frozen gift is fenced off: retries fail the CAS, the sweep skips
    h.vault.set_fail_push_out(false);
    let result = h.service.claim_gift(h.bob, id).await;
    assert!(matches!(
        result,
        Err(EscrowError::InvalidStateTransition { .. })
    ));
    h.clock.advance_days(10);
    let outcomes = h.service.refund_expired(&[id]).await.unwrap();
    assert_eq!(outcomes, vec![RefundOutcome::Skipped(SkipReason::NotEligible)]);
}

// ============================================================================
// Refund sweep
// ============================================================================

/// Before the window lapses the sweep skips; after, it refunds the sender
#[tokio::test]
async fn test_refund_respects_expiry_window() {
    let h = TestHarness::new();
    h.fund_alice(100);
    let id = h
        .service
        .send_gift(h.alice, native(3), h.bob, 1)
        .await
        .unwrap();
    assert_eq!(h.alice_balance(), 97);

    let outcomes = h.service.refund_expired(&[id]).await.unwrap();
    assert_eq!(outcomes, vec![RefundOutcome::Skipped(SkipReason::NotExpired)]);
    assert_eq!(h.vault.push_out_count(), 0);

    h.clock.advance_days(2);
    let outcomes = h.service.refund_expired(&[id]).await.unwrap();
    assert_eq!(outcomes, vec![RefundOutcome::Refunded { amount: 3 }]);
    assert_eq!(h.alice_balance(), 100);
    assert_eq!(h.service.ledger().get(id).unwrap().status, GiftStatus::Refunded);
    h.assert_custody_conserved();
}

/// Re-sweeping a refunded id is a silent no-op with no second event
#[tokio::test]
async fn test_refund_is_idempotent_no_duplicate_event() {
    let h = TestHarness::new();
    h.fund_alice(100);
    let id = h
        .service
        .send_gift(h.alice, native(3), h.bob, 1)
        .await
        .unwrap();
    h.clock.advance_days(2);

    h.service.refund_expired(&[id]).await.unwrap();
    let events_before = h.service.events().len();

    let outcomes = h.service.refund_expired(&[id]).await.unwrap();
    assert_eq!(outcomes, vec![RefundOutcome::Skipped(SkipReason::NotEligible)]);
    assert_eq!(h.service.events().len(), events_before);
    assert_eq!(h.alice_balance(), 100); // no double refund
}

/// One batch: claimed and refunded ids skip while the valid one refunds
#[tokio::test]
async fn test_refund_batch_tolerates_ineligible_ids() {
    let h = TestHarness::new();
    h.fund_alice(100);

    let claimed = h
        .service
        .send_gift(h.alice, native(2), h.bob, 7)
        .await
        .unwrap();
    h.service.claim_gift(h.bob, claimed).await.unwrap();

    let refunded = h
        .service
        .send_gift(h.alice, native(2), h.bob, 1)
        .await
        .unwrap();
    let valid = h
        .service
        .send_gift(h.alice, native(4), h.bob, 1)
        .await
        .unwrap();

    h.clock.advance_days(2);
    h.service.refund_expired(&[refunded]).await.unwrap();
    let expired_events = h.service.events().count_for(refunded);

    let outcomes = h
        .service
        .refund_expired(&[claimed, refunded, valid, 999])
        .await
        .unwrap();
    assert_eq!(
        outcomes,
        vec![
            RefundOutcome::Skipped(SkipReason::NotEligible),
            RefundOutcome::Skipped(SkipReason::NotEligible),
            RefundOutcome::Refunded { amount: 4 },
            RefundOutcome::Skipped(SkipReason::NotFound),
        ]
    );

    // No second GiftExpired for the already-refunded id
    assert_eq!(h.service.events().count_for(refunded), expired_events);
    h.assert_custody_conserved();
}

// ============================================================================
// Concurrency
// ============================================================================

/// Racing claims on one id: exactly one winner, exactly one payout
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_single_winner() {
    let h = TestHarness::new();
    h.fund_alice(100);
    let id = h
        .service
        .send_gift(h.alice, native(10), h.bob, 7)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = Arc::clone(&h.service);
        let bob = h.bob;
        handles.push(tokio::spawn(
            async move { service.claim_gift(bob, id).await },
        ));
    }

    let mut wins = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            wins += 1;
        }
    }

    assert_eq!(wins, 1);
    assert_eq!(h.vault.push_out_count(), 1);
    assert_eq!(h.bob_balance(), 10);
}

/// Racing expiry sweeps on one id: funds move exactly once
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_sweeps_single_refund() {
    let h = TestHarness::new();
    h.fund_alice(100);

    let id = h
        .service
        .send_gift(h.alice, native(10), h.bob, 1)
        .await
        .unwrap();
    h.clock.advance_days(1);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&h.service);
        handles.push(tokio::spawn(async move {
            service.refund_expired(&[id]).await.unwrap()
        }));
    }

    let mut refunds = 0;
    for handle in handles {
        let outcomes = handle.await.unwrap();
        if outcomes[0].is_refunded() {
            refunds += 1;
        }
    }

    assert_eq!(refunds, 1);
    assert_eq!(h.alice_balance(), 100);
    assert_eq!(h.service.events().count_for(id), 2); // created + expired
}

// ============================================================================
// Asset classes
// ============================================================================

/// Fungible token gifts move through the same lifecycle
#[tokio::test]
async fn test_fungible_token_gift() {
    let h = TestHarness::new();
    let token = AssetDescriptor::Fungible {
        contract: 55,
        amount: 200,
    };
    h.vault.credit(h.alice, &token);

    let id = h.service.send_gift(h.alice, token, h.bob, 7).await.unwrap();
    assert_eq!(h.vault.custody_of(&token), 200);

    h.service.claim_gift(h.bob, id).await.unwrap();
    assert_eq!(h.vault.balance_of(h.bob, &token), 200);
    assert_eq!(h.vault.custody_of(&token), 0);
}

/// NFT gifts escrow and refund the single unit
#[tokio::test]
async fn test_nft_gift_refund() {
    let h = TestHarness::new();
    let nft = AssetDescriptor::NonFungible {
        contract: 77,
        token_id: 12,
    };
    h.vault.credit(h.alice, &nft);

    let id = h.service.send_gift(h.alice, nft, h.bob, 1).await.unwrap();
    assert_eq!(h.vault.custody_of(&nft), 1);

    h.clock.advance_days(2);
    let outcomes = h.service.refund_expired(&[id]).await.unwrap();
    assert_eq!(outcomes, vec![RefundOutcome::Refunded { amount: 1 }]);
    assert_eq!(h.vault.balance_of(h.alice, &nft), 1);
}
