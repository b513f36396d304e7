//! Gift Escrow Core
//!
//! Escrows an asset deposited by a sender on behalf of a named recipient,
//! releasable only by that recipient within a bounded time window and
//! reclaimable by the sender once the window lapses.
//!
//! # State Machine
//!
//! ```text
//! OPEN --claim(by recipient, before expiry)--> CLAIMED   (terminal)
//! OPEN --refund(by anyone, at/after expiry)--> REFUNDED  (terminal)
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Dense monotonic ids**: allocation is globally serialized; ids are
//!    never reused and never decrease
//! 2. **Single mutation path**: every status change goes through the
//!    ledger's compare-and-set `transition`; racing callers on one id see
//!    exactly one winner
//! 3. **Commit ordering**: transfer-in before record visibility on send;
//!    status flip before payout on claim/refund
//! 4. **Custody conservation**: between operations, units held by the
//!    adapter equal the sum over all OPEN gifts
//! 5. **No reverted commits**: a payout failure after the flip freezes the
//!    gift in its terminal status for manual recovery (reverting would
//!    reopen a double-spend window)

pub mod adapter;
pub mod clock;
pub mod error;
pub mod events;
pub mod ledger;
pub mod service;
pub mod status;
pub mod types;

#[cfg(test)]
mod integration_tests;

// Re-exports for convenience
pub use adapter::{AssetAdapter, TransferError};
pub use clock::{Clock, SystemClock};
pub use error::EscrowError;
pub use events::{EscrowEvent, EventLog, SequencedEvent};
pub use ledger::GiftLedger;
pub use service::EscrowService;
pub use status::GiftStatus;
pub use types::{AssetDescriptor, Gift, RefundOutcome, SkipReason};

#[cfg(any(test, feature = "mock-vault"))]
pub use adapter::InMemoryVault;
#[cfg(any(test, feature = "mock-vault"))]
pub use clock::SimulatedClock;
