//! gift_escrow - Escrowed Gift Ledger and State Machine
//!
//! A small, invariant-heavy transactional core: assets deposited by a
//! sender are held in custody for a named recipient, claimable within a
//! bounded window and swept back to the sender after expiry.
//!
//! # Modules
//!
//! - [`core_types`] - Core type definitions (GiftId, PartyRef, etc.)
//! - [`escrow`] - Ledger, state machine, adapter seam, and event log
//! - [`config`] - YAML application configuration
//! - [`logging`] - tracing subscriber setup

// Core types - must be first!
pub mod core_types;

pub mod config;
pub mod escrow;
pub mod logging;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use core_types::{Amount, ContractRef, GiftId, PartyRef, SeqNum, TimestampMs, TokenId};
pub use escrow::{
    AssetAdapter, AssetDescriptor, Clock, EscrowError, EscrowEvent, EscrowService, EventLog,
    Gift, GiftLedger, GiftStatus, RefundOutcome, SequencedEvent, SkipReason, SystemClock,
    TransferError,
};

#[cfg(any(test, feature = "mock-vault"))]
pub use escrow::{InMemoryVault, SimulatedClock};
