//! Asset Transfer Adapter
//!
//! The capability the core calls to move assets in and out of custody.
//! Transfers are all-or-nothing: either the full described amount moves or
//! none does. The state machine calls each transfer at most once per
//! logical transition and never retries automatically.

use async_trait::async_trait;
use thiserror::Error;

use crate::core_types::PartyRef;

use super::types::AssetDescriptor;

#[cfg(any(test, feature = "mock-vault"))]
use std::collections::HashMap;

#[cfg(any(test, feature = "mock-vault"))]
use crate::core_types::{Amount, ContractRef, TokenId};

/// Transfer failure reported by an adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Asset not held: {0}")]
    AssetNotHeld(String),

    #[error("Transfer rejected: {0}")]
    Rejected(String),

    #[error("Transfer service unavailable: {0}")]
    Unavailable(String),
}

/// Asset transfer capability
///
/// Implementations must be all-or-nothing per call. The core treats a
/// returned error as "no funds moved".
#[async_trait]
pub trait AssetAdapter: Send + Sync {
    /// Get adapter name for logging
    fn name(&self) -> &'static str;

    /// Pull the described asset from `from` into escrow custody
    async fn pull_in(&self, from: PartyRef, asset: &AssetDescriptor) -> Result<(), TransferError>;

    /// Push the described asset out of custody to `to`
    async fn push_out(&self, to: PartyRef, asset: &AssetDescriptor) -> Result<(), TransferError>;
}

/// Storage key for one asset class
#[cfg(any(test, feature = "mock-vault"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum AssetKey {
    Native,
    Fungible(ContractRef),
    NonFungible(ContractRef, TokenId),
}

#[cfg(any(test, feature = "mock-vault"))]
impl AssetKey {
    fn of(asset: &AssetDescriptor) -> Self {
        match asset {
            AssetDescriptor::Native { .. } => AssetKey::Native,
            AssetDescriptor::Fungible { contract, .. } => AssetKey::Fungible(*contract),
            AssetDescriptor::NonFungible { contract, token_id } => {
                AssetKey::NonFungible(*contract, *token_id)
            }
        }
    }
}

/// In-memory vault backing the [`AssetAdapter`] trait
///
/// Tracks party balances and custody holdings per asset class, with call
/// counters and failure injection for exercising the frozen-state paths.
#[cfg(any(test, feature = "mock-vault"))]
#[derive(Debug, Default)]
pub struct InMemoryVault {
    state: std::sync::Mutex<VaultState>,
    pull_in_count: std::sync::atomic::AtomicUsize,
    push_out_count: std::sync::atomic::AtomicUsize,
    fail_pull_in: std::sync::atomic::AtomicBool,
    fail_push_out: std::sync::atomic::AtomicBool,
}

#[cfg(any(test, feature = "mock-vault"))]
#[derive(Debug, Default)]
struct VaultState {
    /// Units held by each party per asset class
    balances: HashMap<(PartyRef, AssetKey), Amount>,
    /// Units held in escrow custody per asset class
    custody: HashMap<AssetKey, Amount>,
}

#[cfg(any(test, feature = "mock-vault"))]
impl InMemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint `asset` into a party's balance (test/demo setup)
    pub fn credit(&self, party: PartyRef, asset: &AssetDescriptor) {
        let mut state = self.state.lock().unwrap();
        *state
            .balances
            .entry((party, AssetKey::of(asset)))
            .or_insert(0) += asset.amount();
    }

    /// Units of `asset`'s class held by `party`
    pub fn balance_of(&self, party: PartyRef, asset: &AssetDescriptor) -> Amount {
        let state = self.state.lock().unwrap();
        state
            .balances
            .get(&(party, AssetKey::of(asset)))
            .copied()
            .unwrap_or(0)
    }

    /// Units of `asset`'s class currently in custody
    pub fn custody_of(&self, asset: &AssetDescriptor) -> Amount {
        let state = self.state.lock().unwrap();
        state
            .custody
            .get(&AssetKey::of(asset))
            .copied()
            .unwrap_or(0)
    }

    /// Total units in custody across all asset classes
    ///
    /// At every quiescent point this must equal the sum over all open
    /// gifts of their asset amounts.
    pub fn custody_total(&self) -> Amount {
        let state = self.state.lock().unwrap();
        state.custody.values().sum()
    }

    pub fn set_fail_pull_in(&self, fail: bool) {
        self.fail_pull_in
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn set_fail_push_out(&self, fail: bool) {
        self.fail_push_out
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn pull_in_count(&self) -> usize {
        self.pull_in_count.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn push_out_count(&self) -> usize {
        self.push_out_count.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "mock-vault"))]
#[async_trait]
impl AssetAdapter for InMemoryVault {
    fn name(&self) -> &'static str {
        "in-memory-vault"
    }

    async fn pull_in(&self, from: PartyRef, asset: &AssetDescriptor) -> Result<(), TransferError> {
        self.pull_in_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if self.fail_pull_in.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(TransferError::Rejected("injected pull_in failure".into()));
        }

        let key = AssetKey::of(asset);
        let units = asset.amount();
        let mut state = self.state.lock().unwrap();

        // Validate before touching anything so a failure moves nothing
        let balance = state.balances.get(&(from, key)).copied().unwrap_or(0);
        if balance < units {
            return Err(TransferError::InsufficientFunds);
        }

        *state.balances.entry((from, key)).or_insert(0) -= units;
        *state.custody.entry(key).or_insert(0) += units;
        Ok(())
    }

    async fn push_out(&self, to: PartyRef, asset: &AssetDescriptor) -> Result<(), TransferError> {
        self.push_out_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if self.fail_push_out.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(TransferError::Unavailable("injected push_out failure".into()));
        }

        let key = AssetKey::of(asset);
        let units = asset.amount();
        let mut state = self.state.lock().unwrap();

        let held = state.custody.get(&key).copied().unwrap_or(0);
        if held < units {
            return Err(TransferError::AssetNotHeld(asset.to_string()));
        }

        *state.custody.entry(key).or_insert(0) -= units;
        *state.balances.entry((to, key)).or_insert(0) += units;
        Ok(())
    }
}
