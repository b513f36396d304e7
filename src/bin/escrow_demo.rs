//! Escrow demo - full gift lifecycle against the in-memory vault
//!
//! Sends a gift, claims it, lets a second one expire, sweeps it back, and
//! dumps the resulting notification log as JSON.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use gift_escrow::logging::init_logging;
use gift_escrow::{
    AppConfig, AssetDescriptor, EscrowService, InMemoryVault, PartyRef, SimulatedClock,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load_or_default("dev");
    let _guard = init_logging(&config);
    info!(git = env!("GIT_HASH"), "escrow demo starting");

    let vault = Arc::new(InMemoryVault::new());
    let clock = Arc::new(SimulatedClock::from_wall_clock());
    let service = EscrowService::new(vault.clone(), clock.clone());

    let alice = PartyRef::new(1);
    let bob = PartyRef::new(2);
    vault.credit(alice, &AssetDescriptor::Native { amount: 1_000 });

    // Gift 10 units, claimed by the recipient right away
    let claimed = service
        .send_gift(
            alice,
            AssetDescriptor::Native { amount: 10 },
            bob,
            config.escrow.default_expiry_days,
        )
        .await?;
    service.claim_gift(bob, claimed).await?;

    // Gift 3 units with a 1-day window, then let it lapse and sweep it
    let lapsed = service
        .send_gift(alice, AssetDescriptor::Native { amount: 3 }, bob, 1)
        .await?;
    clock.advance_days(2);
    let outcomes = service.refund_expired(&[lapsed]).await?;
    info!(?outcomes, "expiry sweep finished");

    println!(
        "alice={} bob={} custody={}",
        vault.balance_of(alice, &AssetDescriptor::Native { amount: 1 }),
        vault.balance_of(bob, &AssetDescriptor::Native { amount: 1 }),
        vault.custody_total()
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&service.events().snapshot())?
    );
    Ok(())
}
