//! Operator dashboard (A6): polls the broker's health operation on a fixed
//! interval and writes a text table to the terminal. Read-only — it never
//! calls acquire/release, and it never reads the internal snapshot channel.

pub mod view;

use std::time::Duration;

use broker_client::BrokerClient;
use tokio::sync::watch;
use tracing::warn;

/// Runs until `shutdown` fires, printing a fresh render every `interval`.
pub async fn run(client: BrokerClient, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match client.health().await {
                    Ok(snapshot) => {
                        print!("\x1B[2J\x1B[H{}", view::render(&snapshot));
                    }
                    Err(e) => warn!(error = %e, "dashboard failed to poll broker health"),
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}
