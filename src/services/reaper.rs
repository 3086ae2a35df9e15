//! Post-disclosure deletion and the expired-paste sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::repositories::store::PasteStore;

const BURN_DELETE_ATTEMPTS: u32 = 3;
const BURN_DELETE_BACKOFF: Duration = Duration::from_millis(250);

/// Deletes a burn-after-read paste once its content has been handed off.
///
/// Runs detached so the disclosing response is never delayed. The claim on
/// `has_been_viewed` already hides the paste from later readers, so a
/// delete that keeps failing here leaves an invisible record for the sweep
/// to collect rather than losing the delete-intent.
pub fn schedule_burn(store: Arc<dyn PasteStore>, paste_id: Uuid) {
    tokio::spawn(async move {
        for attempt in 1..=BURN_DELETE_ATTEMPTS {
            match store.delete_paste(paste_id).await {
                Ok(_) => {
                    tracing::debug!("Burn-after-read paste {} deleted", paste_id);
                    return;
                }
                Err(e) if attempt < BURN_DELETE_ATTEMPTS => {
                    tracing::warn!(
                        "Burn delete attempt {} for paste {} failed: {}",
                        attempt,
                        paste_id,
                        e
                    );
                    tokio::time::sleep(BURN_DELETE_BACKOFF).await;
                }
                Err(e) => {
                    tracing::error!("❌ Giving up deleting burned paste {}: {}", paste_id, e);
                }
            }
        }
    });
}

/// Periodically hard-deletes expired pastes.
pub async fn sweep_loop(store: Arc<dyn PasteStore>, interval: Duration) {
    loop {
        tokio::time::sleep(interval).await;
        tracing::info!("🧹 Running scheduled sweep of expired pastes...");
        match store.sweep_expired(Utc::now()).await {
            Ok(removed) => {
                tracing::info!("✅ Sweep removed {} expired pastes", removed);
            }
            Err(e) => {
                tracing::error!("❌ Sweep failed: {}", e);
            }
        }
    }
}
