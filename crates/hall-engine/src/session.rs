//! Session bootstrap - waiting for the store connection at startup

use std::time::Duration;

use tracing::{debug, instrument};

use hall_common::{AppError, AppResult};
use hall_store::RealtimeStore;

/// Wait until the store reports a live connection, bounded by `timeout`.
///
/// Returns immediately when already connected. On timeout the caller gets
/// an error instead of an app stuck on a spinner.
#[instrument(skip(store))]
pub async fn await_ready(store: &dyn RealtimeStore, timeout: Duration) -> AppResult<()> {
    let mut state = store.connection_state();
    if *state.borrow() {
        return Ok(());
    }
    debug!("Waiting for store connection");
    tokio::time::timeout(timeout, async {
        loop {
            if state.changed().await.is_err() {
                // Sender gone; treat as never ready.
                std::future::pending::<()>().await;
            }
            if *state.borrow() {
                return;
            }
        }
    })
    .await
    .map_err(|_| AppError::Timeout("store connection".to_owned()))
}
