//! Typing indicator - throttled writes with a writer-side self-clear
//!
//! Two guards keep indicators from sticking: the writer arms a 3 s
//! self-clear on every accepted write, and readers independently ignore
//! entries older than 5 s (`TYPING_STALE_AFTER_SECS`).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::warn;

use hall_common::{AppResult, ChatConfig};
use hall_core::entities::TypingState;
use hall_core::value_objects::{MemberId, RoomId};
use hall_store::{RealtimeStore, TreePath};

use crate::paths;

/// Writer side of one member's typing indicator.
pub struct TypingIndicator {
    store: Arc<dyn RealtimeStore>,
    me: MemberId,
    my_name: String,
    throttle: Duration,
    clear_after: Duration,
    last_write: Mutex<Option<Instant>>,
    clear_task: Mutex<Option<JoinHandle<()>>>,
}

impl TypingIndicator {
    pub fn new(
        store: Arc<dyn RealtimeStore>,
        config: &ChatConfig,
        me: MemberId,
        my_name: String,
    ) -> Self {
        Self {
            store,
            me,
            my_name,
            throttle: Duration::from_millis(config.typing_throttle_ms),
            clear_after: Duration::from_millis(config.typing_clear_ms),
            last_write: Mutex::new(None),
            clear_task: Mutex::new(None),
        }
    }

    /// Note a keystroke in `room`. At most one store write per throttle
    /// interval reaches the tree; each accepted write re-arms the
    /// self-clear timer.
    pub async fn set_typing(&self, room: &RoomId) -> AppResult<()> {
        let now = Instant::now();
        {
            let mut last = self.last_write.lock();
            if last.is_some_and(|at| now.duration_since(at) < self.throttle) {
                return Ok(());
            }
            *last = Some(now);
        }

        let state = TypingState {
            room_id: room.clone(),
            name: self.my_name.clone(),
            timestamp: Utc::now(),
        };
        self.store
            .update(
                &paths::presence(&self.me),
                typing_field(serde_json::to_value(&state)?),
            )
            .await?;

        self.arm_self_clear();
        Ok(())
    }

    /// Clear the indicator immediately and disarm the timer (called on send
    /// and on leaving the room)
    pub async fn clear_typing(&self) -> AppResult<()> {
        self.disarm();
        self.store
            .update(&paths::presence(&self.me), typing_field(Value::Null))
            .await?;
        Ok(())
    }

    fn arm_self_clear(&self) {
        let store = self.store.clone();
        let path = paths::presence(&self.me);
        let delay = self.clear_after;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            clear_typing_at(&store, &path).await;
        });
        if let Some(old) = self.clear_task.lock().replace(task) {
            old.abort();
        }
    }

    fn disarm(&self) {
        if let Some(task) = self.clear_task.lock().take() {
            task.abort();
        }
    }
}

impl Drop for TypingIndicator {
    fn drop(&mut self) {
        self.disarm();
    }
}

async fn clear_typing_at(store: &Arc<dyn RealtimeStore>, path: &TreePath) {
    if let Err(e) = store.update(path, typing_field(Value::Null)).await {
        warn!(path = %path, error = %e, "Typing self-clear failed");
    }
}

fn typing_field(value: Value) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("typing".to_owned(), value);
    fields
}
