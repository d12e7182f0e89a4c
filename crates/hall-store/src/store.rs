//! `RealtimeStore` - the port every backend implements
//!
//! The engine talks only to this trait. Per-key `transact` is the sole
//! read-modify-write primitive; plain `write`/`update` are reserved for
//! fields with single-writer semantics where last-writer-wins is acceptable.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::watch;

use crate::error::StoreResult;
use crate::path::TreePath;
use crate::subscription::Subscription;

/// Update closure for [`RealtimeStore::transact`].
///
/// May be invoked more than once if the backend retries on contention, so it
/// must be a pure function of its input. Returning `None` removes the node.
pub type TransactFn = Box<dyn Fn(Option<Value>) -> Option<Value> + Send + Sync>;

/// Hierarchical realtime key-value tree.
#[async_trait]
pub trait RealtimeStore: Send + Sync {
    /// Point read of the node at `path`
    async fn read(&self, path: &TreePath) -> StoreResult<Option<Value>>;

    /// Read the last `limit_last` direct children of `path`, ordered by key
    /// ascending (push-id order is chronological order)
    async fn read_window(
        &self,
        path: &TreePath,
        limit_last: usize,
    ) -> StoreResult<Vec<(String, Value)>>;

    /// Last-writer-wins set of the node at `path`
    async fn write(&self, path: &TreePath, value: Value) -> StoreResult<()>;

    /// Merge-patch the named children of the node at `path`
    async fn update(&self, path: &TreePath, fields: Map<String, Value>) -> StoreResult<()>;

    /// Atomic read-modify-write of the node at `path`. Returns the value
    /// after the transaction.
    async fn transact(&self, path: &TreePath, update: TransactFn) -> StoreResult<Option<Value>>;

    /// Remove the node at `path`
    async fn remove(&self, path: &TreePath) -> StoreResult<()>;

    /// Subscribe to children appearing under `path`. Existing children (the
    /// last `limit_last` of them, or all when unbounded) are replayed as
    /// added events at subscribe time, matching the live-query semantics of
    /// the hosted store.
    async fn subscribe_child_added(
        &self,
        path: &TreePath,
        limit_last: Option<usize>,
    ) -> StoreResult<Subscription>;

    /// Subscribe to mutations of existing children of `path`
    async fn subscribe_child_changed(&self, path: &TreePath) -> StoreResult<Subscription>;

    /// Subscribe to removals of children of `path`
    async fn subscribe_child_removed(&self, path: &TreePath) -> StoreResult<Subscription>;

    /// Register a server-side write performed if this client disappears
    /// without an orderly close
    async fn on_disconnect_set(&self, path: &TreePath, value: Value) -> StoreResult<()>;

    /// Socket connectivity signal; `true` while connected
    fn connection_state(&self) -> watch::Receiver<bool>;
}
