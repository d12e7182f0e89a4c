//! # hall-store
//!
//! Abstraction over the hosted realtime data store: a hierarchical key-value
//! tree with point reads, last-N windowed reads, incremental child
//! subscriptions, atomic per-key transactions, and a server-side
//! on-disconnect hook. [`MemoryStore`] is the in-process backend used by
//! tests and local runs; production deployments plug the vendor client in
//! behind the same [`RealtimeStore`] trait.

pub mod error;
pub mod memory;
pub mod path;
pub mod store;
pub mod subscription;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use path::TreePath;
pub use store::{RealtimeStore, TransactFn};
pub use subscription::{ChildEvent, ChildEventKind, Subscription};
