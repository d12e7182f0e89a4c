//! In-memory realtime store backend
//!
//! Single-process stand-in for the hosted store: same tree semantics, same
//! subscription behavior, plus test hooks for simulating socket loss. Every
//! mutation, including the read-modify-write inside `transact`, runs under
//! one write lock; the closure contract (may run more than once) still
//! applies to callers so real backends can retry on contention.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};
use tokio::sync::{mpsc, watch};
use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::path::TreePath;
use crate::store::{RealtimeStore, TransactFn};
use crate::subscription::{ChildEvent, ChildEventKind, Subscription};

/// Mutation applied to one node.
enum Op {
    Set(Value),
    Merge(Map<String, Value>),
    Remove,
}

/// One registered child-event listener.
struct SubscriberEntry {
    id: u64,
    kind: ChildEventKind,
    tx: mpsc::UnboundedSender<ChildEvent>,
}

type SubscriberMap = DashMap<String, Vec<SubscriberEntry>>;

/// In-memory tree store.
pub struct MemoryStore {
    tree: RwLock<Value>,
    subscribers: Arc<SubscriberMap>,
    next_sub_id: AtomicU64,
    disconnect_writes: Mutex<Vec<(TreePath, Value)>>,
    connected: watch::Sender<bool>,
}

impl MemoryStore {
    /// Create an empty store in the connected state
    pub fn new() -> Self {
        let (connected, _) = watch::channel(true);
        Self {
            tree: RwLock::new(Value::Object(Map::new())),
            subscribers: Arc::new(DashMap::new()),
            next_sub_id: AtomicU64::new(1),
            disconnect_writes: Mutex::new(Vec::new()),
            connected,
        }
    }

    /// Test hook: drop the "socket", firing registered on-disconnect writes
    /// server-side and flipping the connection signal to offline.
    pub fn simulate_disconnect(&self) {
        self.connected.send_replace(false);
        let writes = std::mem::take(&mut *self.disconnect_writes.lock());
        for (path, value) in writes {
            // Dead-man writes are applied by the server, not the client.
            if let Err(err) = self.mutate(&path, Op::Set(value)) {
                trace!(%path, %err, "on-disconnect write skipped");
            }
        }
    }

    /// Test hook: bring the "socket" back up.
    pub fn simulate_reconnect(&self) {
        self.connected.send_replace(true);
    }

    /// Apply a mutation and fan out child events along the ancestor chain.
    fn mutate(&self, path: &TreePath, op: Op) -> StoreResult<Option<Value>> {
        if path.is_root() {
            return Err(StoreError::InvalidPath("cannot mutate the root".into()));
        }
        let (result, notifications) = {
            let mut tree = self.tree.write();
            self.apply(&mut tree, path, op)?
        };
        for (parent, kind, event) in notifications {
            self.dispatch(&parent, kind, &event);
        }
        Ok(result)
    }

    /// Apply `op` to a caller-held tree and collect the child events it
    /// produces. Callers dispatch the events after releasing the lock.
    fn apply(
        &self,
        tree: &mut Value,
        path: &TreePath,
        op: Op,
    ) -> StoreResult<(Option<Value>, Vec<(String, ChildEventKind, ChildEvent)>)> {
        let segments: Vec<&str> = path.segments().collect();

        // Existence along the chain before the mutation, and the old
        // target value (needed for removal events; ancestors are never
        // pruned, so only the target itself can disappear).
        let mut existed_before = Vec::with_capacity(segments.len());
        {
            let mut node = Some(&*tree);
            for seg in &segments {
                node = node.and_then(|v| v.get(seg));
                existed_before.push(node.is_some());
            }
        }
        let old_target = get_at(tree, &segments).cloned();

        match op {
            Op::Set(value) => set_at(tree, &segments, value),
            Op::Merge(fields) => merge_at(tree, &segments, fields, path)?,
            Op::Remove => remove_at(tree, &segments),
        }

        let mut notifications: Vec<(String, ChildEventKind, ChildEvent)> = Vec::new();
        for depth in 0..segments.len() {
            let parent = segments[..depth].join("/");
            if !self.subscribers.contains_key(&parent) {
                continue;
            }
            let key = segments[depth].to_owned();
            let current = get_at(tree, &segments[..=depth]).cloned();
            let (kind, value) = match (existed_before[depth], current) {
                (false, Some(value)) => (ChildEventKind::Added, value),
                (true, Some(value)) => (ChildEventKind::Changed, value),
                (true, None) => (
                    ChildEventKind::Removed,
                    old_target.clone().unwrap_or(Value::Null),
                ),
                (false, None) => continue,
            };
            notifications.push((parent, kind, ChildEvent { key, value }));
        }

        Ok((get_at(tree, &segments).cloned(), notifications))
    }

    /// Deliver one event to matching listeners, pruning closed channels.
    fn dispatch(&self, parent: &str, kind: ChildEventKind, event: &ChildEvent) {
        if let Some(mut entries) = self.subscribers.get_mut(parent) {
            entries.retain(|sub| sub.kind != kind || sub.tx.send(event.clone()).is_ok());
        }
    }

    /// Register a listener and build its drop-detach subscription.
    fn register(
        &self,
        path: &TreePath,
        kind: ChildEventKind,
        tx: mpsc::UnboundedSender<ChildEvent>,
        rx: mpsc::UnboundedReceiver<ChildEvent>,
    ) -> Subscription {
        let id = self.next_sub_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .entry(path.as_str().to_owned())
            .or_default()
            .push(SubscriberEntry { id, kind, tx });

        let registry = Arc::clone(&self.subscribers);
        let key = path.as_str().to_owned();
        Subscription::new(
            rx,
            Box::new(move || {
                if let Some(mut entries) = registry.get_mut(&key) {
                    entries.retain(|sub| sub.id != id);
                }
            }),
        )
    }

    /// Sorted direct children of the node at `path`.
    fn children_of(&self, path: &TreePath) -> Vec<(String, Value)> {
        let tree = self.tree.read();
        let segments: Vec<&str> = path.segments().collect();
        match get_at(&tree, &segments) {
            Some(Value::Object(map)) => {
                let mut children: Vec<(String, Value)> =
                    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                children.sort_by(|a, b| a.0.cmp(&b.0));
                children
            }
            _ => Vec::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeStore for MemoryStore {
    async fn read(&self, path: &TreePath) -> StoreResult<Option<Value>> {
        let tree = self.tree.read();
        let segments: Vec<&str> = path.segments().collect();
        Ok(get_at(&tree, &segments).cloned())
    }

    async fn read_window(
        &self,
        path: &TreePath,
        limit_last: usize,
    ) -> StoreResult<Vec<(String, Value)>> {
        let mut children = self.children_of(path);
        if children.len() > limit_last {
            children.drain(..children.len() - limit_last);
        }
        Ok(children)
    }

    async fn write(&self, path: &TreePath, value: Value) -> StoreResult<()> {
        self.mutate(path, Op::Set(value)).map(|_| ())
    }

    async fn update(&self, path: &TreePath, fields: Map<String, Value>) -> StoreResult<()> {
        self.mutate(path, Op::Merge(fields)).map(|_| ())
    }

    async fn transact(&self, path: &TreePath, update: TransactFn) -> StoreResult<Option<Value>> {
        // Read, closure, and write all run under the same write lock so a
        // concurrent transact on the same path cannot interleave. The
        // closure runs exactly once here, but callers must not rely on
        // that (networked backends retry on contention).
        if path.is_root() {
            return Err(StoreError::InvalidPath("cannot mutate the root".into()));
        }
        let (result, notifications) = {
            let mut tree = self.tree.write();
            let segments: Vec<&str> = path.segments().collect();
            let current = get_at(&tree, &segments).cloned();
            let op = match update(current) {
                Some(next) => Op::Set(next),
                None => Op::Remove,
            };
            self.apply(&mut tree, path, op)?
        };
        for (parent, kind, event) in notifications {
            self.dispatch(&parent, kind, &event);
        }
        Ok(result)
    }

    async fn remove(&self, path: &TreePath) -> StoreResult<()> {
        self.mutate(path, Op::Remove).map(|_| ())
    }

    async fn subscribe_child_added(
        &self,
        path: &TreePath,
        limit_last: Option<usize>,
    ) -> StoreResult<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();

        // Replay the current window as added events, as the hosted store
        // does when a live query attaches.
        let mut existing = self.children_of(path);
        if let Some(limit) = limit_last {
            if existing.len() > limit {
                existing.drain(..existing.len() - limit);
            }
        }
        for (key, value) in existing {
            let _ = tx.send(ChildEvent { key, value });
        }

        Ok(self.register(path, ChildEventKind::Added, tx, rx))
    }

    async fn subscribe_child_changed(&self, path: &TreePath) -> StoreResult<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(self.register(path, ChildEventKind::Changed, tx, rx))
    }

    async fn subscribe_child_removed(&self, path: &TreePath) -> StoreResult<Subscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(self.register(path, ChildEventKind::Removed, tx, rx))
    }

    async fn on_disconnect_set(&self, path: &TreePath, value: Value) -> StoreResult<()> {
        self.disconnect_writes.lock().push((path.clone(), value));
        Ok(())
    }

    fn connection_state(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }
}

/// Walk the tree to the node at `segments`.
fn get_at<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |node, seg| node.get(seg))
}

/// Set the node at `segments`, materializing intermediate objects.
fn set_at(root: &mut Value, segments: &[&str], value: Value) {
    let mut node = root;
    let (last, init) = match segments.split_last() {
        Some(split) => split,
        None => return,
    };
    for seg in init {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = match node {
            Value::Object(map) => map
                .entry((*seg).to_owned())
                .or_insert_with(|| Value::Object(Map::new())),
            _ => return,
        };
    }
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Some(map) = node.as_object_mut() {
        map.insert((*last).to_owned(), value);
    }
}

/// Merge `fields` into the object at `segments`, creating it if absent.
fn merge_at(
    root: &mut Value,
    segments: &[&str],
    fields: Map<String, Value>,
    path: &TreePath,
) -> StoreResult<()> {
    match get_at(root, segments) {
        None => {
            set_at(root, segments, Value::Object(fields));
            Ok(())
        }
        Some(Value::Object(_)) => {
            let mut node = &mut *root;
            for seg in segments {
                node = match node {
                    Value::Object(map) => match map.get_mut(*seg) {
                        Some(next) => next,
                        None => return Ok(()),
                    },
                    _ => return Ok(()),
                };
            }
            if let Some(map) = node.as_object_mut() {
                for (key, value) in fields {
                    map.insert(key, value);
                }
            }
            Ok(())
        }
        Some(_) => Err(StoreError::NotAnObject(path.to_string())),
    }
}

/// Remove the node at `segments`, if present.
fn remove_at(root: &mut Value, segments: &[&str]) {
    let (last, init) = match segments.split_last() {
        Some(split) => split,
        None => return,
    };
    let mut node = root;
    for seg in init {
        node = match node {
            Value::Object(map) => match map.get_mut(*seg) {
                Some(next) => next,
                None => return,
            },
            _ => return,
        };
    }
    if let Some(map) = node.as_object_mut() {
        map.remove(*last);
    }
}
