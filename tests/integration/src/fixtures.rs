//! Test fixtures and data generators
//!
//! Reusable setup for end-to-end tests: unique member data, wired-up
//! engines over one shared in-memory store, and a fault-injecting store
//! wrapper for failure-isolation tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use tokio::sync::watch;

use hall_common::ChatConfig;
use hall_core::value_objects::{MemberId, PushIdGenerator, ReceiptGenerator};
use hall_engine::{
    ActivityLog, AttendanceRecorder, ChatEngine, EnrollMemberRequest, FeeReconciler,
    MemberDirectory, PaymentService,
};
use hall_store::{
    MemoryStore, RealtimeStore, StoreError, StoreResult, Subscription, TransactFn, TreePath,
};

/// Counter for unique test data
static COUNTER: AtomicU64 = AtomicU64::new(1);

/// Get a unique suffix for test data
pub fn unique_suffix() -> u64 {
    COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Enrollment request with unique name and email
pub fn unique_enrollment(join_date: Option<NaiveDate>) -> EnrollMemberRequest {
    let suffix = unique_suffix();
    EnrollMemberRequest {
        name: format!("Member {suffix}"),
        email: format!("member{suffix}@example.com"),
        phone: None,
        join_date,
        monthly_fee: 50_000,
    }
}

/// Everything wired over one shared store, as the app composes it.
pub struct TestBackend {
    pub store: Arc<dyn RealtimeStore>,
    pub ids: Arc<PushIdGenerator>,
    pub directory: MemberDirectory,
    pub reconciler: FeeReconciler,
    pub payments: PaymentService,
    pub attendance: AttendanceRecorder,
}

impl TestBackend {
    /// Wire everything over a fresh in-memory store
    pub fn new() -> Self {
        Self::over(Arc::new(MemoryStore::new()))
    }

    /// Wire everything over an arbitrary store (used with [`FlakyStore`])
    pub fn over<S: RealtimeStore + 'static>(backing: Arc<S>) -> Self {
        let store: Arc<dyn RealtimeStore> = backing;
        let ids = Arc::new(PushIdGenerator::new());
        let activity = Arc::new(ActivityLog::new(store.clone(), ids.clone()));
        Self {
            directory: MemberDirectory::new(store.clone(), ids.clone(), activity.clone()),
            reconciler: FeeReconciler::new(store.clone(), ids.clone(), 30),
            payments: PaymentService::new(
                store.clone(),
                Arc::new(ReceiptGenerator::new()),
                activity,
            ),
            attendance: AttendanceRecorder::new(store.clone(), ids.clone()),
            store,
            ids,
        }
    }

    /// A chat engine acting for `member` on the shared store
    pub fn chat_engine_for(&self, member: &str, name: &str) -> ChatEngine {
        ChatEngine::new(
            self.store.clone(),
            ChatConfig::default(),
            self.ids.clone(),
            MemberId::new(member),
            name.to_owned(),
        )
    }
}

impl Default for TestBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Store wrapper that rejects fee-record writes for one poisoned member.
/// Everything else passes through to the wrapped store.
///
/// Used to prove that one member's failure cannot derail a reconciliation
/// pass over the others.
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    poisoned_member: String,
}

impl FlakyStore {
    pub fn poisoning(inner: Arc<MemoryStore>, member: &MemberId) -> Self {
        Self {
            inner,
            poisoned_member: member.as_str().to_owned(),
        }
    }

    fn is_poisoned(&self, value: &Value) -> bool {
        value
            .get("memberId")
            .and_then(Value::as_str)
            .is_some_and(|id| id == self.poisoned_member)
    }
}

#[async_trait]
impl RealtimeStore for FlakyStore {
    async fn read(&self, path: &TreePath) -> StoreResult<Option<Value>> {
        self.inner.read(path).await
    }

    async fn read_window(
        &self,
        path: &TreePath,
        limit_last: usize,
    ) -> StoreResult<Vec<(String, Value)>> {
        self.inner.read_window(path, limit_last).await
    }

    async fn write(&self, path: &TreePath, value: Value) -> StoreResult<()> {
        if path.as_str().starts_with("dues/") && self.is_poisoned(&value) {
            return Err(StoreError::Unavailable("injected fault".to_owned()));
        }
        self.inner.write(path, value).await
    }

    async fn update(&self, path: &TreePath, fields: Map<String, Value>) -> StoreResult<()> {
        self.inner.update(path, fields).await
    }

    async fn transact(&self, path: &TreePath, update: TransactFn) -> StoreResult<Option<Value>> {
        self.inner.transact(path, update).await
    }

    async fn remove(&self, path: &TreePath) -> StoreResult<()> {
        self.inner.remove(path).await
    }

    async fn subscribe_child_added(
        &self,
        path: &TreePath,
        limit_last: Option<usize>,
    ) -> StoreResult<Subscription> {
        self.inner.subscribe_child_added(path, limit_last).await
    }

    async fn subscribe_child_changed(&self, path: &TreePath) -> StoreResult<Subscription> {
        self.inner.subscribe_child_changed(path).await
    }

    async fn subscribe_child_removed(&self, path: &TreePath) -> StoreResult<Subscription> {
        self.inner.subscribe_child_removed(path).await
    }

    async fn on_disconnect_set(&self, path: &TreePath, value: Value) -> StoreResult<()> {
        self.inner.on_disconnect_set(path, value).await
    }

    fn connection_state(&self) -> watch::Receiver<bool> {
        self.inner.connection_state()
    }
}
