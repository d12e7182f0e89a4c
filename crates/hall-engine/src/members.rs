//! Membership directory - enrollment, deactivation, removal
//!
//! Single-admin writer; reads feed the chat roster and the fee reconciler.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use validator::Validate;

use hall_common::{AppError, AppResult};
use hall_core::entities::{ActivityKind, Member};
use hall_core::error::DomainError;
use hall_core::value_objects::{MemberId, PushIdGenerator};
use hall_store::RealtimeStore;

use crate::activity_log::ActivityLog;
use crate::paths;

/// Enrollment request, validated before anything is written
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EnrollMemberRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub join_date: Option<NaiveDate>,

    #[validate(range(min = 0, message = "Fee cannot be negative"))]
    pub monthly_fee: i64,
}

/// Store-backed member directory.
pub struct MemberDirectory {
    store: Arc<dyn RealtimeStore>,
    ids: Arc<PushIdGenerator>,
    activity: Arc<ActivityLog>,
}

impl MemberDirectory {
    pub fn new(
        store: Arc<dyn RealtimeStore>,
        ids: Arc<PushIdGenerator>,
        activity: Arc<ActivityLog>,
    ) -> Self {
        Self {
            store,
            ids,
            activity,
        }
    }

    /// Enroll a new active member.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn enroll(&self, request: EnrollMemberRequest) -> AppResult<Member> {
        request.validate()?;

        let member = Member::new(
            MemberId::new(self.ids.generate().as_str()),
            request.name,
            request.email,
            request.phone,
            request.join_date,
            request.monthly_fee,
        );
        self.store
            .write(&paths::member(&member.id), serde_json::to_value(&member)?)
            .await?;

        info!(member = %member.id, "Member enrolled");
        self.activity
            .record(
                ActivityKind::MemberEnrolled,
                member.id.clone(),
                member.name.clone(),
                "enrolled",
            )
            .await;
        Ok(member)
    }

    /// Flip a member to inactive. Membership data and history are kept;
    /// billing stops.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: &MemberId) -> AppResult<Member> {
        let mut member = self.get(id).await?;
        member.deactivate();
        self.store
            .write(&paths::member(id), serde_json::to_value(&member)?)
            .await?;

        info!(member = %id, "Member deactivated");
        self.activity
            .record(
                ActivityKind::MemberDeactivated,
                member.id.clone(),
                member.name.clone(),
                "deactivated",
            )
            .await;
        Ok(member)
    }

    /// Hard-remove a member. The audit entry is the only trace left.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &MemberId) -> AppResult<()> {
        let member = self.get(id).await?;
        self.store.remove(&paths::member(id)).await?;

        info!(member = %id, "Member removed");
        self.activity
            .record(
                ActivityKind::MemberRemoved,
                member.id,
                member.name,
                "removed by admin",
            )
            .await;
        Ok(())
    }

    /// One member by id
    pub async fn get(&self, id: &MemberId) -> AppResult<Member> {
        let node = self
            .store
            .read(&paths::member(id))
            .await?
            .ok_or_else(|| DomainError::MemberNotFound(id.clone()))?;
        serde_json::from_value(node).map_err(AppError::from)
    }

    /// Every member, sorted by name
    #[instrument(skip(self))]
    pub async fn list(&self) -> AppResult<Vec<Member>> {
        let Some(node) = self.store.read(&paths::members_root()).await? else {
            return Ok(Vec::new());
        };
        let Some(children) = node.as_object() else {
            return Ok(Vec::new());
        };
        let mut members = Vec::with_capacity(children.len());
        for (key, value) in children {
            match serde_json::from_value::<Member>(value.clone()) {
                Ok(member) => members.push(member),
                Err(e) => warn!(key = %key, error = %e, "Skipping malformed member record"),
            }
        }
        members.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(members)
    }

    /// Ids of all active members (the chat fan-out roster)
    pub async fn active_roster(&self) -> AppResult<Vec<MemberId>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(Member::is_active)
            .map(|member| member.id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hall_store::MemoryStore;

    fn directory() -> (Arc<dyn RealtimeStore>, MemberDirectory) {
        let store: Arc<dyn RealtimeStore> = Arc::new(MemoryStore::new());
        let ids = Arc::new(PushIdGenerator::new());
        let activity = Arc::new(ActivityLog::new(store.clone(), ids.clone()));
        (store.clone(), MemberDirectory::new(store, ids, activity))
    }

    fn request(name: &str, email: &str) -> EnrollMemberRequest {
        EnrollMemberRequest {
            name: name.to_owned(),
            email: email.to_owned(),
            phone: None,
            join_date: None,
            monthly_fee: 50_000,
        }
    }

    #[tokio::test]
    async fn test_enroll_and_get() {
        let (_store, directory) = directory();
        let member = directory
            .enroll(request("Mina", "mina@example.com"))
            .await
            .unwrap();
        assert!(member.is_active());

        let fetched = directory.get(&member.id).await.unwrap();
        assert_eq!(fetched, member);
    }

    #[tokio::test]
    async fn test_enroll_validates() {
        let (_store, directory) = directory();
        let err = directory
            .enroll(request("Mina", "not-an-email"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err = directory
            .enroll(request("", "mina@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_deactivate_keeps_the_record() {
        let (_store, directory) = directory();
        let member = directory
            .enroll(request("Mina", "mina@example.com"))
            .await
            .unwrap();

        let updated = directory.deactivate(&member.id).await.unwrap();
        assert!(!updated.is_active());
        assert!(!directory.get(&member.id).await.unwrap().is_active());
    }

    #[tokio::test]
    async fn test_remove_leaves_only_the_audit_entry() {
        let (store, directory) = directory();
        let member = directory
            .enroll(request("Mina", "mina@example.com"))
            .await
            .unwrap();

        directory.remove(&member.id).await.unwrap();
        let err = directory.get(&member.id).await.unwrap_err();
        assert!(err.is_not_found());

        let trail = store.read(&paths::activities_root()).await.unwrap().unwrap();
        assert_eq!(trail.as_object().unwrap().len(), 2, "enroll + remove");
    }

    #[tokio::test]
    async fn test_active_roster_excludes_inactive() {
        let (_store, directory) = directory();
        let mina = directory
            .enroll(request("Mina", "mina@example.com"))
            .await
            .unwrap();
        let bo = directory
            .enroll(request("Bo", "bo@example.com"))
            .await
            .unwrap();
        directory.deactivate(&bo.id).await.unwrap();

        let roster = directory.active_roster().await.unwrap();
        assert_eq!(roster, vec![mina.id]);
    }

    #[tokio::test]
    async fn test_list_sorts_by_name() {
        let (_store, directory) = directory();
        directory
            .enroll(request("Zoe", "zoe@example.com"))
            .await
            .unwrap();
        directory
            .enroll(request("Ann", "ann@example.com"))
            .await
            .unwrap();

        let names: Vec<String> = directory
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Ann".to_owned(), "Zoe".to_owned()]);
    }
}
