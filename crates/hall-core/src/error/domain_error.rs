//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::{MemberId, PushId};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // Not found
    #[error("Message not found: {0}")]
    MessageNotFound(PushId),

    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),

    #[error("Fee record not found: {0}")]
    DueNotFound(PushId),

    // Authorization
    #[error("Only the original sender may delete a message")]
    NotMessageAuthor,

    // Validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    // Conflicts / business rules
    #[error("Fee record already paid")]
    DueAlreadyPaid,

    #[error("Member is already checked in")]
    AlreadyCheckedIn,

    #[error("Member is not checked in")]
    NotCheckedIn,
}

impl DomainError {
    /// Get an error code string for UI-facing notifications
    pub fn code(&self) -> &'static str {
        match self {
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::MemberNotFound(_) => "UNKNOWN_MEMBER",
            Self::DueNotFound(_) => "UNKNOWN_DUE",
            Self::NotMessageAuthor => "NOT_MESSAGE_AUTHOR",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::DueAlreadyPaid => "DUE_ALREADY_PAID",
            Self::AlreadyCheckedIn => "ALREADY_CHECKED_IN",
            Self::NotCheckedIn => "NOT_CHECKED_IN",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::MessageNotFound(_) | Self::MemberNotFound(_) | Self::DueNotFound(_)
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::NotMessageAuthor)
    }

    /// Check if this is a conflict with current state
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::DueAlreadyPaid | Self::AlreadyCheckedIn | Self::NotCheckedIn
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DomainError::NotMessageAuthor.code(), "NOT_MESSAGE_AUTHOR");
        assert_eq!(
            DomainError::MemberNotFound(MemberId::new("m1")).code(),
            "UNKNOWN_MEMBER"
        );
    }

    #[test]
    fn test_categories() {
        assert!(DomainError::MemberNotFound(MemberId::new("m1")).is_not_found());
        assert!(DomainError::NotMessageAuthor.is_authorization());
        assert!(DomainError::DueAlreadyPaid.is_conflict());
        assert!(!DomainError::NotMessageAuthor.is_conflict());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::MemberNotFound(MemberId::new("m9"));
        assert_eq!(err.to_string(), "Member not found: m9");
    }
}
