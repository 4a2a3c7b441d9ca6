//! Domain errors - the shared error vocabulary of the membership core

use std::fmt;

use thiserror::Error;

use crate::value_objects::Snowflake;

/// Coarse classification used by callers to map errors onto their transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    NotFound,
    Conflict,
    Authorization,
    ResourceExhausted,
    Validation,
    Upstream,
}

/// Why an invite can no longer be redeemed
///
/// Both reasons surface as [`DomainError::InviteExpired`] with the same code;
/// the distinction is diagnostic only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InviteRejection {
    Expired,
    Exhausted,
}

impl fmt::Display for InviteRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expired => f.write_str("expired"),
            Self::Exhausted => f.write_str("exhausted"),
        }
    }
}

/// Domain layer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Guild not found: {0}")]
    GuildNotFound(Snowflake),

    #[error("Role not found: {0}")]
    RoleNotFound(Snowflake),

    #[error("Member not found in guild")]
    MemberNotFound,

    #[error("Ban not found")]
    BanNotFound,

    #[error("Invite not found: {0}")]
    InviteNotFound(String),

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Already a member of this guild")]
    AlreadyMember,

    #[error("User is already banned from this guild")]
    AlreadyBanned,

    #[error("Cannot delete the default role")]
    CannotDeleteDefaultRole,

    #[error("Cannot remove the default role from a member")]
    CannotModifyDefaultRole,

    #[error("Invite code already exists")]
    InviteCodeExists,

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Not guild owner")]
    NotOwner,

    #[error("Not a member of this guild")]
    NotMember,

    #[error("Cannot perform this action on the guild owner")]
    CannotActOnOwner,

    #[error("Owner cannot leave the guild (transfer ownership first)")]
    OwnerCannotLeave,

    #[error("User is banned from this guild")]
    Banned,

    #[error("Missing permission: {0}")]
    MissingPermission(String),

    // =========================================================================
    // Resource Exhaustion
    // =========================================================================
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Invite is no longer valid ({reason})")]
    InviteExpired { reason: InviteRejection },

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Collaborator error: {0}")]
    CollaboratorError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    pub fn invite_expired() -> Self {
        Self::InviteExpired {
            reason: InviteRejection::Expired,
        }
    }

    pub fn invite_exhausted() -> Self {
        Self::InviteExpired {
            reason: InviteRejection::Exhausted,
        }
    }

    /// Get an error code string for API responses
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::GuildNotFound(_) => "UNKNOWN_GUILD",
            Self::RoleNotFound(_) => "UNKNOWN_ROLE",
            Self::MemberNotFound => "UNKNOWN_MEMBER",
            Self::BanNotFound => "UNKNOWN_BAN",
            Self::InviteNotFound(_) => "UNKNOWN_INVITE",

            // Conflict
            Self::AlreadyMember => "ALREADY_MEMBER",
            Self::AlreadyBanned => "ALREADY_BANNED",
            Self::CannotDeleteDefaultRole => "CANNOT_DELETE_DEFAULT_ROLE",
            Self::CannotModifyDefaultRole => "CANNOT_MODIFY_DEFAULT_ROLE",
            Self::InviteCodeExists => "INVITE_CODE_EXISTS",

            // Authorization
            Self::NotOwner => "NOT_GUILD_OWNER",
            Self::NotMember => "NOT_MEMBER",
            Self::CannotActOnOwner => "CANNOT_ACT_ON_OWNER",
            Self::OwnerCannotLeave => "OWNER_CANNOT_LEAVE",
            Self::Banned => "USER_BANNED",
            Self::MissingPermission(_) => "MISSING_PERMISSIONS",

            // Resource exhaustion
            Self::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            Self::InviteExpired { .. } => "INVITE_EXPIRED",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::CollaboratorError(_) => "COLLABORATOR_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::GuildNotFound(_)
            | Self::RoleNotFound(_)
            | Self::MemberNotFound
            | Self::BanNotFound
            | Self::InviteNotFound(_) => ErrorCategory::NotFound,

            Self::AlreadyMember
            | Self::AlreadyBanned
            | Self::CannotDeleteDefaultRole
            | Self::CannotModifyDefaultRole
            | Self::InviteCodeExists => ErrorCategory::Conflict,

            Self::NotOwner
            | Self::NotMember
            | Self::CannotActOnOwner
            | Self::OwnerCannotLeave
            | Self::Banned
            | Self::MissingPermission(_) => ErrorCategory::Authorization,

            Self::QuotaExceeded(_) | Self::InviteExpired { .. } => ErrorCategory::ResourceExhausted,

            Self::ValidationError(_) => ErrorCategory::Validation,

            Self::DatabaseError(_)
            | Self::CacheError(_)
            | Self::CollaboratorError(_)
            | Self::InternalError(_) => ErrorCategory::Upstream,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.category() == ErrorCategory::Conflict
    }

    pub fn is_authorization(&self) -> bool {
        self.category() == ErrorCategory::Authorization
    }

    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    pub fn is_upstream(&self) -> bool {
        self.category() == ErrorCategory::Upstream
    }
}
