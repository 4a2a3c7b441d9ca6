//! Repository traits (ports) - define the interface for data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation. Repositories never call each other. Most
//! cross-entity invariants are enforced by the service layer; ban and
//! membership exclusion is the exception, since joining and banning must
//! each be a single atomic write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{Ban, Guild, GuildMember, Invite, Role};
use crate::error::DomainError;
use crate::value_objects::Snowflake;

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Guild Repository
// ============================================================================

#[async_trait]
pub trait GuildRepository: Send + Sync {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Guild>>;

    /// Guilds the user currently belongs to
    async fn find_by_user(&self, user_id: Snowflake) -> RepoResult<Vec<Guild>>;

    async fn create(&self, guild: &Guild) -> RepoResult<()>;

    /// Persist mutable fields (name, icon, banner, description, owner)
    async fn update(&self, guild: &Guild) -> RepoResult<()>;

    /// Delete the guild together with its roles, members, bans and invites
    async fn delete(&self, id: Snowflake) -> RepoResult<()>;

    /// Number of guilds owned by the user
    async fn count_owned_by(&self, owner_id: Snowflake) -> RepoResult<u32>;
}

// ============================================================================
// Role Repository
// ============================================================================

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Role>>;

    /// All roles of a guild ordered by position, then id
    async fn find_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<Role>>;

    async fn find_default(&self, guild_id: Snowflake) -> RepoResult<Option<Role>>;

    async fn count_by_guild(&self, guild_id: Snowflake) -> RepoResult<u32>;

    async fn create(&self, role: &Role) -> RepoResult<()>;

    async fn update(&self, role: &Role) -> RepoResult<()>;

    /// Delete the role and strip it from every member's role set
    async fn delete(&self, id: Snowflake) -> RepoResult<()>;

    /// Replace the positions of the given roles as a single unit.
    ///
    /// Fails with `RoleNotFound` without writing anything if any id does not
    /// belong to `guild_id`.
    async fn update_positions(
        &self,
        guild_id: Snowflake,
        positions: &[(Snowflake, i32)],
    ) -> RepoResult<()>;
}

// ============================================================================
// Member Repository
// ============================================================================

#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn find(&self, guild_id: Snowflake, user_id: Snowflake)
        -> RepoResult<Option<GuildMember>>;

    /// Members ordered by user id, starting after `after` (cursor pagination)
    async fn find_by_guild(
        &self,
        guild_id: Snowflake,
        limit: u32,
        after: Option<Snowflake>,
    ) -> RepoResult<Vec<GuildMember>>;

    async fn is_member(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<bool>;

    /// Number of guilds the user belongs to
    async fn count_by_user(&self, user_id: Snowflake) -> RepoResult<u32>;

    /// Insert a membership; `AlreadyMember` if the pair exists
    async fn create(&self, member: &GuildMember) -> RepoResult<()>;

    /// Insert a membership unless the user holds a ban active at `now`
    ///
    /// Fails with `Banned` when such a ban exists, `AlreadyMember` when the
    /// pair exists and `GuildNotFound` when the guild is gone.
    async fn create_unless_banned(
        &self,
        member: &GuildMember,
        now: DateTime<Utc>,
    ) -> RepoResult<()>;

    /// Persist the nickname
    async fn update(&self, member: &GuildMember) -> RepoResult<()>;

    /// Remove a membership, returning whether one existed
    async fn delete(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<bool>;

    async fn add_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> RepoResult<()>;

    async fn remove_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> RepoResult<()>;
}

// ============================================================================
// Ban Repository
// ============================================================================

#[async_trait]
pub trait BanRepository: Send + Sync {
    /// Stored ban record, active or not
    async fn find(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<Option<Ban>>;

    async fn find_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<Ban>>;

    /// Insert the ban, replacing any stored record for the same pair
    async fn save(&self, ban: &Ban) -> RepoResult<()>;

    /// Store the ban and drop the user's membership in one atomic write,
    /// returning whether a membership was removed
    ///
    /// Serialized against [`MemberRepository::create_unless_banned`] for the
    /// same guild.
    async fn ban_member(&self, ban: &Ban) -> RepoResult<bool>;

    /// Remove a ban, returning whether one existed
    async fn delete(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<bool>;
}

// ============================================================================
// Invite Repository
// ============================================================================

#[async_trait]
pub trait InviteRepository: Send + Sync {
    async fn find_by_code(&self, code: &str) -> RepoResult<Option<Invite>>;

    async fn find_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<Invite>>;

    async fn count_by_guild(&self, guild_id: Snowflake) -> RepoResult<u32>;

    /// Insert an invite; `InviteCodeExists` if the code is taken
    async fn create(&self, invite: &Invite) -> RepoResult<()>;

    /// Unconditional `uses += 1`
    async fn increment_uses(&self, code: &str) -> RepoResult<()>;

    /// Atomic `uses += 1` only while `max_uses == 0 || uses < max_uses`.
    ///
    /// Returns false when the increment would overshoot.
    async fn increment_uses_bounded(&self, code: &str) -> RepoResult<bool>;

    /// Remove an invite, returning whether one existed
    async fn delete(&self, code: &str) -> RepoResult<bool>;

    /// Remove every invite whose expiry is before `now`, returning the count
    async fn delete_expired(&self, now: DateTime<Utc>) -> RepoResult<u64>;
}
