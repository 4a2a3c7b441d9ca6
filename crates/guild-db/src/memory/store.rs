//! Shared backing store for the in-memory repositories

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use guild_core::entities::{Ban, Guild, GuildMember, Invite, Role};
use guild_core::error::DomainError;
use guild_core::traits::RepoResult;
use guild_core::value_objects::Snowflake;

use super::{
    InMemoryBanRepository, InMemoryGuildRepository, InMemoryInviteRepository,
    InMemoryMemberRepository, InMemoryRoleRepository,
};

/// Write operations that can be made to fail once, for exercising
/// compensation and rollback paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    CreateGuild,
    DeleteGuild,
    CreateRole,
    CreateMember,
    DeleteMember,
    SaveBan,
    CreateInvite,
    IncrementInviteUses,
}

/// Tables of one in-memory deployment
///
/// Every repository built from the same store sees the same data, so guild
/// deletion can cascade and role deletion can strip member role sets.
#[derive(Default)]
pub struct MemoryStore {
    pub(crate) guilds: DashMap<Snowflake, Guild>,
    pub(crate) roles: DashMap<Snowflake, Role>,
    pub(crate) members: DashMap<(Snowflake, Snowflake), GuildMember>,
    pub(crate) bans: DashMap<(Snowflake, Snowflake), Ban>,
    pub(crate) invites: DashMap<String, Invite>,
    /// Serializes multi-row writes (cascades, reorders)
    pub(crate) structure: Mutex<()>,
    faults: Mutex<HashSet<FaultPoint>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next call through `point` fail with a `DatabaseError`
    pub fn fail_next(&self, point: FaultPoint) {
        self.faults.lock().insert(point);
    }

    pub(crate) fn check_fault(&self, point: FaultPoint) -> RepoResult<()> {
        if self.faults.lock().remove(&point) {
            return Err(DomainError::DatabaseError(format!("injected fault: {point:?}")));
        }
        Ok(())
    }
}

/// One repository of each kind over a shared [`MemoryStore`]
#[derive(Clone)]
pub struct InMemoryRepositories {
    pub store: Arc<MemoryStore>,
    pub guilds: Arc<InMemoryGuildRepository>,
    pub roles: Arc<InMemoryRoleRepository>,
    pub members: Arc<InMemoryMemberRepository>,
    pub bans: Arc<InMemoryBanRepository>,
    pub invites: Arc<InMemoryInviteRepository>,
}

impl InMemoryRepositories {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        Self {
            guilds: Arc::new(InMemoryGuildRepository::new(Arc::clone(&store))),
            roles: Arc::new(InMemoryRoleRepository::new(Arc::clone(&store))),
            members: Arc::new(InMemoryMemberRepository::new(Arc::clone(&store))),
            bans: Arc::new(InMemoryBanRepository::new(Arc::clone(&store))),
            invites: Arc::new(InMemoryInviteRepository::new(Arc::clone(&store))),
            store,
        }
    }
}

impl Default for InMemoryRepositories {
    fn default() -> Self {
        Self::new()
    }
}
