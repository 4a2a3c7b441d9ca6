//! In-memory InviteRepository

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;

use guild_core::entities::Invite;
use guild_core::error::DomainError;
use guild_core::traits::{InviteRepository, RepoResult};
use guild_core::value_objects::Snowflake;

use super::store::{FaultPoint, MemoryStore};

#[derive(Clone)]
pub struct InMemoryInviteRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryInviteRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl InviteRepository for InMemoryInviteRepository {
    async fn find_by_code(&self, code: &str) -> RepoResult<Option<Invite>> {
        Ok(self.store.invites.get(code).map(|i| i.clone()))
    }

    async fn find_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<Invite>> {
        let mut invites: Vec<Invite> = self
            .store
            .invites
            .iter()
            .filter(|i| i.guild_id == guild_id)
            .map(|i| i.clone())
            .collect();
        invites.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invites)
    }

    async fn count_by_guild(&self, guild_id: Snowflake) -> RepoResult<u32> {
        let count = self.store.invites.iter().filter(|i| i.guild_id == guild_id).count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn create(&self, invite: &Invite) -> RepoResult<()> {
        self.store.check_fault(FaultPoint::CreateInvite)?;
        match self.store.invites.entry(invite.code.clone()) {
            Entry::Occupied(_) => Err(DomainError::InviteCodeExists),
            Entry::Vacant(slot) => {
                slot.insert(invite.clone());
                Ok(())
            }
        }
    }

    async fn increment_uses(&self, code: &str) -> RepoResult<()> {
        self.store.check_fault(FaultPoint::IncrementInviteUses)?;
        match self.store.invites.get_mut(code) {
            Some(mut invite) => {
                invite.uses = invite.uses.saturating_add(1);
                Ok(())
            }
            None => Err(DomainError::InviteNotFound(code.to_string())),
        }
    }

    async fn increment_uses_bounded(&self, code: &str) -> RepoResult<bool> {
        self.store.check_fault(FaultPoint::IncrementInviteUses)?;
        // The shard write lock makes check-and-increment atomic
        match self.store.invites.get_mut(code) {
            Some(invite) if invite.is_exhausted() => Ok(false),
            Some(mut invite) => {
                invite.uses = invite.uses.saturating_add(1);
                Ok(true)
            }
            None => Err(DomainError::InviteNotFound(code.to_string())),
        }
    }

    async fn delete(&self, code: &str) -> RepoResult<bool> {
        Ok(self.store.invites.remove(code).is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> RepoResult<u64> {
        let before = self.store.invites.len();
        self.store.invites.retain(|_, invite| !invite.is_expired_at(now));
        Ok((before - self.store.invites.len()) as u64)
    }
}
