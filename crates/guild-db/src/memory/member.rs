//! In-memory MemberRepository

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;

use guild_core::entities::GuildMember;
use guild_core::error::DomainError;
use guild_core::traits::{MemberRepository, RepoResult};
use guild_core::value_objects::Snowflake;

use super::store::{FaultPoint, MemoryStore};

#[derive(Clone)]
pub struct InMemoryMemberRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryMemberRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    fn insert(&self, member: &GuildMember) -> RepoResult<()> {
        match self.store.members.entry((member.guild_id, member.user_id)) {
            Entry::Occupied(_) => Err(DomainError::AlreadyMember),
            Entry::Vacant(slot) => {
                slot.insert(member.clone());
                Ok(())
            }
        }
    }
}

#[async_trait]
impl MemberRepository for InMemoryMemberRepository {
    async fn find(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
    ) -> RepoResult<Option<GuildMember>> {
        Ok(self.store.members.get(&(guild_id, user_id)).map(|m| m.clone()))
    }

    async fn find_by_guild(
        &self,
        guild_id: Snowflake,
        limit: u32,
        after: Option<Snowflake>,
    ) -> RepoResult<Vec<GuildMember>> {
        let mut members: Vec<GuildMember> = self
            .store
            .members
            .iter()
            .filter(|m| m.guild_id == guild_id && after.map_or(true, |a| m.user_id > a))
            .map(|m| m.clone())
            .collect();
        members.sort_by_key(|m| m.user_id);
        members.truncate(limit.max(1) as usize);
        Ok(members)
    }

    async fn is_member(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        Ok(self.store.members.contains_key(&(guild_id, user_id)))
    }

    async fn count_by_user(&self, user_id: Snowflake) -> RepoResult<u32> {
        let count = self.store.members.iter().filter(|m| m.user_id == user_id).count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn create(&self, member: &GuildMember) -> RepoResult<()> {
        self.store.check_fault(FaultPoint::CreateMember)?;
        self.insert(member)
    }

    async fn create_unless_banned(
        &self,
        member: &GuildMember,
        now: DateTime<Utc>,
    ) -> RepoResult<()> {
        self.store.check_fault(FaultPoint::CreateMember)?;
        let _guard = self.store.structure.lock();

        if !self.store.guilds.contains_key(&member.guild_id) {
            return Err(DomainError::GuildNotFound(member.guild_id));
        }
        let banned = self
            .store
            .bans
            .get(&(member.guild_id, member.user_id))
            .is_some_and(|ban| ban.is_active_at(now));
        if banned {
            return Err(DomainError::Banned);
        }
        self.insert(member)
    }

    async fn update(&self, member: &GuildMember) -> RepoResult<()> {
        match self.store.members.get_mut(&(member.guild_id, member.user_id)) {
            Some(mut stored) => {
                stored.nickname.clone_from(&member.nickname);
                stored.updated_at = member.updated_at;
                Ok(())
            }
            None => Err(DomainError::MemberNotFound),
        }
    }

    async fn delete(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        self.store.check_fault(FaultPoint::DeleteMember)?;
        Ok(self.store.members.remove(&(guild_id, user_id)).is_some())
    }

    async fn add_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> RepoResult<()> {
        match self.store.members.get_mut(&(guild_id, user_id)) {
            Some(mut member) => {
                member.add_role(role_id);
                Ok(())
            }
            None => Err(DomainError::MemberNotFound),
        }
    }

    async fn remove_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> RepoResult<()> {
        if let Some(mut member) = self.store.members.get_mut(&(guild_id, user_id)) {
            member.remove_role(role_id);
        }
        Ok(())
    }
}
