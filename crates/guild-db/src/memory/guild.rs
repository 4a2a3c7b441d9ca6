//! In-memory GuildRepository

use std::sync::Arc;

use async_trait::async_trait;

use guild_core::entities::Guild;
use guild_core::error::DomainError;
use guild_core::traits::{GuildRepository, RepoResult};
use guild_core::value_objects::Snowflake;

use super::store::{FaultPoint, MemoryStore};

#[derive(Clone)]
pub struct InMemoryGuildRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryGuildRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl GuildRepository for InMemoryGuildRepository {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Guild>> {
        Ok(self.store.guilds.get(&id).map(|g| g.clone()))
    }

    async fn find_by_user(&self, user_id: Snowflake) -> RepoResult<Vec<Guild>> {
        let guild_ids: Vec<Snowflake> = self
            .store
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.guild_id)
            .collect();

        Ok(guild_ids
            .into_iter()
            .filter_map(|id| self.store.guilds.get(&id).map(|g| g.clone()))
            .collect())
    }

    async fn create(&self, guild: &Guild) -> RepoResult<()> {
        self.store.check_fault(FaultPoint::CreateGuild)?;
        self.store.guilds.insert(guild.id, guild.clone());
        Ok(())
    }

    async fn update(&self, guild: &Guild) -> RepoResult<()> {
        match self.store.guilds.get_mut(&guild.id) {
            Some(mut stored) => {
                *stored = guild.clone();
                Ok(())
            }
            None => Err(DomainError::GuildNotFound(guild.id)),
        }
    }

    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        self.store.check_fault(FaultPoint::DeleteGuild)?;
        let _guard = self.store.structure.lock();

        if self.store.guilds.remove(&id).is_none() {
            return Err(DomainError::GuildNotFound(id));
        }
        self.store.roles.retain(|_, role| role.guild_id != id);
        self.store.members.retain(|(guild_id, _), _| *guild_id != id);
        self.store.bans.retain(|(guild_id, _), _| *guild_id != id);
        self.store.invites.retain(|_, invite| invite.guild_id != id);
        Ok(())
    }

    async fn count_owned_by(&self, owner_id: Snowflake) -> RepoResult<u32> {
        let count = self
            .store
            .guilds
            .iter()
            .filter(|g| g.owner_id == owner_id)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}
