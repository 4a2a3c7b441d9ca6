//! In-memory BanRepository

use std::sync::Arc;

use async_trait::async_trait;

use guild_core::entities::Ban;
use guild_core::traits::{BanRepository, RepoResult};
use guild_core::value_objects::Snowflake;

use super::store::{FaultPoint, MemoryStore};

#[derive(Clone)]
pub struct InMemoryBanRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryBanRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl BanRepository for InMemoryBanRepository {
    async fn find(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<Option<Ban>> {
        Ok(self.store.bans.get(&(guild_id, user_id)).map(|b| b.clone()))
    }

    async fn find_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<Ban>> {
        let mut bans: Vec<Ban> = self
            .store
            .bans
            .iter()
            .filter(|b| b.guild_id == guild_id)
            .map(|b| b.clone())
            .collect();
        bans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bans)
    }

    async fn save(&self, ban: &Ban) -> RepoResult<()> {
        self.store.check_fault(FaultPoint::SaveBan)?;
        self.store.bans.insert((ban.guild_id, ban.user_id), ban.clone());
        Ok(())
    }

    async fn ban_member(&self, ban: &Ban) -> RepoResult<bool> {
        self.store.check_fault(FaultPoint::SaveBan)?;
        let _guard = self.store.structure.lock();

        let key = (ban.guild_id, ban.user_id);
        let removed = self.store.members.remove(&key).is_some();
        self.store.bans.insert(key, ban.clone());
        Ok(removed)
    }

    async fn delete(&self, guild_id: Snowflake, user_id: Snowflake) -> RepoResult<bool> {
        Ok(self.store.bans.remove(&(guild_id, user_id)).is_some())
    }
}
