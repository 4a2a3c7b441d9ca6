//! In-memory RoleRepository

use std::sync::Arc;

use async_trait::async_trait;

use guild_core::entities::Role;
use guild_core::error::DomainError;
use guild_core::traits::{RepoResult, RoleRepository};
use guild_core::value_objects::Snowflake;

use super::store::{FaultPoint, MemoryStore};

#[derive(Clone)]
pub struct InMemoryRoleRepository {
    store: Arc<MemoryStore>,
}

impl InMemoryRoleRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn find_by_id(&self, id: Snowflake) -> RepoResult<Option<Role>> {
        Ok(self.store.roles.get(&id).map(|r| r.clone()))
    }

    async fn find_by_guild(&self, guild_id: Snowflake) -> RepoResult<Vec<Role>> {
        let mut roles: Vec<Role> = self
            .store
            .roles
            .iter()
            .filter(|r| r.guild_id == guild_id)
            .map(|r| r.clone())
            .collect();
        roles.sort_by_key(|r| (r.position, r.id));
        Ok(roles)
    }

    async fn find_default(&self, guild_id: Snowflake) -> RepoResult<Option<Role>> {
        Ok(self
            .store
            .roles
            .iter()
            .find(|r| r.guild_id == guild_id && r.is_default)
            .map(|r| r.clone()))
    }

    async fn count_by_guild(&self, guild_id: Snowflake) -> RepoResult<u32> {
        let count = self.store.roles.iter().filter(|r| r.guild_id == guild_id).count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn create(&self, role: &Role) -> RepoResult<()> {
        self.store.check_fault(FaultPoint::CreateRole)?;
        self.store.roles.insert(role.id, role.clone());
        Ok(())
    }

    async fn update(&self, role: &Role) -> RepoResult<()> {
        match self.store.roles.get_mut(&role.id) {
            Some(mut stored) => {
                *stored = role.clone();
                Ok(())
            }
            None => Err(DomainError::RoleNotFound(role.id)),
        }
    }

    async fn delete(&self, id: Snowflake) -> RepoResult<()> {
        let _guard = self.store.structure.lock();

        let guild_id = match self.store.roles.get(&id) {
            None => return Err(DomainError::RoleNotFound(id)),
            Some(role) if role.is_default => return Err(DomainError::CannotDeleteDefaultRole),
            Some(role) => role.guild_id,
        };

        self.store.roles.remove(&id);
        for mut member in self.store.members.iter_mut() {
            if member.guild_id == guild_id {
                member.remove_role(id);
            }
        }
        Ok(())
    }

    async fn update_positions(
        &self,
        guild_id: Snowflake,
        positions: &[(Snowflake, i32)],
    ) -> RepoResult<()> {
        let _guard = self.store.structure.lock();

        // Validate everything before the first write
        for (role_id, _) in positions {
            let belongs = self
                .store
                .roles
                .get(role_id)
                .is_some_and(|r| r.guild_id == guild_id);
            if !belongs {
                return Err(DomainError::RoleNotFound(*role_id));
            }
        }

        for (role_id, position) in positions {
            if let Some(mut role) = self.store.roles.get_mut(role_id) {
                role.set_position(*position);
            }
        }
        Ok(())
    }
}
