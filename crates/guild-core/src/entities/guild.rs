//! Guild entity - the top-level tenant (community / server)

use chrono::{DateTime, Utc};

use crate::value_objects::Snowflake;

/// Guild entity
///
/// Exactly one owner; outside of the creation sequence the owner always
/// resolves to a current member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub id: Snowflake,
    pub name: String,
    pub owner_id: Snowflake,
    pub icon: Option<String>,
    pub banner: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guild {
    pub fn new(id: Snowflake, name: String, owner_id: Snowflake) -> Self {
        let now = Utc::now();
        Self {
            id,
            name,
            owner_id,
            icon: None,
            banner: None,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[inline]
    pub fn is_owner(&self, user_id: Snowflake) -> bool {
        self.owner_id == user_id
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
        self.touch();
    }

    pub fn set_icon(&mut self, icon: Option<String>) {
        self.icon = icon;
        self.touch();
    }

    pub fn set_banner(&mut self, banner: Option<String>) {
        self.banner = banner;
        self.touch();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.touch();
    }

    /// Hand the guild to another user. Caller checks membership of the new owner.
    pub fn transfer_ownership(&mut self, new_owner_id: Snowflake) {
        self.owner_id = new_owner_id;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
