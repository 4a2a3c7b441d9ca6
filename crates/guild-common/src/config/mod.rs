//! Configuration structs

mod app_config;

pub use app_config::{
    AccessPolicyKind, AppConfig, AppSettings, ConfigError, DatabaseConfig, Environment,
    InviteAccounting, MembershipConfig, QuotaConfig, RedisConfig, SnowflakeConfig,
};
