//! # guild-common
//!
//! Shared configuration and telemetry for the guild membership services.

pub mod config;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{
    AccessPolicyKind, AppConfig, AppSettings, ConfigError, DatabaseConfig, Environment,
    InviteAccounting, MembershipConfig, QuotaConfig, RedisConfig, SnowflakeConfig,
};
pub use telemetry::{init_tracing, TracingConfig, TracingError};
