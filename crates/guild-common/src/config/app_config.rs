//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    /// Absent when running on the in-memory repositories
    pub database: Option<DatabaseConfig>,
    /// Absent when notifications only go to the log
    pub redis: Option<RedisConfig>,
    pub snowflake: SnowflakeConfig,
    pub quota: QuotaConfig,
    pub membership: MembershipConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default)]
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(other.to_string()),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// Snowflake ID generator configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SnowflakeConfig {
    #[serde(default)]
    pub worker_id: u16,
}

/// Static per-identity limits; `0` means unlimited
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QuotaConfig {
    #[serde(default = "default_max_guilds_owned")]
    pub max_guilds_owned: u32,
    #[serde(default = "default_max_guilds_joined")]
    pub max_guilds_joined: u32,
    #[serde(default = "default_max_roles_per_guild")]
    pub max_roles_per_guild: u32,
    #[serde(default = "default_max_invites_per_guild")]
    pub max_invites_per_guild: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            max_guilds_owned: default_max_guilds_owned(),
            max_guilds_joined: default_max_guilds_joined(),
            max_roles_per_guild: default_max_roles_per_guild(),
            max_invites_per_guild: default_max_invites_per_guild(),
        }
    }
}

/// How invite usage is counted on redemption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteAccounting {
    /// Plain increment after the member insert; concurrent redemptions may overshoot
    #[default]
    Lenient,
    /// Bounded increment; the member insert is rolled back on overshoot
    Strict,
}

impl FromStr for InviteAccounting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(other.to_string()),
        }
    }
}

/// Which access policy gates moderator actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessPolicyKind {
    MembershipOnly,
    #[default]
    PermissionBits,
}

impl FromStr for AccessPolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "membership-only" | "membership" => Ok(Self::MembershipOnly),
            "permission-bits" | "permissions" => Ok(Self::PermissionBits),
            other => Err(other.to_string()),
        }
    }
}

/// Membership core behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct MembershipConfig {
    #[serde(default)]
    pub invite_accounting: InviteAccounting,
    #[serde(default)]
    pub access_policy: AccessPolicyKind,
    #[serde(default = "default_invite_sweep_interval_secs")]
    pub invite_sweep_interval_secs: u64,
    #[serde(default = "default_collaborator_timeout_ms")]
    pub collaborator_timeout_ms: u64,
}

impl MembershipConfig {
    pub fn invite_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.invite_sweep_interval_secs.max(1))
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_millis(self.collaborator_timeout_ms)
    }
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            invite_accounting: InviteAccounting::default(),
            access_policy: AccessPolicyKind::default(),
            invite_sweep_interval_secs: default_invite_sweep_interval_secs(),
            collaborator_timeout_ms: default_collaborator_timeout_ms(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "guild-service".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_max_guilds_owned() -> u32 {
    10
}

fn default_max_guilds_joined() -> u32 {
    100
}

fn default_max_roles_per_guild() -> u32 {
    250
}

fn default_max_invites_per_guild() -> u32 {
    1000
}

fn default_invite_sweep_interval_secs() -> u64 {
    300
}

fn default_collaborator_timeout_ms() -> u64 {
    2000
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is present but cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let database = vars.get("DATABASE_URL").map(|url| -> Result<_, ConfigError> {
            Ok(DatabaseConfig {
                url,
                max_connections: vars.parse_or("DATABASE_MAX_CONNECTIONS", default_max_connections)?,
                min_connections: vars.parse_or("DATABASE_MIN_CONNECTIONS", default_min_connections)?,
            })
        });

        let redis = vars.get("REDIS_URL").map(|url| -> Result<_, ConfigError> {
            Ok(RedisConfig {
                url,
                max_connections: vars
                    .parse_or("REDIS_MAX_CONNECTIONS", default_redis_max_connections)?,
            })
        });

        let worker_id: u16 = vars.parse_or("WORKER_ID", || 0)?;
        if worker_id > 1023 {
            return Err(ConfigError::InvalidValue("WORKER_ID", worker_id.to_string()));
        }

        Ok(Self {
            app: AppSettings {
                name: vars.get("APP_NAME").unwrap_or_else(default_app_name),
                env: vars.parse_or("APP_ENV", Environment::default)?,
            },
            database: database.transpose()?,
            redis: redis.transpose()?,
            snowflake: SnowflakeConfig { worker_id },
            quota: QuotaConfig {
                max_guilds_owned: vars.parse_or("QUOTA_MAX_GUILDS_OWNED", default_max_guilds_owned)?,
                max_guilds_joined: vars
                    .parse_or("QUOTA_MAX_GUILDS_JOINED", default_max_guilds_joined)?,
                max_roles_per_guild: vars
                    .parse_or("QUOTA_MAX_ROLES_PER_GUILD", default_max_roles_per_guild)?,
                max_invites_per_guild: vars
                    .parse_or("QUOTA_MAX_INVITES_PER_GUILD", default_max_invites_per_guild)?,
            },
            membership: MembershipConfig {
                invite_accounting: vars.parse_or("INVITE_ACCOUNTING", InviteAccounting::default)?,
                access_policy: vars.parse_or("ACCESS_POLICY", AccessPolicyKind::default)?,
                invite_sweep_interval_secs: vars
                    .parse_or("INVITE_SWEEP_INTERVAL_SECS", default_invite_sweep_interval_secs)?,
                collaborator_timeout_ms: vars
                    .parse_or("COLLABORATOR_TIMEOUT_MS", default_collaborator_timeout_ms)?,
            },
        })
    }

    /// Database settings, required by binaries that talk to PostgreSQL
    pub fn require_database(&self) -> Result<&DatabaseConfig, ConfigError> {
        self.database
            .as_ref()
            .ok_or(ConfigError::MissingVar("DATABASE_URL"))
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn parse_or<T, D>(&self, key: &'static str, default: D) -> Result<T, ConfigError>
    where
        T: FromStr,
        D: FnOnce() -> T,
    {
        match self.get(key) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key, raw)),
            None => Ok(default()),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
