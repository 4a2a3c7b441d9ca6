//! # guild-core
//!
//! Domain layer of the membership core: entities, value objects, the
//! permission engine, domain errors and events, and the ports (repository,
//! collaborator and access-policy traits) the service layer is written against.
//! This crate has zero dependencies on infrastructure.

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    generate_invite_code, Ban, Guild, GuildMember, Invite, Role, DEFAULT_ROLE_NAME,
    INVITE_CODE_LEN, MAX_ROLE_COLOR,
};
pub use error::{DomainError, ErrorCategory, InviteRejection};
pub use events::DomainEvent;
pub use traits::{
    AccessPolicy, AccessRequest, BanRepository, ChannelProvisioner, GuildAction, GuildRepository,
    InviteRepository, MemberRepository, MembershipOnlyPolicy, NotificationSink,
    PermissionBitsPolicy, QuotaLimits, QuotaOracle, RepoResult, RoleRepository,
};
pub use value_objects::{Permissions, Snowflake, SnowflakeError, SnowflakeGenerator};
