//! Ports - repository traits, collaborator traits and access policies

mod policy;
mod ports;
mod repositories;

pub use policy::{AccessPolicy, AccessRequest, GuildAction, MembershipOnlyPolicy, PermissionBitsPolicy};
pub use ports::{ChannelProvisioner, NotificationSink, QuotaLimits, QuotaOracle};
pub use repositories::{
    BanRepository, GuildRepository, InviteRepository, MemberRepository, RepoResult, RoleRepository,
};
