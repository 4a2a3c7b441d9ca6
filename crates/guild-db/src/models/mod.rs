//! Database models - SQLx-compatible structs for PostgreSQL tables

mod ban;
mod guild;
mod invite;
mod member;
mod role;

pub use ban::BanModel;
pub use guild::GuildModel;
pub use invite::InviteModel;
pub use member::GuildMemberModel;
pub use role::RoleModel;
