//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in guild-core.

mod ban;
mod error;
mod guild;
mod invite;
mod member;
mod role;

pub use ban::PgBanRepository;
pub use guild::PgGuildRepository;
pub use invite::PgInviteRepository;
pub use member::PgMemberRepository;
pub use role::PgRoleRepository;
