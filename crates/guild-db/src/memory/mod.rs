//! In-memory repository implementations
//!
//! Backed by concurrent maps sharing one [`MemoryStore`]. Used by the service
//! tests, the integration scenarios and single-process deployments.

mod ban;
mod guild;
mod invite;
mod member;
mod role;
mod store;

pub use ban::InMemoryBanRepository;
pub use guild::InMemoryGuildRepository;
pub use invite::InMemoryInviteRepository;
pub use member::InMemoryMemberRepository;
pub use role::InMemoryRoleRepository;
pub use store::{FaultPoint, InMemoryRepositories, MemoryStore};
