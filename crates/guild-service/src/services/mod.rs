//! Business logic services
//!
//! Each service borrows a [`ServiceContext`] and orchestrates repositories,
//! the access policy and the collaborator ports for one area of the domain.

pub mod context;
pub mod error;
pub mod guild;
pub mod invite;
pub mod member;
pub mod moderation;
pub mod permission;
pub mod role;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::{ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use guild::GuildService;
pub use invite::InviteService;
pub use member::MemberService;
pub use moderation::ModerationService;
pub use permission::PermissionService;
pub use role::RoleService;
