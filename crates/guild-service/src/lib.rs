//! # guild-service
//!
//! Application layer of the membership core: services, request and response
//! DTOs, default collaborator adapters and the background invite sweeper.

pub mod adapters;
pub mod dto;
pub mod services;
pub mod sweeper;

pub use adapters::{NoopChannelProvisioner, RecordingSink, StaticQuotaOracle, TracingNotificationSink};
pub use services::{
    GuildService, InviteService, MemberService, ModerationService, PermissionService, RoleService,
    ServiceContext, ServiceContextBuilder, ServiceError, ServiceResult,
};
pub use sweeper::InviteSweeper;
