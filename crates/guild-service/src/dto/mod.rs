//! Data transfer objects
//!
//! - Request DTOs with validation
//! - Response DTOs for serializing service results
//! - Mappers from domain entities to responses

pub mod mappers;
pub mod requests;
pub mod responses;

pub use requests::{
    CreateBanRequest, CreateGuildRequest, CreateInviteRequest, CreateRoleRequest,
    ListMembersRequest, RolePosition, UpdateGuildRequest, UpdateNicknameRequest,
    UpdateRolePositionsRequest, UpdateRoleRequest,
};
pub use responses::{
    BanResponse, GuildResponse, InviteResponse, MemberResponse, PaginatedResponse,
    PaginationMeta, RoleResponse,
};
