//! Domain entities - core business objects

mod ban;
mod guild;
mod invite;
mod member;
mod role;

pub use ban::Ban;
pub use guild::Guild;
pub use invite::{generate_invite_code, Invite, INVITE_CODE_LEN};
pub use member::GuildMember;
pub use role::{Role, DEFAULT_ROLE_NAME, MAX_ROLE_COLOR};
