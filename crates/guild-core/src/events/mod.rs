//! Domain events

mod domain_event;

pub use domain_event::{
    DomainEvent, GuildEvent, InviteEvent, MemberEvent, ModerationEvent, OwnershipEvent, RoleEvent,
};
