//! Entity <-> model mappers
//!
//! `From<Model> for Entity` converts database rows into domain objects.
//! Members are assembled from two tables via [`member_with_roles`].

mod ban;
mod guild;
mod invite;
mod member;
mod role;

pub use invite::counter_from_db;
pub use member::member_with_roles;
