//! Integration test utilities for the membership core
//!
//! Scenarios run against the in-memory repositories by default and against
//! PostgreSQL when `DATABASE_URL` is set.

pub mod helpers;

pub use helpers::*;
