//! # cupid-store
//!
//! SQLite persistence for the Cupid backend.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection`, provides typed CRUD helpers for every entity and
//! implements the [`cupid_core::Gateway`] port. Uniqueness of swipes,
//! matches and conversations is enforced by table constraints so that
//! several connections can write concurrently without duplicating rows.

pub mod conversations;
pub mod database;
pub mod gateway;
pub mod matches;
pub mod messages;
pub mod migrations;
pub mod moderation;
pub mod swipes;
pub mod users;

mod error;

pub use database::Database;
pub use error::StoreError;
