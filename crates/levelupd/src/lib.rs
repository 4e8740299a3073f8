//! levelupd - LevelUp daemon
//!
//! HTTP API, SQLite persistence, session auth, daily reset scheduling and
//! the change notification feed. All progression math lives in
//! `levelup_common`; this crate only stores, serves and schedules.

pub mod events;
pub mod reset;
pub mod routes;
pub mod server;
pub mod session;
pub mod store;
