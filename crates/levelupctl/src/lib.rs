//! levelupctl - LevelUp command-line client
//!
//! Talks to a running levelupd over its HTTP API and renders the hunter
//! profile, habit log and skill progression in the terminal.

pub mod cli;
pub mod client;
pub mod display;
