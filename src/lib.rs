//! rolecall - a role registry for chat groups
//!
//! Named roles per group, each holding a set of member handles. The
//! registry keeps one in-memory snapshot, persists it atomically on every
//! change and replicates it to a remote repository on a best-effort basis.

pub mod auth;
pub mod cli;
pub mod codec;
pub mod command;
pub mod config;
pub mod http_server;
pub mod model;
pub mod observability;
pub mod registry;
pub mod replication;
pub mod store;
