//! # HTTP Server Module
//!
//! Optional network surface over the role registry.
//!
//! # Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /metrics` - Counters
//! - `GET /groups/:group/roles` - Roles with members
//! - `GET /groups/:group/roles/:role` - Members of one role
//! - `POST /groups/:group/roles/:role/members` - Add members
//! - `DELETE /groups/:group/roles/:role/members` - Remove members
//! - `DELETE /groups/:group/roles/:role` - Delete a role

pub mod config;
pub mod observability_routes;
pub mod role_routes;
pub mod server;

pub use config::HttpServerConfig;
pub use server::HttpServer;
