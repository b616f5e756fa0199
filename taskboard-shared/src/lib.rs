//! # Taskboard Shared Library
//!
//! This crate contains the types and business primitives shared by the
//! identity service (`taskboard-users`) and the task service
//! (`taskboard-tasks`).
//!
//! ## Module Organization
//!
//! - `auth`: Token issuance/verification, password hashing, request auth context
//! - `config`: Environment-driven configuration shared by both services
//! - `db`: PostgreSQL pool and table bootstrap
//! - `http`: Unified API error type and CORS setup
//! - `models`: Identity and task records with their SQL operations
//! - `store`: Store traits with Postgres and in-memory implementations
//! - `telemetry`: Tracing subscriber setup

pub mod auth;
pub mod config;
pub mod db;
pub mod http;
pub mod models;
pub mod store;
pub mod telemetry;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
