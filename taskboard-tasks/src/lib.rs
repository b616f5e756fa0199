//! # Taskboard Task Service
//!
//! Owns tasks. Verifies bearer tokens locally with the shared signing key and
//! asks the identity service whether referenced identities exist.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `directory`: Identity lookups against the identity service
//! - `routes`: API route handlers
//! - `service`: Task operations over the task store

pub mod app;
pub mod config;
pub mod directory;
pub mod routes;
pub mod service;
