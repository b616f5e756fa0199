//! # Taskboard Identity Service
//!
//! Owns user identities: registration, login, lookup and profile
//! management. Issues the tokens that the task service later verifies on
//! its own.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `routes`: API route handlers
//! - `service`: Identity operations over the user store

pub mod app;
pub mod config;
pub mod routes;
pub mod service;
