//! # TaskClaim Shared Library
//!
//! This crate contains the data layer and business logic behind the TaskClaim
//! API server: users complete a catalog of GitHub tasks (star a repository,
//! follow a user) and, once every active task is done, file a single payment
//! claim.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool and embedded migrations
//! - `models`: Database models and their queries
//! - `auth`: Session token validation
//! - `github`: GitHub REST client used to apply and verify tasks
//! - `workflow`: Completion recorder, remote verifier, eligibility gate and
//!   payment request manager

pub mod auth;
pub mod db;
pub mod github;
pub mod models;
pub mod workflow;

/// Current version of the TaskClaim shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
