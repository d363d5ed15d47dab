//! # TaskClaim API Server Library
//!
//! HTTP surface for the task-completion and reward-claim workflow.
//!
//! ## Modules
//!
//! - `app`: Application state, router and session middleware
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
