/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `tasks`: Task catalog, GitHub status and completion
/// - `payment`: Reward claim submission and status

pub mod health;
pub mod payment;
pub mod tasks;
