/// Database models for TaskClaim
///
/// Each model owns its SQL. Handlers and the workflow layer never write SQL
/// of their own.
///
/// # Models
///
/// - `user`: Identities referenced by session tokens
/// - `account`: OAuth accounts linked to a user (the credential store)
/// - `task`: Catalog of required GitHub actions
/// - `completion`: Per-user task completion records
/// - `payment_request`: Reward claims and their review lifecycle

pub mod account;
pub mod completion;
pub mod payment_request;
pub mod task;
pub mod user;
