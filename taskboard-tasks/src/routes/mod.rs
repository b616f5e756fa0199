/// API route handlers
///
/// - `health`: Liveness and store connectivity
/// - `tasks`: Task CRUD, per-user views and stats (bearer token)

pub mod health;
pub mod tasks;
