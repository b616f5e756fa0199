/// API route handlers
///
/// - `health`: Liveness and store connectivity
/// - `auth`: Registration and login (public)
/// - `users`: Identity lookup and profile management (bearer token)

pub mod auth;
pub mod health;
pub mod users;
