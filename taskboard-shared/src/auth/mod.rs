/// Authentication utilities
///
/// This module provides the authentication primitives both Taskboard services
/// rely on:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Credential issuer/verifier (HS256 tokens with rotating key ids)
/// - [`middleware`]: Bearer token extraction and the per-request `AuthContext`
///
/// # Trust Model
///
/// Tokens are minted once by the identity service at login or registration.
/// Afterwards every service holding the shared signing secret verifies them
/// locally; no session store and no call back to the issuer.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::jwt::{SigningKey, TokenKeys};
/// use taskboard_shared::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let keys = TokenKeys::new(SigningKey::new("v1", "a-shared-secret-of-at-least-32-bytes"));
/// let token = keys.issue(Uuid::new_v4(), "user@example.com", Role::Member)?;
/// let identity = keys.verify(&token)?;
/// assert_eq!(identity.email, "user@example.com");
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
