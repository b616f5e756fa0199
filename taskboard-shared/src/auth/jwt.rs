/// Credential issuer and verifier
///
/// Tokens are HS256 JWTs carrying the subject's id, email and role. Both
/// services hold the same signing keys (injected through configuration), so
/// verification is a pure local computation: signature, issuer and expiry
/// are checked without any network call.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: Fixed window per `TokenKeys` (default 24 hours)
/// - **Validation**: Signature, expiration, not-before and issuer checks
/// - **Rotation**: The signing key id is written to the JWT `kid` header.
///   Retired keys stay accepted for verification until removed from config.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::jwt::{SigningKey, TokenKeys, VerificationError};
/// use taskboard_shared::models::user::Role;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let keys = TokenKeys::new(SigningKey::new("v1", "your-secret-key-at-least-32-bytes"));
/// let user_id = Uuid::new_v4();
///
/// let token = keys.issue(user_id, "user@example.com", Role::Member)?;
/// let identity = keys.verify(&token)?;
/// assert_eq!(identity.id, user_id);
///
/// let other = TokenKeys::new(SigningKey::new("v1", "a-completely-different-secret-value"));
/// assert_eq!(other.verify(&token).unwrap_err(), VerificationError::InvalidSignature);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header,
    Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::user::Role;

/// Issuer written into and required from every token
pub const ISSUER: &str = "taskboard";

/// Default token lifetime in hours
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Error type for token issuance
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),
}

/// Reasons a presented token is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    /// Tampered, signed with another secret, unknown key id or foreign issuer
    #[error("Token signature is invalid")]
    InvalidSignature,

    /// Past its expiry
    #[error("Token has expired")]
    Expired,

    /// Structurally unparseable
    #[error("Token is malformed: {0}")]
    Malformed(String),
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (identity ID)
/// - `iss`: Issuer (always "taskboard")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
/// - `nbf`: Not before timestamp
///
/// # Custom Claims
///
/// - `email`: Subject email at issuance time
/// - `role`: Subject role at issuance time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - identity ID
    pub sub: Uuid,

    /// Subject email
    pub email: String,

    /// Subject role
    pub role: Role,

    /// Issuer - Always "taskboard"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims expiring `expires_in` from now
    pub fn new(user_id: Uuid, email: impl Into<String>, role: Role, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            email: email.into(),
            role,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Identity carried by these claims
    pub fn identity(&self) -> VerifiedIdentity {
        VerifiedIdentity {
            id: self.sub,
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// The subject of a successfully verified token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    /// Identity ID
    pub id: Uuid,

    /// Email at issuance time
    pub email: String,

    /// Role at issuance time
    pub role: Role,
}

/// A named HMAC secret
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    secret: String,
}

impl SigningKey {
    /// Creates a signing key with the given key id
    pub fn new(kid: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            kid: kid.into(),
            secret: secret.into(),
        }
    }

    /// Key id written to the JWT header
    pub fn kid(&self) -> &str {
        &self.kid
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Signing and verification keys shared by both services
///
/// New tokens are always signed with `current`. Verification picks the key
/// named by the token's `kid` header among `current` and `previous`; tokens
/// without a `kid` are checked against `current`.
#[derive(Debug, Clone)]
pub struct TokenKeys {
    current: SigningKey,
    previous: Vec<SigningKey>,
    ttl: Duration,
}

impl TokenKeys {
    /// Creates keys with the default token lifetime and no retired keys
    pub fn new(current: SigningKey) -> Self {
        Self {
            current,
            previous: Vec::new(),
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
        }
    }

    /// Adds retired keys that remain valid for verification
    pub fn with_previous(mut self, previous: Vec<SigningKey>) -> Self {
        self.previous = previous;
        self
    }

    /// Overrides the token lifetime
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Token lifetime applied by [`TokenKeys::issue`]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for a verified identity
    ///
    /// # Errors
    ///
    /// Returns `JwtError::CreateError` if encoding fails
    pub fn issue(&self, user_id: Uuid, email: &str, role: Role) -> Result<String, JwtError> {
        let claims = Claims::new(user_id, email, role, self.ttl);
        self.sign(&claims)
    }

    /// Signs arbitrary claims with the current key
    pub fn sign(&self, claims: &Claims) -> Result<String, JwtError> {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(self.current.kid.clone());
        let key = EncodingKey::from_secret(self.current.secret.as_bytes());

        encode(&header, claims, &key)
            .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
    }

    /// Verifies a token and returns its subject
    pub fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerificationError> {
        self.decode_claims(token).map(|claims| claims.identity())
    }

    /// Verifies a token and returns the full claims
    ///
    /// Verifies:
    /// - Signature is valid for the key named by `kid`
    /// - Token hasn't expired (no leeway)
    /// - Issuer is "taskboard"
    /// - Token is not used before nbf time
    pub fn decode_claims(&self, token: &str) -> Result<Claims, VerificationError> {
        let header = decode_header(token)
            .map_err(|e| VerificationError::Malformed(format!("Invalid header: {}", e)))?;

        let signing_key = self
            .key_for(header.kid.as_deref())
            .ok_or(VerificationError::InvalidSignature)?;
        let key = DecodingKey::from_secret(signing_key.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // No grace period past `exp`
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => VerificationError::Expired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAlgorithm => VerificationError::InvalidSignature,
            _ => VerificationError::Malformed(e.to_string()),
        })?;

        Ok(token_data.claims)
    }

    fn key_for(&self, kid: Option<&str>) -> Option<&SigningKey> {
        match kid {
            None => Some(&self.current),
            Some(kid) => std::iter::once(&self.current)
                .chain(self.previous.iter())
                .find(|key| key.kid == kid),
        }
    }
}
