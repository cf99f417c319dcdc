//! Credential and session-token primitives for the identity service.
//!
//! - Password hashing and comparison (Argon2id, PHC strings, explicit salts)
//! - Session tokens (HS256 JWT) with a configured lifetime
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let salt = hasher.random_salt();
//! let hash = hasher.hash_with_salt("my_password", &salt).unwrap();
//! assert!(hasher.verify("my_password", &hash));
//! assert!(!hasher.verify("other", &hash));
//! ```
//!
//! ## Session Tokens
//! ```
//! use auth::TokenIssuer;
//!
//! let issuer = TokenIssuer::new(b"secret_key_at_least_32_bytes_long!", "1d".parse().unwrap());
//! let token = issuer.issue("user123").unwrap();
//! let claims = issuer.decode(&token).unwrap();
//! assert_eq!(claims.sub, "user123");
//! assert_eq!(claims.expires_in, "1d");
//! ```

pub mod issuer;
pub mod jwt;
pub mod password;

pub use issuer::TokenIssuer;
pub use jwt::JwtError;
pub use jwt::SessionClaims;
pub use jwt::TokenLifetime;
pub use jwt::TokenSigner;
pub use password::PasswordError;
pub use password::PasswordHasher;
