//! Authentication module for resolving connections to player identities.
//!
//! Tokens are issued elsewhere. This module only checks them:
//! - HS256 shared-secret JWTs
//! - `userId` claim as string or number, optional `username`
//! - Configurable `exp` requirement
//!
//! ## Example
//!
//! ```no_run
//! use live_poker::auth::{IdentityVerifier, JwtVerifier};
//!
//! let verifier = JwtVerifier::new("a_shared_secret_of_at_least_32_chars", true);
//! match verifier.verify("eyJhbGciOi...") {
//!     Ok(identity) => println!("connected: {}", identity.player_id),
//!     Err(e) => println!("rejected: {}", e.client_message()),
//! }
//! ```

pub mod errors;
pub mod models;
pub mod verifier;

pub use errors::{AuthError, AuthResult};
pub use models::{AccessTokenClaims, Identity};
pub use verifier::{IdentityVerifier, JwtVerifier, sign_access_token};
