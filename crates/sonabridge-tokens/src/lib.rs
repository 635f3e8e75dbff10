//! Credential and token lifecycle for the sonabridge smart-speaker platform.
//!
//! The platform holds a durable, revocable handle to a user's backend session
//! without ever re-sending raw credentials. This crate provides:
//!
//! - [`AccessTokenCache`] — short-lived, deterministic access tokens minted
//!   from caller-supplied auth tokens, with sweep-on-mint expiry
//! - [`SessionTokenCodec`] — issues and verifies signed session tokens that
//!   wrap an opaque service token, distinguishing expired-but-refreshable
//!   from permanently invalid
//! - [`Clock`] — injectable time source so every expiry decision is
//!   deterministic under test
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use chrono::Duration;
//! use sonabridge_tokens::{SessionTokenCodec, SystemClock, VerificationOutcome};
//!
//! let codec = SessionTokenCodec::new(Arc::new(SystemClock), "secret", Duration::hours(1));
//! let token = codec.issue("svc-abc")?;
//! match codec.verify(&token) {
//!     VerificationOutcome::Valid { service_token } => { /* use it */ }
//!     VerificationOutcome::Expired { service_token, .. } => { /* re-issue */ }
//!     VerificationOutcome::Invalid { .. } => { /* force re-auth */ }
//! }
//! ```

mod access_cache;
mod clock;
mod codec;
mod error;

pub use access_cache::{AccessTokenCache, AccessTokenEntry, Minter};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{
    KeyGenerator, PROTOCOL_VERSION, SessionToken, SessionTokenCodec, TokenVerifier,
    VerificationOutcome,
};
pub use error::{Result, TokenError};
