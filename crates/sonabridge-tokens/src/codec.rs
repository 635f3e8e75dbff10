//! Signed session tokens wrapping an opaque backend service token.
//!
//! The platform is handed the opaque wire form of a [`SessionToken`] and
//! returns it on every call. Verification is a total function returning
//! [`VerificationOutcome`] — a closed sum, never an error — because the three
//! outcomes have different recovery semantics: `Valid` proceeds, `Expired`
//! can be silently re-issued from the recovered service token, `Invalid`
//! forces re-authentication.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::error::{Result, TokenError};

/// Current signing protocol version.
///
/// Bumping this invalidates every previously issued session token, giving a
/// deterministic fleet-wide rotation on top of the shared secret.
pub const PROTOCOL_VERSION: u32 = 1;

/// Generator for the per-token signing key component.
pub type KeyGenerator = Box<dyn Fn() -> String + Send + Sync>;

/// Signed envelope proving possession of a service token for a bounded time.
///
/// `per_token_key` is mixed into the signing secret at issue time and must be
/// presented again at verification. Discarding the key invalidates that one
/// token without rotating the shared secret — a lightweight alternative to a
/// revocation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub signed_payload: String,
    pub per_token_key: String,
}

impl SessionToken {
    /// Opaque wire form handed to the platform.
    pub fn encode(&self) -> String {
        serde_json::json!({
            "signedPayload": self.signed_payload,
            "perTokenKey": self.per_token_key,
        })
        .to_string()
    }

    /// Parse the wire form produced by [`encode`](Self::encode).
    ///
    /// Unknown fields are dropped. An empty or blank input signals a missing
    /// credential, distinct from a malformed one.
    pub fn decode(encoded: &str) -> Result<Self> {
        let trimmed = encoded.trim();
        if trimmed.is_empty() {
            return Err(TokenError::MissingCredential);
        }
        serde_json::from_str(trimmed).map_err(|e| TokenError::Invalid {
            reason: format!("malformed session token: {e}"),
        })
    }
}

/// Outcome of verifying a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// Signature and expiry check out.
    Valid { service_token: String },

    /// Signature checks out but the expiry has passed. The embedded service
    /// token is recovered so callers can re-issue without forcing the end
    /// user to re-authenticate.
    Expired {
        service_token: String,
        /// Unix timestamp at which the token expired.
        expired_at: i64,
    },

    /// Signature, format, version, or key mismatch. Terminal.
    Invalid { reason: String },
}

impl VerificationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationOutcome::Valid { .. })
    }

    /// The embedded service token, when the signature verified.
    pub fn service_token(&self) -> Option<&str> {
        match self {
            VerificationOutcome::Valid { service_token }
            | VerificationOutcome::Expired { service_token, .. } => Some(service_token),
            VerificationOutcome::Invalid { .. } => None,
        }
    }

    /// Convert into a `Result` for call sites that treat anything but
    /// `Valid` as an error.
    pub fn into_result(self) -> Result<String> {
        match self {
            VerificationOutcome::Valid { service_token } => Ok(service_token),
            VerificationOutcome::Expired {
                service_token,
                expired_at,
            } => Err(TokenError::Expired {
                service_token,
                expired_at,
            }),
            VerificationOutcome::Invalid { reason } => Err(TokenError::Invalid { reason }),
        }
    }
}

/// Capability consumed by storage sweeps: anything that can verify a token.
pub trait TokenVerifier: Send + Sync {
    fn verify(&self, token: &SessionToken) -> VerificationOutcome;
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    /// The wrapped service token.
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies signed session tokens.
///
/// The effective signing secret is `shared_secret ‖ version ‖ per_token_key`;
/// changing any of the three invalidates all tokens issued under the old
/// material.
pub struct SessionTokenCodec {
    clock: Arc<dyn Clock>,
    shared_secret: String,
    expires_in: Duration,
    version: u32,
    key_generator: KeyGenerator,
}

impl SessionTokenCodec {
    /// Create a codec with the default random key generator and
    /// [`PROTOCOL_VERSION`].
    pub fn new(clock: Arc<dyn Clock>, shared_secret: impl Into<String>, expires_in: Duration) -> Self {
        Self {
            clock,
            shared_secret: shared_secret.into(),
            expires_in,
            version: PROTOCOL_VERSION,
            key_generator: Box::new(generate_per_token_key),
        }
    }

    /// Override the protocol version. Tokens verify only under the version
    /// they were issued with.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Override the per-token key generator.
    pub fn with_key_generator(mut self, generator: KeyGenerator) -> Self {
        self.key_generator = generator;
        self
    }

    /// Issue a session token for `service_token`, expiring `expires_in`
    /// from now.
    pub fn issue(&self, service_token: &str) -> Result<SessionToken> {
        let per_token_key = (self.key_generator)();
        let issued_at = self.clock.now().timestamp();
        let claims = SessionClaims {
            sub: service_token.to_string(),
            iat: issued_at,
            exp: issued_at + self.expires_in.num_seconds(),
        };

        let secret = self.effective_secret(&per_token_key);
        let signed_payload = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(SessionToken {
            signed_payload,
            per_token_key,
        })
    }

    /// Verify a session token against the caller-supplied per-token key.
    pub fn verify(&self, token: &SessionToken) -> VerificationOutcome {
        let secret = self.effective_secret(&token.per_token_key);

        // Expiry is checked against the injected clock below, so the
        // library's wall-clock expiry validation stays off.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let decoded = decode::<SessionClaims>(
            &token.signed_payload,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        );

        match decoded {
            Ok(data) => {
                let claims = data.claims;
                if self.clock.now().timestamp() >= claims.exp {
                    VerificationOutcome::Expired {
                        service_token: claims.sub,
                        expired_at: claims.exp,
                    }
                } else {
                    VerificationOutcome::Valid {
                        service_token: claims.sub,
                    }
                }
            }
            Err(e) => VerificationOutcome::Invalid {
                reason: e.to_string(),
            },
        }
    }

    fn effective_secret(&self, per_token_key: &str) -> String {
        format!("{}{}{}", self.shared_secret, self.version, per_token_key)
    }
}

impl TokenVerifier for SessionTokenCodec {
    fn verify(&self, token: &SessionToken) -> VerificationOutcome {
        SessionTokenCodec::verify(self, token)
    }
}

impl std::fmt::Debug for SessionTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenCodec")
            .field("expires_in", &self.expires_in)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Default per-token key: 32 random bytes, base64url.
fn generate_per_token_key() -> String {
    let mut key_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut key_bytes);
    URL_SAFE_NO_PAD.encode(key_bytes)
}
