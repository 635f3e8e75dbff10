//! Backend-agnostic contract for session token persistence.

use std::collections::HashMap;

use sonabridge_tokens::{SessionToken, TokenVerifier, VerificationOutcome};
use tracing::debug;

/// Durable mapping from an external lookup key to a [`SessionToken`].
///
/// Lookup keys are caller-chosen and unique per record; `set` is
/// last-write-wins. Implementations do no internal locking — callers needing
/// concurrent access must serialize calls to a given store instance.
pub trait SessionTokenStore: Send {
    /// Fetch the token stored under `lookup_key`, if any.
    fn get(&self, lookup_key: &str) -> Option<SessionToken>;

    /// Idempotent upsert.
    fn set(&mut self, lookup_key: &str, token: SessionToken);

    /// Idempotent delete; absent keys are a no-op.
    fn delete(&mut self, lookup_key: &str);

    /// Snapshot of every stored record.
    fn get_all(&self) -> HashMap<String, SessionToken>;

    /// Remove every record whose token no longer verifies as `Valid`,
    /// returning the number removed.
    ///
    /// Both `Expired` and `Invalid` records are removed. This sweep is the
    /// only bound on storage growth, and a caller refreshing an expired token
    /// does so at verification time, while the token is still in hand — not
    /// from the store after a sweep. Provided here so the policy cannot
    /// diverge between backends.
    fn cleanup_expired(&mut self, verifier: &dyn TokenVerifier) -> usize {
        let mut removed = 0;
        for (lookup_key, token) in self.get_all() {
            match verifier.verify(&token) {
                VerificationOutcome::Valid { .. } => {}
                VerificationOutcome::Expired { .. } | VerificationOutcome::Invalid { .. } => {
                    self.delete(&lookup_key);
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            debug!("Removed {} dead session tokens", removed);
        }
        removed
    }
}
