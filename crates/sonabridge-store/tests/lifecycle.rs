//! End-to-end session token lifecycle across persistence backends.
//!
//! Issue a token, persist it under the platform's lookup key, reopen the
//! store, verify, then sweep — the same sequence the bridge runs between a
//! speaker registering and an administrative cleanup.

use std::sync::Arc;

use chrono::{DateTime, Duration};
use sonabridge_store::{
    FileTokenStore, MemoryTokenStore, SessionTokenStore, SqliteTokenStore, StoreConfig, open_store,
};
use sonabridge_tokens::{ManualClock, SessionToken, SessionTokenCodec, VerificationOutcome};

fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
    ))
}

fn codec(clock: Arc<ManualClock>) -> SessionTokenCodec {
    SessionTokenCodec::new(clock, "bridge-secret", Duration::minutes(60))
}

#[test]
fn issue_persist_reopen_verify_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tokens.json");
    let clock = manual_clock();
    let codec = codec(clock.clone());

    let token = codec.issue("navidrome-session-1").unwrap();
    let wire = token.encode();

    {
        let mut store = FileTokenStore::open(&path).unwrap();
        store.set("sonos-token-1", token);
    }

    // The platform hands back the wire form; the store carries the rest.
    let store = FileTokenStore::open(&path).unwrap();
    let stored = store.get("sonos-token-1").unwrap();
    assert_eq!(stored, SessionToken::decode(&wire).unwrap());

    assert_eq!(
        codec.verify(&stored),
        VerificationOutcome::Valid {
            service_token: "navidrome-session-1".to_string()
        }
    );
}

#[test]
fn issue_persist_reopen_verify_sqlite() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tokens.db");
    let clock = manual_clock();
    let codec = codec(clock.clone());

    let token = codec.issue("navidrome-session-1").unwrap();

    {
        let mut store = SqliteTokenStore::open(&path).unwrap();
        store.set("sonos-token-1", token);
        store.close();
    }

    let store = SqliteTokenStore::open(&path).unwrap();
    let stored = store.get("sonos-token-1").unwrap();
    assert!(codec.verify(&stored).is_valid());
}

#[test]
fn cleanup_sweeps_expired_and_foreign_tokens() {
    let clock = manual_clock();
    let codec = codec(clock.clone());
    let mut store = MemoryTokenStore::new();

    // One token issued an hour before the other two.
    store.set("old", codec.issue("svc-old").unwrap());
    clock.advance(Duration::minutes(61));
    store.set("fresh", codec.issue("svc-fresh").unwrap());
    store.set(
        "foreign",
        SessionToken {
            signed_payload: "issued-by-someone-else".to_string(),
            per_token_key: "nope".to_string(),
        },
    );

    let removed = store.cleanup_expired(&codec);

    assert_eq!(removed, 2);
    let surviving = store.get_all();
    assert_eq!(surviving.len(), 1);
    assert!(surviving.contains_key("fresh"));
}

#[test]
fn cleanup_policy_is_uniform_across_backends() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = manual_clock();
    let codec = codec(clock.clone());

    let mut stores: Vec<Box<dyn SessionTokenStore>> = vec![
        open_store(&StoreConfig::Memory).unwrap(),
        open_store(&StoreConfig::File {
            path: tmp.path().join("tokens.json"),
        })
        .unwrap(),
        open_store(&StoreConfig::Sqlite {
            path: tmp.path().join("tokens.db"),
        })
        .unwrap(),
    ];

    for store in &mut stores {
        store.set("expiring", codec.issue("svc").unwrap());
    }

    clock.advance(Duration::minutes(61));

    for store in &mut stores {
        assert_eq!(store.cleanup_expired(&codec), 1);
        assert!(store.get_all().is_empty());
    }
}

#[test]
fn expired_token_refresh_flow() {
    let clock = manual_clock();
    let codec = codec(clock.clone());
    let mut store = MemoryTokenStore::new();

    store.set("sonos-token-1", codec.issue("navidrome-session-1").unwrap());
    clock.advance(Duration::minutes(61));

    // Verification recovers the service token from the expired envelope,
    // letting the bridge re-issue without a fresh login.
    let stale = store.get("sonos-token-1").unwrap();
    let outcome = codec.verify(&stale);
    let VerificationOutcome::Expired { service_token, .. } = outcome else {
        panic!("expected Expired, got {outcome:?}");
    };

    let refreshed = codec.issue(&service_token).unwrap();
    store.set("sonos-token-1", refreshed);

    let outcome = codec.verify(&store.get("sonos-token-1").unwrap());
    assert_eq!(
        outcome,
        VerificationOutcome::Valid {
            service_token: "navidrome-session-1".to_string()
        }
    );
}

#[test]
fn json_to_sqlite_migration_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    let json_path = tmp.path().join("tokens.json");
    let db_path = tmp.path().join("tokens.db");
    let clock = manual_clock();
    let codec = codec(clock.clone());

    {
        let mut file_store = FileTokenStore::open(&json_path).unwrap();
        file_store.set("sonos-token-1", codec.issue("svc-1").unwrap());
        file_store.set("sonos-token-2", codec.issue("svc-2").unwrap());
    }

    let mut sql_store = SqliteTokenStore::open(&db_path).unwrap();
    let migrated = sql_store.migrate_from_json(&json_path).unwrap();

    assert_eq!(migrated, 2);
    assert!(!json_path.exists());
    assert!(tmp.path().join("tokens.json.bak").exists());

    // Migrated tokens still verify.
    let token = sql_store.get("sonos-token-1").unwrap();
    assert_eq!(codec.verify(&token).service_token(), Some("svc-1"));

    // Running again finds no source, migrates nothing.
    assert_eq!(sql_store.migrate_from_json(&json_path).unwrap(), 0);
}
