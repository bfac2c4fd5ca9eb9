//! End-to-end token lifecycle over the public API: real files, a real
//! (temp) IDE auth slot, no network.

use kiroswitch::kiro;
use kiroswitch::token::{TokenRecord, TokenService, TokenStore};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static NEXT_TMP_ID: AtomicU64 = AtomicU64::new(1);

fn temp_root() -> PathBuf {
    let mut root = std::env::temp_dir();
    let id = NEXT_TMP_ID.fetch_add(1, Ordering::Relaxed);
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    root.push(format!("kiroswitch-lifecycle-{id}-{now}"));
    let _ = std::fs::create_dir_all(&root);
    root
}

fn record(account_name: &str, refresh_token: &str, expires_at: &str) -> TokenRecord {
    let mut extra = BTreeMap::new();
    extra.insert(
        "idToken".to_string(),
        serde_json::Value::String(format!("id-{account_name}")),
    );
    TokenRecord {
        access_token: format!("access-{account_name}"),
        refresh_token: refresh_token.to_string(),
        expires_at: expires_at.to_string(),
        token_type: "Bearer".into(),
        client_id_hash: Some(kiro::issuer_binding_hash("https://view.awsapps.com/start")),
        account_name: account_name.to_string(),
        email: Some(format!("{account_name}@mail.test")),
        provider: "BuilderId".into(),
        auth_method: "IdC".into(),
        region: "us-east-1".into(),
        created_at: None,
        client_id: Some("client-id".into()),
        client_secret: Some("client-secret".into()),
        extra,
    }
}

// Verifies the full switch cycle: persist two accounts, activate each in
// turn, and watch the derived active pointer follow the IDE auth file.
#[tokio::test]
async fn switching_accounts_moves_the_active_pointer() {
    let root = temp_root();
    let store = TokenStore::new(root.join("tokens"));
    let service = TokenService::new(store.clone(), root.join("ide/kiro-auth-token.json"));

    let first = store
        .save_new(&record("work", "refresh-work", "2099-01-01T00:00:00Z"))
        .expect("save first");
    let second = store
        .save_new(&record("personal", "refresh-personal", "2099-01-01T00:00:00Z"))
        .expect("save second");

    assert!(service.current().is_none(), "fresh install has no active account");

    service.activate(&first, false).await.expect("activate first");
    assert_eq!(service.current().expect("active").file_name, first);

    service.activate(&second, false).await.expect("activate second");
    let current = service.current().expect("active");
    assert_eq!(current.file_name, second);
    assert_eq!(current.record.email.as_deref(), Some("personal@mail.test"));

    // Exactly one record matches the IDE secret at any time.
    let active_count = service
        .list()
        .into_iter()
        .filter(|token| {
            service
                .current()
                .map(|current| current.file_name == token.file_name)
                .unwrap_or(false)
        })
        .count();
    assert_eq!(active_count, 1);
}

// Verifies unknown provider fields survive the full disk round trip
// through the store, not just in-memory serde.
#[test]
fn unknown_fields_survive_disk_round_trip() {
    let root = temp_root();
    let store = TokenStore::new(root.join("tokens"));
    let original = record("passthrough", "refresh-pt", "2099-01-01T00:00:00Z");
    let file_name = store.save_new(&original).expect("save");

    let loaded = store.load(&file_name).expect("load");
    assert_eq!(loaded.record, original);
    assert_eq!(
        loaded.record.extra.get("idToken"),
        Some(&serde_json::Value::String("id-passthrough".into()))
    );
}

// Verifies expired cleanup across a mixed directory leaves live and
// unreadable files alone.
#[test]
fn cleanup_only_touches_expired_records() {
    let root = temp_root();
    let tokens_dir = root.join("tokens");
    let store = TokenStore::new(&tokens_dir);
    let service = TokenService::new(store.clone(), root.join("ide/kiro-auth-token.json"));

    store
        .save_new(&record("live", "refresh-live", "2099-01-01T00:00:00Z"))
        .expect("save live");
    store
        .save_new(&record("stale-a", "refresh-a", "2020-01-01T00:00:00Z"))
        .expect("save stale-a");
    store
        .save_new(&record("stale-b", "refresh-b", "2020-06-01T00:00:00"))
        .expect("save stale-b");
    let corrupt = tokens_dir.join("token-BuilderId-IdC-corrupt-99.json");
    std::fs::write(&corrupt, "{definitely not json").expect("write corrupt file");

    assert_eq!(service.delete_all_expired(), 2);
    assert!(corrupt.exists());

    let remaining = service.list();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].record.account_name, "live");
}

// Verifies naive and timezone-aware expiries order identically when
// resolving the best record.
#[test]
fn best_record_handles_mixed_timestamp_forms() {
    let root = temp_root();
    let store = TokenStore::new(root.join("tokens"));
    let service = TokenService::new(store, root.join("ide/kiro-auth-token.json"));

    let mut naive_live = record("naive-live", "refresh-n", "2099-06-01T00:00:00");
    naive_live.created_at = Some("2026-01-01T00:00:00".into());
    let mut aware_dead = record("aware-dead", "refresh-d", "2020-06-01T00:00:00Z");
    aware_dead.created_at = Some("2026-05-01T00:00:00Z".into());

    service.store().save_new(&naive_live).expect("save naive");
    service.store().save_new(&aware_dead).expect("save aware");

    // The newer record is expired, so the naive-timestamped live one wins.
    let best = service.best().expect("best record");
    assert_eq!(best.record.account_name, "naive-live");
}
