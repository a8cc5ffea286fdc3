use chrono::{Duration, Utc};

use dropshare_core::{
    FileDescriptor, Session, SessionId, SessionKey, ShareCode, ShareKind, SharePayload,
};

use crate::error::StateError;
use crate::store::SessionStore;

fn live_text(code: &str, text: &str) -> Session {
    Session::new(
        ShareCode::new(code),
        SharePayload::Text(text.to_owned()),
        Duration::minutes(5),
        Utc::now(),
    )
}

fn expired_text(code: &str) -> Session {
    Session::new(
        ShareCode::new(code),
        SharePayload::Text("stale".to_owned()),
        Duration::minutes(5),
        Utc::now() - Duration::minutes(10),
    )
}

fn file_created_at(code: &str, created_at: chrono::DateTime<Utc>) -> Session {
    Session::new(
        ShareCode::new(code),
        SharePayload::File(FileDescriptor {
            storage_path: format!("1700000000000-{code}.txt"),
            original_name: "a.txt".to_owned(),
            size_bytes: 5,
            mime_type: "text/plain".to_owned(),
        }),
        Duration::minutes(5),
        created_at,
    )
}

fn live_file(code: &str) -> Session {
    file_created_at(code, Utc::now())
}

fn key(kind: ShareKind, code: &str) -> SessionKey {
    SessionKey::new(kind, ShareCode::new(code))
}

/// Run the full session store conformance test suite.
///
/// Call this from your backend's test module with a fresh store instance.
/// The store must read the system clock.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(store: &dyn SessionStore) -> Result<(), StateError> {
    test_find_missing(store).await?;
    test_create_and_find(store).await?;
    test_create_conflict(store).await?;
    test_create_replaces_expired(store).await?;
    test_create_keeps_expired_file(store).await?;
    test_kind_isolation(store).await?;
    test_take_once(store).await?;
    test_take_expired(store).await?;
    test_conditional_delete(store).await?;
    test_file_payload(store).await?;
    test_concurrent_take(store).await?;
    test_purge_expired(store).await?;
    Ok(())
}

async fn test_find_missing(store: &dyn SessionStore) -> Result<(), StateError> {
    let found = store.find(&key(ShareKind::Text, "missing")).await?;
    assert!(found.is_none(), "find on missing key should return None");
    let taken = store.take(&key(ShareKind::Text, "missing")).await?;
    assert!(taken.is_none(), "take on missing key should return None");
    Ok(())
}

async fn test_create_and_find(store: &dyn SessionStore) -> Result<(), StateError> {
    let session = live_text("find01", "hello");
    assert!(store.create(&session).await?, "create on free key should succeed");

    let found = store.find(&session.key()).await?;
    assert_eq!(found.as_ref(), Some(&session));

    let again = store.find(&session.key()).await?;
    assert!(again.is_some(), "find must not consume the session");
    Ok(())
}

async fn test_create_conflict(store: &dyn SessionStore) -> Result<(), StateError> {
    let first = live_text("dup001", "first");
    let second = live_text("dup001", "second");
    assert!(store.create(&first).await?);
    assert!(
        !store.create(&second).await?,
        "create over a live session should return false"
    );

    let found = store.find(&first.key()).await?;
    assert_eq!(
        found.map(|s| s.id),
        Some(first.id),
        "original session should remain"
    );
    Ok(())
}

async fn test_create_replaces_expired(store: &dyn SessionStore) -> Result<(), StateError> {
    let stale = expired_text("reuse1");
    assert!(store.create(&stale).await?);
    assert!(
        store.find(&stale.key()).await?.is_none(),
        "expired session must not be found"
    );

    let fresh = live_text("reuse1", "fresh");
    assert!(
        store.create(&fresh).await?,
        "create over an expired session should succeed"
    );
    let found = store.find(&fresh.key()).await?;
    assert_eq!(found.map(|s| s.id), Some(fresh.id));
    Ok(())
}

async fn test_create_keeps_expired_file(store: &dyn SessionStore) -> Result<(), StateError> {
    let stale = file_created_at("keep01", Utc::now() - Duration::minutes(10));
    assert!(store.create(&stale).await?);

    let fresh = live_file("keep01");
    assert!(
        !store.create(&fresh).await?,
        "an expired file session must wait for purge"
    );

    let purged = store.purge_expired(Utc::now()).await?;
    assert!(
        purged.iter().any(|s| s.id == stale.id),
        "purge should hand back the expired file session"
    );

    assert!(store.create(&fresh).await?, "create after purge should succeed");
    let taken = store.take(&fresh.key()).await?;
    assert_eq!(taken.map(|s| s.id), Some(fresh.id));
    Ok(())
}

async fn test_kind_isolation(store: &dyn SessionStore) -> Result<(), StateError> {
    let session = live_text("kind01", "only text");
    assert!(store.create(&session).await?);

    assert!(store.find(&key(ShareKind::Link, "kind01")).await?.is_none());
    assert!(store.take(&key(ShareKind::File, "kind01")).await?.is_none());
    assert!(
        store.find(&session.key()).await?.is_some(),
        "lookups under other kinds must not touch the session"
    );

    let link = Session::new(
        ShareCode::new("kind01"),
        SharePayload::Link("https://example.com".to_owned()),
        Duration::minutes(5),
        Utc::now(),
    );
    assert!(
        store.create(&link).await?,
        "the same code may be live under another kind"
    );
    Ok(())
}

async fn test_take_once(store: &dyn SessionStore) -> Result<(), StateError> {
    let session = live_text("take01", "once");
    assert!(store.create(&session).await?);

    let taken = store.take(&session.key()).await?;
    assert_eq!(taken.as_ref(), Some(&session));

    assert!(store.take(&session.key()).await?.is_none(), "second take should miss");
    assert!(store.find(&session.key()).await?.is_none(), "taken session is gone");
    Ok(())
}

async fn test_take_expired(store: &dyn SessionStore) -> Result<(), StateError> {
    let stale = expired_text("take02");
    assert!(store.create(&stale).await?);
    assert!(
        store.take(&stale.key()).await?.is_none(),
        "take must not return an expired session"
    );
    Ok(())
}

async fn test_conditional_delete(store: &dyn SessionStore) -> Result<(), StateError> {
    let session = live_text("del001", "bye");
    assert!(store.create(&session).await?);

    let other = SessionId::generate();
    assert!(
        !store.delete(&session.key(), &other).await?,
        "delete with a foreign id should not remove the session"
    );
    assert!(store.find(&session.key()).await?.is_some());

    assert!(store.delete(&session.key(), &session.id).await?);
    assert!(store.find(&session.key()).await?.is_none());

    assert!(
        !store.delete(&session.key(), &session.id).await?,
        "delete on a missing record should return false"
    );
    Ok(())
}

async fn test_file_payload(store: &dyn SessionStore) -> Result<(), StateError> {
    let session = live_file("file01");
    assert!(store.create(&session).await?);

    let taken = store.take(&key(ShareKind::File, "file01")).await?;
    let taken = taken.expect("file session should be found");
    assert_eq!(taken.payload, session.payload);
    Ok(())
}

async fn test_concurrent_take(store: &dyn SessionStore) -> Result<(), StateError> {
    let session = live_text("race01", "contended");
    assert!(store.create(&session).await?);

    let session_key = session.key();
    let attempts = (0..16).map(|_| store.take(&session_key));
    let results = futures::future::join_all(attempts).await;

    let mut winners = 0;
    for result in results {
        if result?.is_some() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1, "exactly one concurrent take should win");
    Ok(())
}

async fn test_purge_expired(store: &dyn SessionStore) -> Result<(), StateError> {
    let stale = expired_text("purge1");
    let live = live_text("purge2", "keep");
    assert!(store.create(&stale).await?);
    assert!(store.create(&live).await?);

    let purged = store.purge_expired(Utc::now()).await?;
    assert!(
        purged.iter().any(|s| s.id == stale.id),
        "expired session should be purged"
    );
    assert!(
        purged.iter().all(|s| s.id != live.id),
        "live session must survive the purge"
    );

    let again = store.purge_expired(Utc::now()).await?;
    assert!(again.iter().all(|s| s.id != stale.id), "purge is not repeated");

    assert!(store.find(&live.key()).await?.is_some());
    assert!(store.len().await? >= 1);
    Ok(())
}
