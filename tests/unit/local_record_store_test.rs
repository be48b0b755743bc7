//! Unit tests for the SQLite record store: auth primitives, ownership scoping
//! and the link CRUD contract.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use chrono::Duration;
use common::{creds, local_store, new_link, TEST_ITERATIONS};
use linkvault::database::Database;
use linkvault::services::crypto_service::CryptoService;
use linkvault::services::local_record_store::LocalRecordStore;
use linkvault::services::record_store::RemoteRecordStore;
use linkvault::types::errors::RemoteError;
use linkvault::types::link::LinkPatch;
use linkvault::types::session::AuthChange;

#[tokio::test]
async fn test_sign_up_then_sign_in() {
    let (_db, store) = local_store();

    let registered = store.sign_up(&creds("ana")).await.unwrap();
    assert_eq!(registered.user.email.as_deref(), Some("ana@example.com"));
    assert!(registered.refresh_token.is_some());

    let session = store.sign_in(&creds("ana")).await.unwrap();
    assert_eq!(session.user.id, registered.user.id);
    assert_ne!(session.access_token, registered.access_token);

    let active = store.get_session().await.unwrap().unwrap();
    assert_eq!(active.access_token, session.access_token);
}

#[tokio::test]
async fn test_email_is_normalized() {
    let (_db, store) = local_store();
    store.sign_up(&creds("ana")).await.unwrap();

    let mut shouted = creds("ana");
    shouted.email = "  ANA@Example.com ".to_string();
    assert!(store.sign_in(&shouted).await.is_ok());
}

#[tokio::test]
async fn test_duplicate_sign_up_rejected() {
    let (_db, store) = local_store();
    store.sign_up(&creds("ana")).await.unwrap();

    let err = store.sign_up(&creds("ana")).await.unwrap_err();
    assert_eq!(err, RemoteError::Rejected("User already registered".to_string()));
}

#[tokio::test]
async fn test_wrong_password_and_unknown_user_rejected() {
    let (_db, store) = local_store();
    store.sign_up(&creds("ana")).await.unwrap();

    let mut wrong = creds("ana");
    wrong.password = "nope".to_string();
    assert!(matches!(store.sign_in(&wrong).await, Err(RemoteError::Rejected(_))));
    assert!(matches!(store.sign_in(&creds("bob")).await, Err(RemoteError::Rejected(_))));
}

#[tokio::test]
async fn test_sign_out_clears_active_session_and_notifies() {
    let (_db, store) = local_store();
    let mut changes = store.auth_changes();

    store.sign_up(&creds("ana")).await.unwrap();
    assert!(matches!(changes.recv().await.unwrap(), AuthChange::SignedIn(_)));

    store.sign_out().await.unwrap();
    assert_eq!(changes.recv().await.unwrap(), AuthChange::SignedOut);
    assert!(store.get_session().await.unwrap().is_none());

    // Signing out again is a quiet no-op
    store.sign_out().await.unwrap();
    assert!(changes.try_recv().is_err());
}

#[tokio::test]
async fn test_expired_session_is_dropped() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let store = LocalRecordStore::with_crypto(db, CryptoService::with_iterations(TEST_ITERATIONS))
        .with_session_ttl(Duration::seconds(-1));
    let session = store.sign_up(&creds("ana")).await.unwrap();
    let mut changes = store.auth_changes();

    assert!(store.get_session().await.unwrap().is_none());
    assert_eq!(changes.recv().await.unwrap(), AuthChange::Expired);

    let err = store.select_links(&session).await.unwrap_err();
    assert!(matches!(err, RemoteError::Unauthorized(_)));
}

#[tokio::test]
async fn test_links_listed_newest_first() {
    let (_db, store) = local_store();
    let session = store.sign_up(&creds("ana")).await.unwrap();

    for url in ["https://a.io", "https://b.io", "https://c.io"] {
        store.insert_link(&session, &new_link(url, "Coding")).await.unwrap();
    }

    let urls: Vec<String> = store
        .select_links(&session)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.url)
        .collect();
    assert_eq!(urls, vec!["https://c.io", "https://b.io", "https://a.io"]);
}

#[tokio::test]
async fn test_owner_comes_from_token() {
    let (_db, store) = local_store();
    let ana = store.sign_up(&creds("ana")).await.unwrap();
    let bob = store.sign_up(&creds("bob")).await.unwrap();

    // Claiming Ana's id with Bob's token still writes as Bob
    let mut forged = bob.clone();
    forged.user.id = ana.user.id.clone();
    let link = store.insert_link(&forged, &new_link("https://x.io", "News")).await.unwrap();
    assert_eq!(link.owner_id, bob.user.id);

    assert!(store.select_links(&ana).await.unwrap().is_empty());
    assert_eq!(store.count_links(&bob.user.id).unwrap(), 1);
}

#[tokio::test]
async fn test_foreign_rows_are_invisible_to_writes() {
    let (_db, store) = local_store();
    let ana = store.sign_up(&creds("ana")).await.unwrap();
    let bob = store.sign_up(&creds("bob")).await.unwrap();
    let link = store.insert_link(&ana, &new_link("https://a.io", "Coding")).await.unwrap();

    let err = store
        .update_link(&bob, &link.id, &LinkPatch::category("Social"))
        .await
        .unwrap_err();
    assert_eq!(err, RemoteError::NotFound(link.id.clone()));

    store.delete_link(&bob, &link.id).await.unwrap();
    assert_eq!(store.count_links(&ana.user.id).unwrap(), 1);

    assert_eq!(store.reassign_category(&bob, "Coding", "Uncategorized").await.unwrap(), 0);
}

#[tokio::test]
async fn test_update_applies_only_given_fields() {
    let (_db, store) = local_store();
    let session = store.sign_up(&creds("ana")).await.unwrap();
    let link = store.insert_link(&session, &new_link("https://a.io", "Coding")).await.unwrap();

    let patch = LinkPatch {
        title: Some("Renamed".to_string()),
        icon: Some("https://a.io/icon.png".to_string()),
        ..LinkPatch::default()
    };
    store.update_link(&session, &link.id, &patch).await.unwrap();

    let stored = store.select_links(&session).await.unwrap().remove(0);
    assert_eq!(stored.title, "Renamed");
    assert_eq!(stored.icon.as_deref(), Some("https://a.io/icon.png"));
    assert_eq!(stored.url, "https://a.io");
    assert_eq!(stored.category, "Coding");
    assert_eq!(stored.created_at.timestamp_millis(), link.created_at.timestamp_millis());
}

#[tokio::test]
async fn test_empty_patch_still_reports_missing_rows() {
    let (_db, store) = local_store();
    let session = store.sign_up(&creds("ana")).await.unwrap();
    let link = store.insert_link(&session, &new_link("https://a.io", "Coding")).await.unwrap();

    assert!(store.update_link(&session, &link.id, &LinkPatch::default()).await.is_ok());
    assert!(matches!(
        store.update_link(&session, "missing", &LinkPatch::default()).await,
        Err(RemoteError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (_db, store) = local_store();
    let session = store.sign_up(&creds("ana")).await.unwrap();
    let link = store.insert_link(&session, &new_link("https://a.io", "Coding")).await.unwrap();

    store.delete_link(&session, &link.id).await.unwrap();
    store.delete_link(&session, &link.id).await.unwrap();
    store.delete_link(&session, "never-existed").await.unwrap();
    assert!(store.select_links(&session).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reassign_category_moves_only_matching_links() {
    let (_db, store) = local_store();
    let session = store.sign_up(&creds("ana")).await.unwrap();
    store.insert_link(&session, &new_link("https://dribbble.com", "Design")).await.unwrap();
    store.insert_link(&session, &new_link("https://figma.com", "Design")).await.unwrap();
    store.insert_link(&session, &new_link("https://github.com", "Coding")).await.unwrap();

    let moved = store.reassign_category(&session, "Design", "Uncategorized").await.unwrap();
    assert_eq!(moved, 2);

    let links = store.select_links(&session).await.unwrap();
    assert_eq!(links.iter().filter(|l| l.category == "Uncategorized").count(), 2);
    assert_eq!(links.iter().filter(|l| l.category == "Coding").count(), 1);
}
