//! Unit tests for the LinkStore: refresh-on-write consistency, category
//! derivation, failure handling and snapshot subscriptions.

#[path = "../common/mod.rs"]
mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use common::{creds, local_store, new_link, FlakyStore, RecordingAlerts};
use linkvault::managers::link_store::LinkStore;
use linkvault::services::record_store::RemoteRecordStore;
use linkvault::types::errors::LinkError;
use linkvault::types::link::{default_categories, LinkPatch, LinkSnapshot, UNCATEGORIZED};
use linkvault::types::session::Session;

struct Fixture {
    remote: Arc<FlakyStore>,
    alerts: Arc<RecordingAlerts>,
    store: LinkStore,
    session: Session,
}

async fn setup() -> Fixture {
    let (_db, local) = local_store();
    let remote = Arc::new(FlakyStore::new(local));
    let session = remote.sign_up(&creds("ana")).await.unwrap();
    let alerts = Arc::new(RecordingAlerts::default());
    let store = LinkStore::new(remote.clone(), alerts.clone());
    store.set_session(Some(session.clone())).await;
    Fixture {
        remote,
        alerts,
        store,
        session,
    }
}

impl Fixture {
    async fn remote_view(&self) -> Vec<linkvault::types::link::Link> {
        self.remote.inner.select_links(&self.session).await.unwrap()
    }

    fn has_category(&self, label: &str) -> bool {
        self.store.categories().iter().any(|c| c == label)
    }
}

#[tokio::test]
async fn test_new_session_starts_with_defaults() {
    let fx = setup().await;
    assert!(fx.store.list().is_empty());
    assert_eq!(fx.store.categories(), default_categories());
}

#[tokio::test]
async fn test_create_update_delete_mirror_remote() {
    let fx = setup().await;

    fx.store.create(new_link("https://github.com", "Coding")).await.unwrap();
    fx.store.create(new_link("https://bbc.co.uk", "News")).await.unwrap();
    assert_eq!(fx.store.list(), fx.remote_view().await);
    assert_eq!(fx.store.list()[0].url, "https://bbc.co.uk");

    let id = fx.store.list()[1].id.clone();
    fx.store.update(&id, LinkPatch::category("Reading")).await.unwrap();
    assert_eq!(fx.store.list(), fx.remote_view().await);
    assert!(fx.has_category("Reading"));

    fx.store.delete(&id).await.unwrap();
    assert_eq!(fx.store.list(), fx.remote_view().await);
    assert_eq!(fx.store.list().len(), 1);
    assert!(fx.alerts.messages().is_empty());
}

#[tokio::test]
async fn test_observed_categories_append_after_known() {
    let fx = setup().await;
    fx.store.create(new_link("https://food.io", "Recipes")).await.unwrap();

    let mut expected = default_categories();
    expected.push("Recipes".to_string());
    assert_eq!(fx.store.categories(), expected);
}

#[tokio::test]
async fn test_categories_do_not_shrink_on_refresh() {
    let fx = setup().await;
    fx.store.create(new_link("https://food.io", "Recipes")).await.unwrap();
    let id = fx.store.list()[0].id.clone();

    fx.store.update(&id, LinkPatch::category("Coding")).await.unwrap();
    fx.store.refresh().await;
    assert!(fx.has_category("Recipes"));
}

#[tokio::test]
async fn test_failed_write_alerts_and_skips_refresh() {
    let fx = setup().await;
    fx.store.create(new_link("https://github.com", "Coding")).await.unwrap();
    let before = fx.store.list();
    let fetches = fx.remote.fetches.load(Ordering::SeqCst);

    fx.remote.fail_writes.store(true, Ordering::SeqCst);
    let err = fx.store.create(new_link("https://figma.com", "Design")).await.unwrap_err();

    assert!(matches!(err, LinkError::Remote(_)));
    assert_eq!(fx.store.list(), before);
    assert_eq!(fx.remote.fetches.load(Ordering::SeqCst), fetches);
    let alerts = fx.alerts.messages();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].starts_with("Failed to add link"));
}

#[tokio::test]
async fn test_update_unknown_link_is_not_found() {
    let fx = setup().await;
    let err = fx.store.update("missing", LinkPatch::category("News")).await.unwrap_err();
    assert_eq!(err, LinkError::NotFound("missing".to_string()));
    assert_eq!(fx.alerts.messages().len(), 1);
}

#[tokio::test]
async fn test_mutations_require_session() {
    let fx = setup().await;
    fx.store.set_session(None).await;

    assert_eq!(
        fx.store.create(new_link("https://github.com", "Coding")).await,
        Err(LinkError::NotAuthenticated)
    );
    assert_eq!(fx.store.delete("x").await, Err(LinkError::NotAuthenticated));
    assert_eq!(fx.store.delete_category("Coding").await, Err(LinkError::NotAuthenticated));
    assert_eq!(fx.alerts.messages().len(), 3);
    assert_eq!(fx.remote.inner.select_links(&fx.session).await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_fetch_failure_yields_empty_list_and_keeps_categories() {
    let fx = setup().await;
    fx.store.create(new_link("https://food.io", "Recipes")).await.unwrap();
    assert_eq!(fx.store.list().len(), 1);

    fx.remote.fail_fetch.store(true, Ordering::SeqCst);
    fx.store.refresh().await;

    assert!(fx.store.list().is_empty());
    assert!(fx.has_category("Recipes"));
    assert!(fx.alerts.messages().is_empty(), "fetch failures are not alerted");
}

#[tokio::test]
async fn test_delete_category_moves_links_to_uncategorized() {
    let fx = setup().await;
    fx.store.create(new_link("https://dribbble.com", "Design")).await.unwrap();
    fx.store.create(new_link("https://figma.com", "Design")).await.unwrap();
    fx.store.create(new_link("https://github.com", "Coding")).await.unwrap();

    fx.store.delete_category("Design").await.unwrap();

    let links = fx.store.list();
    assert_eq!(links.iter().filter(|l| l.category == UNCATEGORIZED).count(), 2);
    assert!(links.iter().all(|l| l.category != "Design"));
    assert!(!fx.has_category("Design"));
    assert!(fx.has_category(UNCATEGORIZED));
    assert!(fx.has_category("Coding"));
}

#[tokio::test]
async fn test_delete_category_failure_keeps_label() {
    let fx = setup().await;
    fx.store.create(new_link("https://figma.com", "Design")).await.unwrap();
    fx.remote.fail_writes.store(true, Ordering::SeqCst);

    assert!(fx.store.delete_category("Design").await.is_err());
    assert!(fx.has_category("Design"));
    assert_eq!(fx.store.list()[0].category, "Design");
}

#[tokio::test]
async fn test_added_category_survives_refresh() {
    let fx = setup().await;
    fx.store.add_category("Podcasts");
    fx.store.refresh().await;
    assert!(fx.has_category("Podcasts"));
    assert_eq!(fx.store.categories().last().map(String::as_str), Some("Podcasts"));
}

#[tokio::test]
async fn test_renewed_credential_keeps_links_and_categories() {
    let fx = setup().await;
    fx.store.create(new_link("https://github.com", "Coding")).await.unwrap();
    fx.store.add_category("Podcasts");

    let snapshots = Arc::new(Mutex::new(Vec::<LinkSnapshot>::new()));
    let seen = snapshots.clone();
    let _sub = fx.store.subscribe(move |s| seen.lock().unwrap().push(s.clone()));

    let rotated = fx.remote.sign_in(&creds("ana")).await.unwrap();
    assert!(fx.store.renew_session(rotated.clone()));
    assert_eq!(fx.store.session().map(|s| s.access_token), Some(rotated.access_token));
    assert_eq!(fx.store.list().len(), 1);
    assert!(fx.has_category("Podcasts"));
    assert!(snapshots.lock().unwrap().is_empty(), "renewal publishes nothing");

    fx.store.create(new_link("https://bbc.co.uk", "News")).await.unwrap();
    assert_eq!(fx.store.list().len(), 2);
    assert!(fx.has_category("Podcasts"));
}

#[tokio::test]
async fn test_renewal_for_another_user_is_refused() {
    let fx = setup().await;
    fx.store.add_category("Podcasts");
    let bob = fx.remote.sign_up(&creds("bob")).await.unwrap();

    assert!(!fx.store.renew_session(bob));
    assert_eq!(fx.store.session().map(|s| s.user.id), Some(fx.session.user.id.clone()));
    assert!(fx.has_category("Podcasts"));

    let unbound = LinkStore::new(fx.remote.clone(), fx.alerts.clone());
    assert!(!unbound.renew_session(fx.session.clone()));
    assert!(unbound.session().is_none());
}

#[tokio::test]
async fn test_add_category_ignores_blank_and_duplicates() {
    let fx = setup().await;
    fx.store.add_category("   ");
    fx.store.add_category("Travel");
    fx.store.add_category(" Travel ");
    assert_eq!(fx.store.categories(), default_categories());
}

#[tokio::test]
async fn test_session_change_resets_state() {
    let fx = setup().await;
    fx.store.create(new_link("https://food.io", "Recipes")).await.unwrap();
    fx.store.add_category("Podcasts");

    fx.store.set_session(None).await;
    assert!(fx.store.list().is_empty());
    assert_eq!(fx.store.categories(), default_categories());

    // Another account sees only its own data
    let bob = fx.remote.sign_up(&creds("bob")).await.unwrap();
    fx.store.set_session(Some(bob)).await;
    assert!(fx.store.list().is_empty());
    assert!(!fx.has_category("Recipes"));
}

#[tokio::test]
async fn test_subscribers_receive_snapshots_until_unsubscribed() {
    let fx = setup().await;
    let seen: Arc<Mutex<Vec<LinkSnapshot>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let sub = fx.store.subscribe(move |snap| sink.lock().unwrap().push(snap.clone()));

    fx.store.create(new_link("https://github.com", "Coding")).await.unwrap();
    let last = seen.lock().unwrap().last().cloned().unwrap();
    assert_eq!(last, fx.store.snapshot());
    assert_eq!(last.links.len(), 1);

    sub.unsubscribe();
    let count = seen.lock().unwrap().len();
    fx.store.add_category("Podcasts");
    assert_eq!(seen.lock().unwrap().len(), count);
}
