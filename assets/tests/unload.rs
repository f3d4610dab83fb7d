mod common;

use common::{build_cache, MockProvider, RecordingListener};
use fibre_assets::{AssetCache, AssetError};
use std::sync::Arc;

#[tokio::test]
async fn test_unload_absent_key_is_noop() {
  let cache = build_cache(MockProvider::new().asset("a"));

  assert!(!cache.unload("a"));
  assert!(!cache.unload("never-heard-of-it"));
  assert!(cache.provider().released().is_empty());
  assert_eq!(cache.metrics().unloads, 0);
}

#[tokio::test]
async fn test_unload_releases_handle() {
  let cache = build_cache(MockProvider::new().asset("a"));
  let handle = cache.load("a").await.unwrap();

  assert!(cache.unload("a"));
  assert!(cache.get("a").is_none());
  assert_eq!(cache.provider().released(), vec!["a"]);
  assert_eq!(cache.metrics().unloads, 1);

  // The caller's view outlives the entry.
  assert_eq!(handle.payload, "payload:a");

  // Unloading twice is harmless.
  assert!(!cache.unload("a"));
  assert_eq!(cache.provider().released(), vec!["a"]);
}

#[tokio::test]
async fn test_reload_after_unload_contacts_provider_again() {
  let cache = build_cache(MockProvider::new().asset("a"));

  cache.load("a").await.unwrap();
  cache.unload("a");
  cache.load("a").await.unwrap();

  assert_eq!(cache.provider().load_count("a"), 2);
  assert!(cache.contains("a"));
}

#[tokio::test]
async fn test_unload_batch_in_order() {
  let cache = build_cache(MockProvider::new().assets(&["a", "b", "c"]));
  cache.load_batch(["a", "b", "c"]).await;

  let removed = cache.unload_batch(["c", "missing", "a"]);

  assert_eq!(removed, 2);
  assert_eq!(cache.provider().released(), vec!["c", "a"]);
  assert_eq!(cache.keys(), vec!["b"]);
}

#[tokio::test]
async fn test_unload_during_load_discards_late_result() {
  let cache = build_cache(MockProvider::new().gated("slow"));

  let load = cache.load("slow");
  assert!(cache.is_loading("slow"));

  // Nothing is cached yet, so nothing is removed, but the load is detached.
  assert!(!cache.unload("slow"));
  assert!(!cache.is_loading("slow"));

  cache.provider().open_gate();
  let result = load.await;

  assert_eq!(
    result.unwrap_err(),
    AssetError::Discarded {
      key: "slow".into()
    }
  );
  assert!(cache.get("slow").is_none());
  assert_eq!(
    cache.provider().released(),
    vec!["slow"],
    "A discarded handle must go back to the provider"
  );
  assert_eq!(cache.metrics().loads_discarded, 1);
}

#[tokio::test]
async fn test_load_after_unload_during_load_starts_fresh() {
  let cache = build_cache(MockProvider::new().gated("slow"));

  let first = cache.load("slow");
  cache.unload("slow");
  let second = cache.load("slow");
  assert_eq!(cache.provider().load_count("slow"), 2);

  cache.provider().open_gate();
  let (first, second) = tokio::join!(first, second);

  assert!(matches!(first, Err(AssetError::Discarded { .. })));
  let handle = second.unwrap();
  assert!(Arc::ptr_eq(&handle, &cache.get("slow").unwrap()));
  assert_eq!(cache.provider().released(), vec!["slow"]);
}

#[tokio::test]
async fn test_cache_holds_exactly_the_settled_loads() {
  let cache = build_cache(MockProvider::new().assets(&["a", "b", "c", "d"]));

  cache.load_batch(["a", "b", "c", "missing"]).await;
  cache.unload("b");
  cache.load("d").await.unwrap();
  cache.unload_batch(["a", "missing"]);
  cache.load("a").await.unwrap();

  let mut keys = cache.keys();
  keys.sort();
  assert_eq!(keys, vec!["a", "c", "d"]);
}

#[tokio::test]
async fn test_listener_sees_transitions() {
  let listener = RecordingListener::default();
  let provider = MockProvider::new().asset("a").gated("slow");
  let cache: AssetCache<MockProvider> = AssetCache::builder(provider)
    .listener(listener.clone())
    .build()
    .unwrap();

  cache.load("a").await.unwrap();
  assert!(cache.load("missing").await.is_err());
  cache.unload("a");

  let slow = cache.load("slow");
  cache.unload("slow");
  cache.provider().open_gate();
  let _ = slow.await;

  assert_eq!(
    listener.events(),
    vec![
      "loaded a payload:a",
      "failed missing",
      "unloaded a (unloaded)",
      "unloaded slow (discarded after unload)",
    ]
  );
}
