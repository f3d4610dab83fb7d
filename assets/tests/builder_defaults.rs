mod common;

use common::MockProvider;
use fibre_assets::{AssetCache, AssetCacheConfig, BatchPolicy, BuildError};
use futures_util::future::BoxFuture;
use std::sync::Arc;

#[test]
fn test_build_without_runtime_requires_spawner() {
  let result = AssetCache::builder(MockProvider::new()).build();
  assert_eq!(result.unwrap_err(), BuildError::SpawnerRequired);
}

#[test]
fn test_closure_spawner_drives_loads() {
  let runtime = tokio::runtime::Runtime::new().unwrap();
  let handle = runtime.handle().clone();

  let cache = AssetCache::builder(MockProvider::new().asset("a"))
    .spawner(Arc::new(move |future: BoxFuture<'static, ()>| {
      handle.spawn(future);
    }))
    .build()
    .unwrap();

  let loaded = runtime.block_on(cache.load("a")).unwrap();
  assert_eq!(loaded.key, "a");
  assert!(cache.contains("a"));
}

#[tokio::test]
async fn test_defaults() {
  let cache = AssetCache::new(MockProvider::new()).unwrap();

  assert_eq!(cache.name(), "assets");
  assert_eq!(cache.batch_policy(), BatchPolicy::Strict);
  assert!(cache.is_empty());

  let metrics = cache.metrics();
  assert_eq!(metrics.hits, 0);
  assert_eq!(metrics.hit_ratio, 0.0);
}

#[tokio::test]
async fn test_config_overrides_builder() {
  let config = AssetCacheConfig {
    name: Some("level-1".into()),
    batch_policy: Some(BatchPolicy::Lenient),
  };

  let cache = AssetCache::builder(MockProvider::new())
    .name("ignored")
    .config(config)
    .build()
    .unwrap();

  assert_eq!(cache.name(), "level-1");
  assert_eq!(cache.batch_policy(), BatchPolicy::Lenient);
}

#[tokio::test]
async fn test_empty_config_keeps_builder_settings() {
  let cache = AssetCache::builder(MockProvider::new())
    .name("hud")
    .batch_policy(BatchPolicy::Lenient)
    .config(AssetCacheConfig::default())
    .build()
    .unwrap();

  assert_eq!(cache.name(), "hud");
  assert_eq!(cache.batch_policy(), BatchPolicy::Lenient);
}

#[cfg(feature = "serde")]
#[test]
fn test_config_deserializes_with_defaults() {
  let config: AssetCacheConfig =
    serde_json::from_str(r#"{ "name": "ui", "batch_policy": "lenient" }"#).unwrap();
  assert_eq!(config.name.as_deref(), Some("ui"));
  assert_eq!(config.batch_policy, Some(BatchPolicy::Lenient));

  let config: AssetCacheConfig = serde_json::from_str("{}").unwrap();
  assert_eq!(config, AssetCacheConfig::default());
}
