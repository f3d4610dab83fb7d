use crate::batch::{BatchLoad, BatchPolicy, BatchReport};
use crate::builder::AssetCacheBuilder;
use crate::error::{AssetError, BuildError};
use crate::label::resolve_label;
use crate::loader::LoadAsset;
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::provider::ResourceProvider;
use crate::shared::AssetShared;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use ahash::HashSet;
use futures_util::FutureExt;

/// A thread-safe asset cache in front of a `ResourceProvider`.
///
/// Cloning is cheap: every clone refers to the same entries, in-flight loads
/// and metrics.
pub struct AssetCache<P: ResourceProvider> {
  pub(crate) shared: Arc<AssetShared<P>>,
}

impl<P: ResourceProvider> fmt::Debug for AssetCache<P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AssetCache")
      .field("shared", &self.shared)
      .finish()
  }
}

impl<P: ResourceProvider> Clone for AssetCache<P> {
  fn clone(&self) -> Self {
    Self {
      shared: self.shared.clone(),
    }
  }
}

impl<P: ResourceProvider> AssetCache<P> {
  /// Starts building a cache around `provider`.
  pub fn builder(provider: P) -> AssetCacheBuilder<P> {
    AssetCacheBuilder::new(provider)
  }

  /// Builds a cache with default settings.
  pub fn new(provider: P) -> Result<Self, BuildError> {
    AssetCacheBuilder::new(provider).build()
  }

  pub fn name(&self) -> &str {
    &self.shared.name
  }

  pub fn provider(&self) -> &P {
    &self.shared.provider
  }

  pub fn batch_policy(&self) -> BatchPolicy {
    self.shared.batch_policy
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics_snapshot()
  }

  // --- Lookup ---

  /// Returns the cached handle for `key`, or `None` if it is not loaded.
  ///
  /// Never starts a load.
  pub fn get(&self, key: &str) -> Option<Arc<P::Handle>> {
    self.shared.get(key)
  }

  /// Like `get`, but reports a miss as `AssetError::NotLoaded`.
  pub fn try_get(&self, key: &str) -> Result<Arc<P::Handle>, AssetError> {
    self.shared.get(key).ok_or_else(|| AssetError::NotLoaded {
      key: key.to_string(),
    })
  }

  /// Whether `key` is cached. Unlike `get`, this is not counted as a lookup.
  pub fn contains(&self, key: &str) -> bool {
    self.shared.state.lock().entries.contains_key(key)
  }

  /// Whether a provider load for `key` is in flight.
  pub fn is_loading(&self, key: &str) -> bool {
    self.shared.state.lock().pending.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.shared.state.lock().entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// The keys currently cached, in no particular order.
  pub fn keys(&self) -> Vec<String> {
    self.shared.state.lock().entries.keys().cloned().collect()
  }

  // --- Single loads ---

  /// Loads `key` through the provider unless it is already cached.
  ///
  /// The provider is contacted before this method returns; the returned
  /// future only waits for the outcome. Concurrent requests for a key that
  /// is still loading share one provider load.
  pub fn load(&self, key: &str) -> LoadAsset<P::Handle> {
    self.shared.load(key)
  }

  /// Callback flavour of `load`.
  ///
  /// When `key` is already cached, `on_complete(true)` runs before this
  /// method returns. Otherwise it runs on the cache's spawner once the load
  /// settles. It is called exactly once either way.
  pub fn load_with<F>(&self, key: &str, on_complete: F)
  where
    F: FnOnce(bool) + Send + 'static,
  {
    let load = self.load(key);
    self.complete_or_spawn(load, move |outcome| on_complete(outcome.is_ok()));
  }

  // --- Batch loads ---

  /// Loads every key that is not cached yet and reports once all of them
  /// have finished.
  ///
  /// Duplicate keys are loaded once. Cached keys are skipped and listed in
  /// `BatchReport::already_loaded`. If nothing needs loading, the returned
  /// future is ready immediately and reports success.
  pub fn load_batch<I, S>(&self, keys: I) -> BatchLoad<P::Handle>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut seen = HashSet::default();
    let mut already_loaded = Vec::new();
    let mut to_load = Vec::new();
    {
      let state = self.shared.state.lock();
      for key in keys {
        let key = key.as_ref();
        if !seen.insert(key.to_string()) {
          continue;
        }
        if state.entries.contains_key(key) {
          already_loaded.push(key.to_string());
        } else {
          to_load.push(key.to_string());
        }
      }
    }

    if !already_loaded.is_empty() {
      tracing::debug!(
        cache = %self.shared.name,
        keys = ?already_loaded,
        "skipping already loaded assets"
      );
    }

    if to_load.is_empty() {
      Metrics::bump(&self.shared.metrics.batches_completed);
      return BatchLoad::ready(BatchReport::skipped_only(already_loaded));
    }

    tracing::debug!(cache = %self.shared.name, keys = ?to_load, "starting batch load");
    let loads = to_load
      .into_iter()
      .map(|key| {
        let load = self.shared.load(&key);
        (key, load)
      })
      .collect();

    BatchLoad::dispatched(
      loads,
      already_loaded,
      self.shared.batch_policy,
      self.shared.metrics.clone(),
      self.shared.name.clone(),
    )
  }

  /// Callback flavour of `load_batch`. `on_complete` receives
  /// `BatchReport::success()` and is called exactly once.
  pub fn load_batch_with<I, S, F>(&self, keys: I, on_complete: F)
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnOnce(bool) + Send + 'static,
  {
    let batch = self.load_batch(keys);
    self.complete_or_spawn(batch, move |report| on_complete(report.success()));
  }

  // --- Label loads ---

  /// Resolves `label` through the provider and loads the resulting keys as
  /// one batch.
  ///
  /// A failed resolution is returned as `AssetError::LabelResolution` and
  /// nothing is loaded.
  pub async fn load_label(&self, label: &str) -> Result<BatchReport, AssetError> {
    let keys = self.resolve(label).await?;
    Ok(self.load_batch(keys).await)
  }

  /// Callback flavour of `load_label`. `on_complete(false)` signals a failed
  /// resolution; otherwise it receives the batch outcome.
  pub fn load_label_with<F>(&self, label: &str, on_complete: F)
  where
    F: FnOnce(bool) + Send + 'static,
  {
    let cache = self.clone();
    let label = label.to_string();
    let task = async move { cache.load_label(&label).await }.boxed();
    self.complete_or_spawn(task, move |result| {
      on_complete(result.map_or(false, |report| report.success()))
    });
  }

  // --- Unloads ---

  /// Removes `key` from the cache and releases its handle to the provider.
  ///
  /// Returns `false` when `key` is not cached; unloading an absent key is
  /// harmless. A load of `key` still in flight is detached: its result will
  /// be released instead of cached.
  pub fn unload(&self, key: &str) -> bool {
    self.shared.unload(key)
  }

  /// Unloads every key in order. Returns how many entries were removed.
  pub fn unload_batch<I, S>(&self, keys: I) -> usize
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut removed = 0;
    for key in keys {
      if self.shared.unload(key.as_ref()) {
        removed += 1;
      }
    }
    removed
  }

  /// Resolves `label` and unloads every resulting key.
  ///
  /// Returns the resolved keys. On a failed resolution the cache is left
  /// untouched.
  pub async fn unload_label(&self, label: &str) -> Result<Vec<String>, AssetError> {
    let keys = self.resolve(label).await?;
    let removed = self.unload_batch(&keys);
    tracing::debug!(cache = %self.shared.name, label, removed, "label unloaded");
    Ok(keys)
  }

  /// Callback flavour of `unload_label`.
  pub fn unload_label_with<F>(&self, label: &str, on_complete: F)
  where
    F: FnOnce(bool) + Send + 'static,
  {
    let cache = self.clone();
    let label = label.to_string();
    let task = async move { cache.unload_label(&label).await }.boxed();
    self.complete_or_spawn(task, move |result| on_complete(result.is_ok()));
  }

  // --- Helpers ---

  async fn resolve(&self, label: &str) -> Result<Vec<String>, AssetError> {
    match resolve_label(&self.shared.provider, label).await {
      Ok(keys) => {
        Metrics::bump(&self.shared.metrics.labels_resolved);
        Ok(keys)
      }
      Err(error) => {
        Metrics::bump(&self.shared.metrics.label_failures);
        tracing::warn!(cache = %self.shared.name, label, %error, "label resolution failed");
        Err(error)
      }
    }
  }

  /// Runs `on_complete` on the caller's stack if `future` is already
  /// settled, otherwise once it settles on the spawner.
  fn complete_or_spawn<Fut, F>(&self, mut future: Fut, on_complete: F)
  where
    Fut: Future + Unpin + Send + 'static,
    F: FnOnce(Fut::Output) + Send + 'static,
  {
    match (&mut future).now_or_never() {
      Some(output) => on_complete(output),
      None => self.shared.spawner.spawn(Box::pin(async move {
        on_complete(future.await);
      })),
    }
  }
}
