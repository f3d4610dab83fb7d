use crate::batch::BatchPolicy;
use crate::error::{AssetError, ProviderError};
use crate::listener::{AssetListener, UnloadReason};
use crate::loader::{LoadAsset, LoadFuture};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::provider::ResourceProvider;
use crate::TaskSpawner;

use std::fmt;
use std::sync::Arc;

use ahash::HashMap;
use parking_lot::Mutex;

/// Everything the cache lock protects.
///
/// A key is in `entries` iff a load for it succeeded and no unload removed it
/// since. A key is in `pending` iff a provider load for it is in flight and
/// has not been detached by an unload. The two maps never share a key.
pub(crate) struct CacheState<H> {
  pub(crate) entries: HashMap<String, Arc<H>>,
  pub(crate) pending: HashMap<String, Arc<LoadFuture<H>>>,
}

impl<H> Default for CacheState<H> {
  fn default() -> Self {
    Self {
      entries: HashMap::default(),
      pending: HashMap::default(),
    }
  }
}

/// The internal, thread-safe core of the asset cache.
///
/// The state lock is held only for map bookkeeping: never across an `.await`,
/// a provider call or a listener callback.
pub(crate) struct AssetShared<P: ResourceProvider> {
  pub(crate) name: Arc<str>,
  pub(crate) provider: P,
  pub(crate) state: Mutex<CacheState<P::Handle>>,
  pub(crate) metrics: Arc<Metrics>,
  pub(crate) spawner: Arc<dyn TaskSpawner>,
  pub(crate) batch_policy: BatchPolicy,
  pub(crate) listener: Option<Arc<dyn AssetListener<P::Handle>>>,
}

impl<P: ResourceProvider> fmt::Debug for AssetShared<P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AssetShared")
      .field("name", &self.name)
      .field("batch_policy", &self.batch_policy)
      .field("has_listener", &self.listener.is_some())
      .field("metrics", &self.metrics_snapshot())
      .finish_non_exhaustive()
  }
}

impl<P: ResourceProvider> AssetShared<P> {
  pub(crate) fn metrics_snapshot(&self) -> MetricsSnapshot {
    let (entries, in_flight) = {
      let state = self.state.lock();
      (state.entries.len(), state.pending.len())
    };
    self.metrics.snapshot(entries, in_flight)
  }

  pub(crate) fn get(&self, key: &str) -> Option<Arc<P::Handle>> {
    let found = self.state.lock().entries.get(key).cloned();
    match found {
      Some(handle) => {
        Metrics::bump(&self.metrics.hits);
        Some(handle)
      }
      None => {
        Metrics::bump(&self.metrics.misses);
        tracing::debug!(cache = %self.name, key, "asset is not loaded; load it first");
        None
      }
    }
  }

  /// Starts (or joins) the load of a single key.
  ///
  /// Cached keys resolve immediately without contacting the provider. A key
  /// already in flight joins the pending load. Otherwise the provider is
  /// called right here, and its future is driven on the spawner.
  pub(crate) fn load(self: &Arc<Self>, key: &str) -> LoadAsset<P::Handle> {
    let future = {
      let mut state = self.state.lock();

      if let Some(handle) = state.entries.get(key) {
        Metrics::bump(&self.metrics.already_loaded);
        tracing::trace!(cache = %self.name, key, "asset already loaded");
        return LoadAsset::ready(Ok(handle.clone()));
      }

      if let Some(pending) = state.pending.get(key) {
        Metrics::bump(&self.metrics.loads_coalesced);
        tracing::trace!(cache = %self.name, key, "joining in-flight load");
        return LoadAsset::waiting(pending.clone());
      }

      let future = Arc::new(LoadFuture::new());
      state.pending.insert(key.to_string(), future.clone());
      future
    };

    Metrics::bump(&self.metrics.loads_dispatched);
    tracing::debug!(cache = %self.name, key, "dispatching asset load");

    let provider_load = self.provider.load(key);
    let shared = Arc::clone(self);
    let key = key.to_string();
    let task_future = future.clone();
    self.spawner.spawn(Box::pin(async move {
      let outcome = provider_load.await;
      shared.complete_load(key, &task_future, outcome);
    }));

    LoadAsset::waiting(future)
  }

  /// Settles a provider load and wakes everyone waiting on it.
  fn complete_load(
    &self,
    key: String,
    future: &Arc<LoadFuture<P::Handle>>,
    outcome: Result<P::Handle, ProviderError>,
  ) {
    match outcome {
      Ok(handle) => {
        let handle = Arc::new(handle);
        let attached = {
          let mut state = self.state.lock();
          let attached = Self::detach_pending(&mut state, &key, future);
          if attached {
            state.entries.insert(key.clone(), handle.clone());
          }
          attached
        };

        if attached {
          Metrics::bump(&self.metrics.loads_succeeded);
          tracing::debug!(cache = %self.name, key = %key, "asset loaded");
          if let Some(listener) = &self.listener {
            listener.on_loaded(&key, &handle);
          }
          future.complete(Ok(handle));
        } else {
          Metrics::bump(&self.metrics.loads_discarded);
          tracing::debug!(
            cache = %self.name,
            key = %key,
            "asset was unloaded while loading; releasing late result"
          );
          self.provider.release(&key, handle);
          if let Some(listener) = &self.listener {
            listener.on_unloaded(&key, UnloadReason::Discarded);
          }
          future.complete(Err(AssetError::Discarded { key }));
        }
      }
      Err(source) => {
        Self::detach_pending(&mut self.state.lock(), &key, future);

        Metrics::bump(&self.metrics.loads_failed);
        tracing::warn!(cache = %self.name, key = %key, error = %source, "asset load failed");
        let error = AssetError::Load { key, source };
        if let Some(listener) = &self.listener {
          listener.on_load_failed(error.subject(), &error);
        }
        future.complete(Err(error));
      }
    }
  }

  /// Removes `future` from the pending map if it is still the load registered
  /// for `key`. Returns false when an unload detached it earlier.
  fn detach_pending(
    state: &mut CacheState<P::Handle>,
    key: &str,
    future: &Arc<LoadFuture<P::Handle>>,
  ) -> bool {
    let registered = state
      .pending
      .get(key)
      .is_some_and(|pending| Arc::ptr_eq(pending, future));
    if registered {
      state.pending.remove(key);
    }
    registered
  }

  pub(crate) fn unload(&self, key: &str) -> bool {
    let (removed, detached) = {
      let mut state = self.state.lock();
      (state.entries.remove(key), state.pending.remove(key).is_some())
    };

    if detached {
      tracing::debug!(
        cache = %self.name,
        key,
        "unload requested while loading; the late result will be discarded"
      );
    }

    match removed {
      Some(handle) => {
        self.provider.release(key, handle);
        Metrics::bump(&self.metrics.unloads);
        tracing::debug!(cache = %self.name, key, "asset unloaded");
        if let Some(listener) = &self.listener {
          listener.on_unloaded(key, UnloadReason::Unloaded);
        }
        true
      }
      None => false,
    }
  }
}
