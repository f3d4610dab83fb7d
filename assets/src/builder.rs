use crate::batch::BatchPolicy;
use crate::config::AssetCacheConfig;
use crate::error::BuildError;
use crate::handles::AssetCache;
use crate::listener::AssetListener;
use crate::metrics::Metrics;
use crate::provider::ResourceProvider;
use crate::shared::{AssetShared, CacheState};
use crate::TaskSpawner;

use core::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

const DEFAULT_NAME: &str = "assets";

/// A builder for creating `AssetCache` instances.
pub struct AssetCacheBuilder<P: ResourceProvider> {
  provider: P,
  name: Option<String>,
  batch_policy: BatchPolicy,
  spawner: Option<Arc<dyn TaskSpawner>>,
  listener: Option<Arc<dyn AssetListener<P::Handle>>>,
}

impl<P: ResourceProvider> fmt::Debug for AssetCacheBuilder<P> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AssetCacheBuilder")
      .field("name", &self.name)
      .field("batch_policy", &self.batch_policy)
      .field("has_spawner", &self.spawner.is_some())
      .field("has_listener", &self.listener.is_some())
      .finish_non_exhaustive()
  }
}

impl<P: ResourceProvider> AssetCacheBuilder<P> {
  pub fn new(provider: P) -> Self {
    Self {
      provider,
      name: None,
      batch_policy: BatchPolicy::default(),
      spawner: None,
      listener: None,
    }
  }

  /// Sets the name recorded on the cache's log events.
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Sets how batches with failed keys report their outcome.
  ///
  /// Defaults to `BatchPolicy::Strict`.
  pub fn batch_policy(mut self, policy: BatchPolicy) -> Self {
    self.batch_policy = policy;
    self
  }

  /// Sets the spawner that drives provider loads.
  ///
  /// Without one, `build()` falls back to the current Tokio runtime (with the
  /// `tokio` feature enabled).
  pub fn spawner(mut self, spawner: Arc<dyn TaskSpawner>) -> Self {
    self.spawner = Some(spawner);
    self
  }

  /// Registers an observer for loads and unloads.
  pub fn listener<Listener>(mut self, listener: Listener) -> Self
  where
    Listener: AssetListener<P::Handle> + 'static,
  {
    self.listener = Some(Arc::new(listener));
    self
  }

  /// Applies externally supplied settings. Fields left unset in `config`
  /// keep what the builder already has.
  pub fn config(mut self, config: AssetCacheConfig) -> Self {
    if let Some(name) = config.name {
      self.name = Some(name);
    }
    if let Some(policy) = config.batch_policy {
      self.batch_policy = policy;
    }
    self
  }

  pub fn build(self) -> Result<AssetCache<P>, BuildError> {
    let spawner = match self.spawner {
      Some(spawner) => spawner,
      None => default_spawner()?,
    };

    let name: Arc<str> = Arc::from(self.name.as_deref().unwrap_or(DEFAULT_NAME));
    tracing::debug!(cache = %name, batch_policy = ?self.batch_policy, "asset cache built");

    let shared = AssetShared {
      name,
      provider: self.provider,
      state: Mutex::new(CacheState::default()),
      metrics: Arc::new(Metrics::new()),
      spawner,
      batch_policy: self.batch_policy,
      listener: self.listener,
    };

    Ok(AssetCache {
      shared: Arc::new(shared),
    })
  }
}

#[cfg(feature = "tokio")]
fn default_spawner() -> Result<Arc<dyn TaskSpawner>, BuildError> {
  crate::runtime::TokioSpawner::try_current()
    .map(|spawner| Arc::new(spawner) as Arc<dyn TaskSpawner>)
    .ok_or(BuildError::SpawnerRequired)
}

#[cfg(not(feature = "tokio"))]
fn default_spawner() -> Result<Arc<dyn TaskSpawner>, BuildError> {
  Err(BuildError::SpawnerRequired)
}
