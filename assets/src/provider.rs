//! The capability interface the cache loads through.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::error::ProviderError;

/// The future type returned by every asynchronous provider call.
pub type ProviderFuture<T> = BoxFuture<'static, Result<T, ProviderError>>;

/// The list of resource locations a label resolves to.
pub trait ResourceLocations {
  /// The primary key of every location, in provider order.
  fn primary_keys(&self) -> Vec<String>;
}

impl ResourceLocations for Vec<String> {
  fn primary_keys(&self) -> Vec<String> {
    self.clone()
  }
}

impl ResourceLocations for Vec<&'static str> {
  fn primary_keys(&self) -> Vec<String> {
    self.iter().map(|key| key.to_string()).collect()
  }
}

/// An external, asynchronous source of named resources.
///
/// The cache never implements this itself. It calls `load` at most once per
/// key while a load for that key is in flight, and hands every handle it
/// obtained back through `release` when the key is unloaded.
pub trait ResourceProvider: Send + Sync + 'static {
  /// The loaded resource. The cache stores it behind an `Arc`.
  type Handle: Send + Sync + 'static;

  /// The provider-side result of resolving a label.
  type Locations: ResourceLocations + Send + 'static;

  /// Starts loading `key`.
  ///
  /// The call itself must not block; the returned future does the work and
  /// must be `'static` because it is driven on the cache's task spawner.
  fn load(&self, key: &str) -> ProviderFuture<Self::Handle>;

  /// Resolves `label` into the locations of every resource carrying it.
  fn resolve_label(&self, label: &str) -> ProviderFuture<Self::Locations>;

  /// Takes back a handle previously produced by `load`.
  fn release(&self, key: &str, handle: Arc<Self::Handle>);

  /// Takes back a label resolution result once its keys were extracted.
  fn release_locations(&self, locations: Self::Locations) {
    drop(locations);
  }
}
