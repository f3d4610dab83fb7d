use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur when building an asset cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// No `TaskSpawner` was configured and no Tokio runtime is reachable from
  /// the thread calling `build()`.
  #[error("an asset cache requires a task spawner or a running tokio runtime")]
  SpawnerRequired,
}

/// An opaque failure reported by a `ResourceProvider`.
///
/// Cloning is cheap; the message is shared between every waiter of a load.
#[derive(Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
  message: Arc<str>,
}

impl ProviderError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: Arc::from(message.into()),
    }
  }

  pub fn message(&self) -> &str {
    &self.message
  }
}

impl fmt::Debug for ProviderError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("ProviderError").field(&&*self.message).finish()
  }
}

impl From<&str> for ProviderError {
  fn from(message: &str) -> Self {
    Self::new(message)
  }
}

impl From<String> for ProviderError {
  fn from(message: String) -> Self {
    Self::new(message)
  }
}

/// Errors surfaced by cache operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
  /// The key has no cache entry. Load it first.
  #[error("asset `{key}` is not loaded")]
  NotLoaded { key: String },

  /// The provider failed to load a single key.
  #[error("failed to load asset `{key}`: {source}")]
  Load {
    key: String,
    #[source]
    source: ProviderError,
  },

  /// The provider could not resolve a label into keys.
  #[error("failed to resolve label `{label}`: {source}")]
  LabelResolution {
    label: String,
    #[source]
    source: ProviderError,
  },

  /// The key was unloaded while its load was in flight. The late result was
  /// handed back to the provider instead of being cached.
  #[error("load of asset `{key}` was discarded by an unload")]
  Discarded { key: String },
}

impl AssetError {
  /// The key or label this error refers to.
  pub fn subject(&self) -> &str {
    match self {
      AssetError::NotLoaded { key }
      | AssetError::Load { key, .. }
      | AssetError::Discarded { key } => key,
      AssetError::LabelResolution { label, .. } => label,
    }
  }
}
