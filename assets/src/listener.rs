use std::fmt;
use std::sync::Arc;

use crate::error::AssetError;

/// Why an entry left the cache (or never entered it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnloadReason {
  /// The entry was removed by `unload`, `unload_batch` or `unload_label`.
  Unloaded,
  /// A load finished after its key was unloaded; the handle went straight
  /// back to the provider.
  Discarded,
}

impl fmt::Display for UnloadReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      UnloadReason::Unloaded => write!(f, "unloaded"),
      UnloadReason::Discarded => write!(f, "discarded after unload"),
    }
  }
}

/// An observer notified about cache transitions.
///
/// Callbacks run synchronously on whichever task performed the transition,
/// after the cache lock has been released. Keep them short.
pub trait AssetListener<H>: Send + Sync {
  fn on_loaded(&self, _key: &str, _handle: &Arc<H>) {}

  fn on_load_failed(&self, _key: &str, _error: &AssetError) {}

  fn on_unloaded(&self, _key: &str, _reason: UnloadReason) {}
}
