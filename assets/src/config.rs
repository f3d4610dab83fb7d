use crate::batch::BatchPolicy;

/// Externally supplied cache settings.
///
/// Every field is optional in serialized form; missing fields keep their
/// defaults. Apply it with `AssetCacheBuilder::config`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AssetCacheConfig {
  /// Name recorded on every log event of the cache.
  pub name: Option<String>,
  /// How batches with failed keys report their outcome.
  pub batch_policy: Option<BatchPolicy>,
}
