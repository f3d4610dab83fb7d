use crate::error::AssetError;
use crate::provider::{ResourceLocations, ResourceProvider};

/// Resolves `label` into the keys of every resource carrying it.
///
/// The provider's resolution result is released as soon as the keys have
/// been extracted. Results are never cached, so every call asks the provider
/// again.
pub(crate) async fn resolve_label<P>(provider: &P, label: &str) -> Result<Vec<String>, AssetError>
where
  P: ResourceProvider + ?Sized,
{
  tracing::debug!(label, "resolving label");

  let locations = provider
    .resolve_label(label)
    .await
    .map_err(|source| AssetError::LabelResolution {
      label: label.to_string(),
      source,
    })?;

  let keys = locations.primary_keys();
  provider.release_locations(locations);

  tracing::trace!(label, keys = ?keys, "label resolved");
  Ok(keys)
}
