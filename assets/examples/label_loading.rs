use fibre_assets::{AssetCache, BatchPolicy, ProviderError, ProviderFuture, ResourceProvider};
use futures_util::FutureExt;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

// A simulated asset bundle that takes a while to hand out each asset.
struct Bundle;

impl ResourceProvider for Bundle {
  type Handle = String;
  type Locations = Vec<String>;

  fn load(&self, key: &str) -> ProviderFuture<String> {
    let key = key.to_string();
    async move {
      println!("--- Bundle: loading '{}'...", key);
      sleep(Duration::from_millis(200)).await;
      if key.ends_with("broken") {
        return Err(ProviderError::new(format!("'{}' is corrupt", key)));
      }
      Ok(format!("<contents of {}>", key))
    }
    .boxed()
  }

  fn resolve_label(&self, label: &str) -> ProviderFuture<Vec<String>> {
    let keys = match label {
      "enemies" => Ok(vec![
        "enemies/slime".to_string(),
        "enemies/bat".to_string(),
        "enemies/broken".to_string(),
      ]),
      other => Err(ProviderError::new(format!("no label '{}'", other))),
    };
    futures_util::future::ready(keys).boxed()
  }

  fn release(&self, key: &str, _handle: Arc<String>) {
    println!("--- Bundle: released '{}'", key);
  }
}

#[tokio::main]
async fn main() {
  let cache = AssetCache::builder(Bundle)
    .name("example")
    .batch_policy(BatchPolicy::Lenient)
    .build()
    .expect("Failed to build asset cache");

  println!("--- Loading label 'enemies' ---");
  let report = cache
    .load_label("enemies")
    .await
    .expect("label should resolve");
  println!(
    "Batch finished (success = {}). Loaded: {:?}. Failed: {:?}",
    report.success(),
    report.loaded(),
    report.failed_keys()
  );

  if let Some(slime) = cache.get("enemies/slime") {
    println!("Cached slime: {}", slime);
  }

  println!("\n--- Loading the label again: everything is already cached ---");
  let report = cache.load_label("enemies").await.unwrap();
  println!("Already loaded: {:?}", report.already_loaded());

  println!("\n--- Unloading label 'enemies' ---");
  cache.unload_label("enemies").await.unwrap();
  println!("Cache is empty: {}", cache.is_empty());

  println!("\n--- Unknown label ---");
  match cache.load_label("bosses").await {
    Ok(_) => unreachable!(),
    Err(error) => println!("Error: {}", error),
  }

  println!("\nFinal metrics: {:#?}", cache.metrics());
}
