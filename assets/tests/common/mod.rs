#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fibre_assets::{
  AssetCache, AssetError, AssetListener, BatchPolicy, ProviderError, ProviderFuture,
  ResourceProvider, UnloadReason,
};
use futures_util::FutureExt;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

#[derive(Debug, PartialEq, Eq)]
pub struct TestAsset {
  pub key: String,
  pub payload: String,
}

/// A provider backed by in-memory tables.
///
/// Keys not registered with `asset` fail to load. Keys registered with
/// `gated` do not complete until `open_gate` is called.
pub struct MockProvider {
  assets: HashMap<String, String>,
  labels: HashMap<String, Vec<String>>,
  gated: HashSet<String>,
  gate: Arc<Semaphore>,
  load_calls: Mutex<Vec<String>>,
  released: Mutex<Vec<String>>,
  resolve_calls: AtomicUsize,
  released_locations: AtomicUsize,
}

impl MockProvider {
  pub fn new() -> Self {
    Self {
      assets: HashMap::new(),
      labels: HashMap::new(),
      gated: HashSet::new(),
      gate: Arc::new(Semaphore::new(0)),
      load_calls: Mutex::new(Vec::new()),
      released: Mutex::new(Vec::new()),
      resolve_calls: AtomicUsize::new(0),
      released_locations: AtomicUsize::new(0),
    }
  }

  pub fn asset(mut self, key: &str) -> Self {
    self.assets.insert(key.to_string(), format!("payload:{key}"));
    self
  }

  pub fn assets(mut self, keys: &[&str]) -> Self {
    for key in keys {
      self = self.asset(key);
    }
    self
  }

  pub fn label(mut self, label: &str, keys: &[&str]) -> Self {
    self
      .labels
      .insert(label.to_string(), keys.iter().map(|k| k.to_string()).collect());
    self
  }

  /// Registers `key` as loadable, but holds its loads until `open_gate`.
  pub fn gated(mut self, key: &str) -> Self {
    self.gated.insert(key.to_string());
    self.asset(key)
  }

  /// Lets every held load (current and future) complete.
  pub fn open_gate(&self) {
    self.gate.close();
  }

  pub fn load_calls(&self) -> Vec<String> {
    self.load_calls.lock().clone()
  }

  pub fn load_count(&self, key: &str) -> usize {
    self.load_calls.lock().iter().filter(|k| *k == key).count()
  }

  pub fn released(&self) -> Vec<String> {
    self.released.lock().clone()
  }

  pub fn resolve_calls(&self) -> usize {
    self.resolve_calls.load(Ordering::SeqCst)
  }

  pub fn released_locations(&self) -> usize {
    self.released_locations.load(Ordering::SeqCst)
  }
}

impl ResourceProvider for MockProvider {
  type Handle = TestAsset;
  type Locations = Vec<String>;

  fn load(&self, key: &str) -> ProviderFuture<TestAsset> {
    self.load_calls.lock().push(key.to_string());

    let result = match self.assets.get(key) {
      Some(payload) => Ok(TestAsset {
        key: key.to_string(),
        payload: payload.clone(),
      }),
      None => Err(ProviderError::new(format!("no asset named `{key}`"))),
    };

    if self.gated.contains(key) {
      let gate = self.gate.clone();
      async move {
        let _ = gate.acquire().await;
        result
      }
      .boxed()
    } else {
      futures_util::future::ready(result).boxed()
    }
  }

  fn resolve_label(&self, label: &str) -> ProviderFuture<Vec<String>> {
    self.resolve_calls.fetch_add(1, Ordering::SeqCst);
    let result = self
      .labels
      .get(label)
      .cloned()
      .ok_or_else(|| ProviderError::new(format!("unknown label `{label}`")));
    futures_util::future::ready(result).boxed()
  }

  fn release(&self, key: &str, handle: Arc<TestAsset>) {
    assert_eq!(handle.key, key);
    self.released.lock().push(key.to_string());
  }

  fn release_locations(&self, _locations: Vec<String>) {
    self.released_locations.fetch_add(1, Ordering::SeqCst);
  }
}

pub fn build_cache(provider: MockProvider) -> AssetCache<MockProvider> {
  AssetCache::builder(provider).name("test").build().unwrap()
}

pub fn build_lenient_cache(provider: MockProvider) -> AssetCache<MockProvider> {
  AssetCache::builder(provider)
    .name("test")
    .batch_policy(BatchPolicy::Lenient)
    .build()
    .unwrap()
}

/// Records every listener callback as a readable line.
#[derive(Clone, Default)]
pub struct RecordingListener {
  pub events: Arc<Mutex<Vec<String>>>,
}

impl RecordingListener {
  pub fn events(&self) -> Vec<String> {
    self.events.lock().clone()
  }
}

impl AssetListener<TestAsset> for RecordingListener {
  fn on_loaded(&self, key: &str, handle: &Arc<TestAsset>) {
    self
      .events
      .lock()
      .push(format!("loaded {key} {}", handle.payload));
  }

  fn on_load_failed(&self, key: &str, _error: &AssetError) {
    self.events.lock().push(format!("failed {key}"));
  }

  fn on_unloaded(&self, key: &str, reason: UnloadReason) {
    self.events.lock().push(format!("unloaded {key} ({reason})"));
  }
}
