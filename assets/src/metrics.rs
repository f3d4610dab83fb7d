use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_utils::CachePadded;

/// A thread-safe, internal metrics collector for the asset cache.
/// All fields are atomic to allow for lock-free updates.
#[derive(Debug)]
pub struct Metrics {
  // --- Lookups ---
  pub(crate) hits: CachePadded<AtomicU64>,
  pub(crate) misses: CachePadded<AtomicU64>,

  // --- Loads ---
  pub(crate) already_loaded: CachePadded<AtomicU64>,
  pub(crate) loads_dispatched: CachePadded<AtomicU64>,
  pub(crate) loads_coalesced: CachePadded<AtomicU64>,
  pub(crate) loads_succeeded: CachePadded<AtomicU64>,
  pub(crate) loads_failed: CachePadded<AtomicU64>,
  pub(crate) loads_discarded: CachePadded<AtomicU64>,

  // --- Batches and labels ---
  pub(crate) batches_completed: CachePadded<AtomicU64>,
  pub(crate) labels_resolved: CachePadded<AtomicU64>,
  pub(crate) label_failures: CachePadded<AtomicU64>,

  // --- Release ---
  pub(crate) unloads: CachePadded<AtomicU64>,

  created_at: Instant,
}

impl Default for Metrics {
  fn default() -> Self {
    Self {
      hits: CachePadded::new(AtomicU64::new(0)),
      misses: CachePadded::new(AtomicU64::new(0)),
      already_loaded: CachePadded::new(AtomicU64::new(0)),
      loads_dispatched: CachePadded::new(AtomicU64::new(0)),
      loads_coalesced: CachePadded::new(AtomicU64::new(0)),
      loads_succeeded: CachePadded::new(AtomicU64::new(0)),
      loads_failed: CachePadded::new(AtomicU64::new(0)),
      loads_discarded: CachePadded::new(AtomicU64::new(0)),
      batches_completed: CachePadded::new(AtomicU64::new(0)),
      labels_resolved: CachePadded::new(AtomicU64::new(0)),
      label_failures: CachePadded::new(AtomicU64::new(0)),
      unloads: CachePadded::new(AtomicU64::new(0)),
      created_at: Instant::now(),
    }
  }
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub(crate) fn bump(counter: &CachePadded<AtomicU64>) {
    counter.fetch_add(1, Ordering::Relaxed);
  }

  /// Creates a point-in-time snapshot of the current metrics.
  pub(crate) fn snapshot(&self, entries: usize, in_flight: usize) -> MetricsSnapshot {
    let hits = self.hits.load(Ordering::Relaxed);
    let misses = self.misses.load(Ordering::Relaxed);
    let total_lookups = hits + misses;

    MetricsSnapshot {
      hits,
      misses,
      hit_ratio: if total_lookups == 0 {
        0.0
      } else {
        hits as f64 / total_lookups as f64
      },
      already_loaded: self.already_loaded.load(Ordering::Relaxed),
      loads_dispatched: self.loads_dispatched.load(Ordering::Relaxed),
      loads_coalesced: self.loads_coalesced.load(Ordering::Relaxed),
      loads_succeeded: self.loads_succeeded.load(Ordering::Relaxed),
      loads_failed: self.loads_failed.load(Ordering::Relaxed),
      loads_discarded: self.loads_discarded.load(Ordering::Relaxed),
      batches_completed: self.batches_completed.load(Ordering::Relaxed),
      labels_resolved: self.labels_resolved.load(Ordering::Relaxed),
      label_failures: self.label_failures.load(Ordering::Relaxed),
      unloads: self.unloads.load(Ordering::Relaxed),
      entries: entries as u64,
      in_flight: in_flight as u64,
      uptime_secs: self.created_at.elapsed().as_secs(),
    }
  }
}

/// A point-in-time, public-facing snapshot of the cache's metrics.
#[derive(Clone)]
pub struct MetricsSnapshot {
  /// Lookups through `get`/`try_get` that found an entry.
  pub hits: u64,
  /// Lookups through `get`/`try_get` that found nothing.
  pub misses: u64,
  /// The cache hit ratio (hits / (hits + misses)).
  pub hit_ratio: f64,
  /// Load requests answered from the cache without contacting the provider.
  pub already_loaded: u64,
  /// Loads handed to the provider.
  pub loads_dispatched: u64,
  /// Load requests that joined a load already in flight.
  pub loads_coalesced: u64,
  /// Provider loads that completed and were cached.
  pub loads_succeeded: u64,
  /// Provider loads that reported failure.
  pub loads_failed: u64,
  /// Provider loads that completed after their key was unloaded.
  pub loads_discarded: u64,
  /// Batch loads that ran to completion (including empty ones).
  pub batches_completed: u64,
  /// Successful label resolutions.
  pub labels_resolved: u64,
  /// Failed label resolutions.
  pub label_failures: u64,
  /// Entries removed by an unload.
  pub unloads: u64,
  /// Entries currently cached.
  pub entries: u64,
  /// Loads currently waiting on the provider.
  pub in_flight: u64,
  /// The number of seconds the cache has been running.
  pub uptime_secs: u64,
}

impl fmt::Debug for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricsSnapshot")
      .field("hits", &self.hits)
      .field("misses", &self.misses)
      .field("hit_ratio", &format!("{:.2}%", self.hit_ratio * 100.0))
      .field("already_loaded", &self.already_loaded)
      .field("loads_dispatched", &self.loads_dispatched)
      .field("loads_coalesced", &self.loads_coalesced)
      .field("loads_succeeded", &self.loads_succeeded)
      .field("loads_failed", &self.loads_failed)
      .field("loads_discarded", &self.loads_discarded)
      .field("batches_completed", &self.batches_completed)
      .field("labels_resolved", &self.labels_resolved)
      .field("label_failures", &self.label_failures)
      .field("unloads", &self.unloads)
      .field("entries", &self.entries)
      .field("in_flight", &self.in_flight)
      .field("uptime_secs", &self.uptime_secs)
      .finish()
  }
}
