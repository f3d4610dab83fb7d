//! Fan-out/fan-in of single-key loads into one aggregate outcome.

use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_util::stream::{FuturesUnordered, StreamExt};

use crate::error::AssetError;
use crate::loader::{LoadAsset, LoadOutcome};
use crate::metrics::Metrics;

/// How a batch with failed keys reports its aggregate outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BatchPolicy {
  /// The batch succeeds only if every dispatched load succeeded.
  #[default]
  Strict,
  /// The batch succeeds once every dispatched load has finished, whatever
  /// their outcomes. Failures are only visible through the report.
  Lenient,
}

/// The aggregate outcome of a batch load.
#[derive(Debug, Clone)]
pub struct BatchReport {
  already_loaded: Vec<String>,
  loaded: Vec<String>,
  failures: Vec<(String, AssetError)>,
  success: bool,
}

impl BatchReport {
  pub(crate) fn skipped_only(already_loaded: Vec<String>) -> Self {
    Self {
      already_loaded,
      loaded: Vec::new(),
      failures: Vec::new(),
      success: true,
    }
  }

  /// The aggregate outcome according to the cache's `BatchPolicy`.
  pub fn success(&self) -> bool {
    self.success
  }

  /// Keys that were cached before the batch started and were skipped.
  pub fn already_loaded(&self) -> &[String] {
    &self.already_loaded
  }

  /// Keys loaded by this batch, in completion order.
  pub fn loaded(&self) -> &[String] {
    &self.loaded
  }

  /// Failed keys with their errors, in completion order.
  pub fn failures(&self) -> &[(String, AssetError)] {
    &self.failures
  }

  pub fn failed_keys(&self) -> Vec<&str> {
    self.failures.iter().map(|(key, _)| key.as_str()).collect()
  }

  /// True when no key failed, regardless of policy.
  pub fn all_succeeded(&self) -> bool {
    self.failures.is_empty()
  }
}

/// A single dispatched load tagged with its key.
struct KeyedLoad<H> {
  key: Option<String>,
  load: LoadAsset<H>,
}

impl<H> Future for KeyedLoad<H> {
  type Output = (String, LoadOutcome<H>);

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();
    match Pin::new(&mut this.load).poll(cx) {
      Poll::Ready(outcome) => {
        let key = this.key.take().unwrap_or_default();
        Poll::Ready((key, outcome))
      }
      Poll::Pending => Poll::Pending,
    }
  }
}

struct Coordinator<H> {
  loads: FuturesUnordered<KeyedLoad<H>>,
  remaining: usize,
  overall_success: bool,
  already_loaded: Vec<String>,
  loaded: Vec<String>,
  failures: Vec<(String, AssetError)>,
  policy: BatchPolicy,
  metrics: Arc<Metrics>,
  cache_name: Arc<str>,
}

impl<H> Coordinator<H> {
  fn record(&mut self, key: String, outcome: LoadOutcome<H>) {
    match outcome {
      Ok(_) => self.loaded.push(key),
      Err(error) => {
        self.failures.push((key, error));
        self.overall_success = false;
      }
    }
    self.remaining -= 1;
  }

  fn finish(&mut self) -> BatchReport {
    Metrics::bump(&self.metrics.batches_completed);

    if !self.overall_success {
      tracing::warn!(
        cache = %self.cache_name,
        failed = ?self.failures.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>(),
        "batch load finished with failures"
      );
    }
    tracing::debug!(
      cache = %self.cache_name,
      loaded = self.loaded.len(),
      failed = self.failures.len(),
      "batch load complete"
    );

    let success = match self.policy {
      BatchPolicy::Strict => self.overall_success,
      BatchPolicy::Lenient => true,
    };

    BatchReport {
      already_loaded: mem::take(&mut self.already_loaded),
      loaded: mem::take(&mut self.loaded),
      failures: mem::take(&mut self.failures),
      success,
    }
  }
}

enum BatchState<H> {
  Ready(BatchReport),
  Running(Coordinator<H>),
  Done,
}

/// The future returned by `AssetCache::load_batch`.
///
/// Every load of the batch is dispatched before this value is returned. It
/// resolves exactly once, after the last of them has finished.
#[must_use = "the loads run regardless, but the batch outcome is lost if this future is dropped"]
pub struct BatchLoad<H> {
  state: BatchState<H>,
}

impl<H> BatchLoad<H> {
  /// A batch with nothing to dispatch. Resolves on first poll.
  pub(crate) fn ready(report: BatchReport) -> Self {
    Self {
      state: BatchState::Ready(report),
    }
  }

  pub(crate) fn dispatched(
    loads: Vec<(String, LoadAsset<H>)>,
    already_loaded: Vec<String>,
    policy: BatchPolicy,
    metrics: Arc<Metrics>,
    cache_name: Arc<str>,
  ) -> Self {
    let remaining = loads.len();
    let loads = loads
      .into_iter()
      .map(|(key, load)| KeyedLoad {
        key: Some(key),
        load,
      })
      .collect();

    Self {
      state: BatchState::Running(Coordinator {
        loads,
        remaining,
        overall_success: true,
        already_loaded,
        loaded: Vec::with_capacity(remaining),
        failures: Vec::new(),
        policy,
        metrics,
        cache_name,
      }),
    }
  }

  /// Whether the batch needs no further waiting.
  pub fn is_ready(&self) -> bool {
    matches!(self.state, BatchState::Ready(_))
  }

  /// The number of dispatched loads that have not finished yet, as of the
  /// last poll.
  pub fn remaining(&self) -> usize {
    match &self.state {
      BatchState::Running(coordinator) => coordinator.remaining,
      _ => 0,
    }
  }
}

impl<H> Future for BatchLoad<H> {
  type Output = BatchReport;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();

    if matches!(this.state, BatchState::Ready(_)) {
      if let BatchState::Ready(report) = mem::replace(&mut this.state, BatchState::Done) {
        return Poll::Ready(report);
      }
    }

    let coordinator = match &mut this.state {
      BatchState::Running(coordinator) => coordinator,
      _ => panic!("BatchLoad polled after completion"),
    };

    while coordinator.remaining > 0 {
      match coordinator.loads.poll_next_unpin(cx) {
        Poll::Ready(Some((key, outcome))) => coordinator.record(key, outcome),
        Poll::Ready(None) => break,
        Poll::Pending => return Poll::Pending,
      }
    }

    let report = coordinator.finish();
    this.state = BatchState::Done;
    Poll::Ready(report)
  }
}
