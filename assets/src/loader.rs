use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use crate::error::AssetError;

/// What every waiter of a single-key load receives.
pub type LoadOutcome<H> = Result<Arc<H>, AssetError>;

/// The internal state of a key being loaded.
pub(crate) enum State<H> {
  Loading,
  Complete(LoadOutcome<H>),
}

/// The internal, mutex-protected core of the LoadFuture.
pub(crate) struct Inner<H> {
  pub(crate) state: State<H>,
  pub(crate) waiters: VecDeque<Waker>,
}

/// A load that has been dispatched to the provider and is shared by every
/// caller that asked for the same key while it was in flight.
pub(crate) struct LoadFuture<H> {
  pub(crate) inner: Mutex<Inner<H>>,
}

impl<H> LoadFuture<H> {
  /// Creates a new `LoadFuture` in the "Loading" state.
  pub fn new() -> Self {
    Self {
      inner: Mutex::new(Inner {
        state: State::Loading,
        waiters: VecDeque::new(),
      }),
    }
  }

  /// Completes the future with an outcome, waking all waiters.
  ///
  /// Only the first completion is kept.
  pub fn complete(&self, outcome: LoadOutcome<H>) {
    let waiters = {
      let mut inner = self.inner.lock();
      if let State::Complete(_) = inner.state {
        return;
      }
      inner.state = State::Complete(outcome);
      std::mem::take(&mut inner.waiters)
    };
    for waker in waiters {
      waker.wake();
    }
  }

  pub fn is_complete(&self) -> bool {
    matches!(self.inner.lock().state, State::Complete(_))
  }
}

impl<H> Future for &LoadFuture<H> {
  type Output = LoadOutcome<H>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let mut inner = self.inner.lock();
    match &inner.state {
      State::Complete(outcome) => Poll::Ready(outcome.clone()),
      State::Loading => {
        if !inner.waiters.iter().any(|w| w.will_wake(cx.waker())) {
          inner.waiters.push_back(cx.waker().clone());
        }
        Poll::Pending
      }
    }
  }
}

/// The future returned by `AssetCache::load`.
///
/// The provider load (if one was needed) is already running by the time this
/// value exists; awaiting it only waits for the outcome. Dropping it does not
/// cancel the load.
#[must_use = "the load runs regardless, but its outcome is lost if this future is dropped"]
pub struct LoadAsset<H> {
  kind: LoadKind<H>,
}

enum LoadKind<H> {
  Ready(Option<LoadOutcome<H>>),
  Waiting(Arc<LoadFuture<H>>),
}

impl<H> LoadAsset<H> {
  pub(crate) fn ready(outcome: LoadOutcome<H>) -> Self {
    Self {
      kind: LoadKind::Ready(Some(outcome)),
    }
  }

  pub(crate) fn waiting(future: Arc<LoadFuture<H>>) -> Self {
    Self {
      kind: LoadKind::Waiting(future),
    }
  }

  /// Whether the outcome is already available without waiting.
  pub fn is_ready(&self) -> bool {
    match &self.kind {
      LoadKind::Ready(outcome) => outcome.is_some(),
      LoadKind::Waiting(future) => future.is_complete(),
    }
  }
}

impl<H> Future for LoadAsset<H> {
  type Output = LoadOutcome<H>;

  fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
    let this = self.get_mut();
    match &mut this.kind {
      LoadKind::Ready(outcome) => match outcome.take() {
        Some(outcome) => Poll::Ready(outcome),
        None => panic!("LoadAsset polled after completion"),
      },
      LoadKind::Waiting(future) => {
        let mut shared = &**future;
        Pin::new(&mut shared).poll(cx)
      }
    }
  }
}
