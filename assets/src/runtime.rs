use futures_util::future::BoxFuture;

/// A trait for driving provider loads on an asynchronous runtime.
///
/// Every load dispatched to the provider is wrapped in a task and handed to
/// the spawner, so a load keeps running even when the caller that started it
/// stops waiting.
pub trait TaskSpawner: Send + Sync + 'static {
  /// Spawns a type-erased future.
  fn spawn(&self, future: BoxFuture<'static, ()>);
}

/// Any `Fn(BoxFuture)` closure can act as a spawner, e.g. one forwarding to a
/// `futures_executor::ThreadPool`.
impl<F> TaskSpawner for F
where
  F: Fn(BoxFuture<'static, ()>) + Send + Sync + 'static,
{
  fn spawn(&self, future: BoxFuture<'static, ()>) {
    self(future)
  }
}

#[cfg(feature = "tokio")]
#[derive(Debug, Clone)]
pub struct TokioSpawner(tokio::runtime::Handle);

#[cfg(feature = "tokio")]
impl TokioSpawner {
  /// Creates a spawner that uses the current Tokio runtime context.
  /// Panics if called outside of a Tokio runtime.
  pub fn new() -> Self {
    Self(tokio::runtime::Handle::current())
  }

  /// Like `new`, but returns `None` outside of a Tokio runtime.
  pub fn try_current() -> Option<Self> {
    tokio::runtime::Handle::try_current().ok().map(Self)
  }

  /// Spawns onto an explicit runtime.
  pub fn from_handle(handle: tokio::runtime::Handle) -> Self {
    Self(handle)
  }
}

#[cfg(feature = "tokio")]
impl TaskSpawner for TokioSpawner {
  fn spawn(&self, future: BoxFuture<'static, ()>) {
    self.0.spawn(future);
  }
}
