//! An asynchronous asset cache in front of a pluggable resource provider.
//!
//! # Features
//! - **Load-once**: a cached key is answered without contacting the provider,
//!   and concurrent requests for a key that is still loading share one
//!   provider load.
//! - **Batches**: load a list of keys, or a label the provider expands into
//!   keys, and get one aggregate `BatchReport` once every load finished.
//! - **Explicit release**: unloading hands each handle back to the provider.
//!   Unloading a key mid-load discards the late result instead of caching it.
//! - **Runtime-agnostic**: provider futures are driven by a `TaskSpawner`
//!   (Tokio by default).
//! - **Observability**: `tracing` events, an `AssetListener` hook and a
//!   `MetricsSnapshot`.

// Public modules that form the API
pub mod batch;
pub mod builder;
pub mod config;
pub mod error;
pub mod handles;
pub mod listener;
pub mod loader;
pub mod metrics;
pub mod provider;
pub mod runtime;

// Internal, crate-only modules
mod label;
mod shared;

// Re-export the primary user-facing types for convenience
pub use batch::{BatchLoad, BatchPolicy, BatchReport};
pub use builder::AssetCacheBuilder;
pub use config::AssetCacheConfig;
pub use error::{AssetError, BuildError, ProviderError};
pub use handles::AssetCache;
pub use listener::{AssetListener, UnloadReason};
pub use loader::{LoadAsset, LoadOutcome};
pub use metrics::MetricsSnapshot;
pub use provider::{ProviderFuture, ResourceLocations, ResourceProvider};
pub use runtime::TaskSpawner;
#[cfg(feature = "tokio")]
pub use runtime::TokioSpawner;
