//! # Tributary
//!
//! Mirrors a fixed set of remote assets onto disk, re-downloading only what
//! changed.
//!
//! ## Architecture
//!
//! ```text
//! BatchRunner → (N workers) → ConditionalFetcher → {MetadataStore, AtomicWriter}
//! ```
//!
//! - [`fetcher`]: HTTP client with ETag/Last-Modified conditional requests,
//!   plus the worker pool that drives a whole batch under one deadline
//! - [`cache`]: JSON sidecar (`<file>.meta.json`) holding the validators
//! - [`writer`]: temp-file-then-rename publication
//!
//! ## Quick Start
//!
//! ```bash
//! # tributary.toml
//! # output_dir = "public/logos"
//! #
//! # [[items]]
//! # path = "rust.svg"
//! # url = "https://example.com/rust.svg"
//!
//! tributary --config tributary.toml --parallel 8 --strict
//! ```
//!
//! ## Library use
//!
//! ```rust,ignore
//! use tributary::app::AppContext;
//! use tributary::config::Manifest;
//!
//! let manifest = Manifest::load("tributary.toml".as_ref())?;
//! let ctx = AppContext::new(&manifest)?;
//! let batch = ctx.runner.run(&manifest.items).await;
//! assert_eq!(batch.len(), manifest.items.len());
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the HTTP
/// fetcher, the sidecar store and the batch runner.
pub mod app;

/// Sidecar cache metadata.
///
/// - [`CacheMetadata`](cache::CacheMetadata): validators and provenance of a published file
/// - [`MetadataStore`](cache::MetadataStore): load/save trait
/// - [`SidecarStore`](cache::SidecarStore): JSON file next to each destination
pub mod cache;

/// Command-line interface using clap, and the summary report.
pub mod cli;

/// Manifest loading and validation.
pub mod config;

/// Core domain models.
///
/// - [`FetchItem`](domain::FetchItem): one asset to mirror
/// - [`FetchResult`](domain::FetchResult): per-item outcome, keyed by input index
/// - [`BatchResult`](domain::BatchResult): ordered results of a batch
pub mod domain;

/// HTTP fetching with conditional request support.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for a single conditional GET
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
/// - [`ConditionalFetcher`](fetcher::conditional::ConditionalFetcher): cache-aware fetch of one item
/// - [`BatchRunner`](fetcher::parallel::BatchRunner): fixed worker pool with a batch deadline
pub mod fetcher;

/// Atomic temp-file-then-rename writes.
pub mod writer;
