#![forbid(unsafe_code)]

//! Exports per-video metadata of a YouTube channel to CSV using the YouTube
//! Data API v3.
//!
//! One run walks three stages in order: resolve the channel reference, list
//! the uploads playlist, then fetch video details in batches and map them to
//! [`VideoRecord`] rows. The binaries under `src/bin/` are thin presentation
//! layers over [`pipeline::run_export`].

pub mod catalog;
pub mod client;
pub mod config;
pub mod csv_export;
pub mod details;
pub mod enumerator;
pub mod error;
pub mod pacing;
pub mod partial;
pub mod pipeline;
pub mod progress;
pub mod resolver;

pub use catalog::CatalogApi;
pub use client::YouTubeClient;
pub use details::VideoRecord;
pub use error::{ExportError, TransportError};
pub use partial::Partial;
pub use pipeline::{ExportReport, ExportRequest, run_export};
pub use progress::{ProgressSink, Stage};
pub use resolver::{ChannelId, ChannelRef};
