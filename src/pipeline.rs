#![forbid(unsafe_code)]

//! One export run: resolve the channel, list its uploads, fetch details.
//!
//! Nothing survives between runs. Callers build a fresh client from the API
//! key, call [`run_export`], and decide what to do with a partial
//! [`ExportReport`].

use std::time::Duration;

use log::{info, warn};

use crate::catalog::{CatalogApi, ChannelItem, parse_count};
use crate::details::{VideoRecord, fetch_details};
use crate::enumerator::enumerate_videos;
use crate::error::{ExportError, TransportError};
use crate::pacing::DEFAULT_DELAY;
use crate::progress::{ProgressSink, Stage};
use crate::resolver::{ChannelId, ChannelRef, resolve_channel};

pub const DEFAULT_MAX_RESULTS: usize = 50;

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub channel: ChannelRef,
    pub max_results: usize,
    pub delay: Duration,
}

impl ExportRequest {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: ChannelRef::new(channel),
            max_results: DEFAULT_MAX_RESULTS,
            delay: DEFAULT_DELAY,
        }
    }
}

/// Outcome of a run that got at least as far as listing videos.
#[derive(Debug)]
pub struct ExportReport {
    pub channel_id: ChannelId,
    pub requested: usize,
    pub enumerated: usize,
    pub records: Vec<VideoRecord>,
    /// Errors that cut a stage short. Empty when the run completed.
    pub issues: Vec<ExportError>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Runs the three stages in order.
///
/// Resolution failures, a failing first playlist page and a failing first
/// details batch are returned as errors. Later failures end their stage
/// early and are collected in [`ExportReport::issues`].
pub fn run_export<C: CatalogApi + ?Sized>(
    api: &C,
    request: &ExportRequest,
    progress: &mut dyn ProgressSink,
) -> Result<ExportReport, ExportError> {
    progress.report(Stage::Resolve, 0, 1);
    let channel_id = resolve_channel(api, &request.channel)?;
    progress.report(Stage::Resolve, 1, 1);

    let mut issues = Vec::new();

    let (video_ids, listing_error) =
        enumerate_videos(api, &channel_id, request.max_results, request.delay, progress)?
            .into_parts();
    issues.extend(listing_error);

    if video_ids.is_empty() {
        warn!("no videos found for channel {channel_id}");
        return Ok(ExportReport {
            channel_id,
            requested: request.max_results,
            enumerated: 0,
            records: Vec::new(),
            issues,
        });
    }

    let (records, details_error) =
        fetch_details(api, &video_ids, request.delay, progress)?.into_parts();
    issues.extend(details_error);

    info!(
        "exported {} of {} listed videos for {channel_id}",
        records.len(),
        video_ids.len()
    );

    Ok(ExportReport {
        channel_id,
        requested: request.max_results,
        enumerated: video_ids.len(),
        records,
        issues,
    })
}

/// Headline numbers of a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub title: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub view_count: u64,
}

impl ChannelInfo {
    fn from_item(item: ChannelItem) -> Self {
        let statistics = item.statistics.unwrap_or_default();
        Self {
            title: item.snippet.map(|snippet| snippet.title).unwrap_or_default(),
            subscriber_count: parse_count(statistics.subscriber_count.as_deref()),
            video_count: parse_count(statistics.video_count.as_deref()),
            view_count: parse_count(statistics.view_count.as_deref()),
        }
    }
}

/// Fetches title and statistics for `channel_id`; `None` when the channel
/// does not exist.
pub fn describe_channel<C: CatalogApi + ?Sized>(
    api: &C,
    channel_id: &ChannelId,
) -> Result<Option<ChannelInfo>, TransportError> {
    Ok(api.channel(channel_id.as_str())?.map(ChannelInfo::from_item))
}

/// Issues one cheap request to check that the API key is accepted.
pub fn check_connection<C: CatalogApi + ?Sized>(api: &C) -> Result<(), TransportError> {
    api.probe()
}

/// User-facing explanation for a failed connection check.
pub fn explain_connection_error(err: &TransportError) -> String {
    match err {
        TransportError::QuotaExceeded { .. } => {
            "API quota exceeded: wait for the daily quota to reset or use another key.".to_string()
        }
        TransportError::Status { status: 403, .. } => {
            "API key error: the key is invalid or lacks permission. Check that YouTube Data API v3 is enabled for it.".to_string()
        }
        TransportError::Status { status: 400, .. } => {
            "API error: bad request. Check the API key value.".to_string()
        }
        other => format!("API error: {other}"),
    }
}
