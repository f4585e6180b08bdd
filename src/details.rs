#![forbid(unsafe_code)]

//! Fetches full video details in batches and flattens them into CSV rows.

use std::collections::HashMap;
use std::time::Duration;

use chrono::DateTime;
use log::{debug, info, warn};

use crate::catalog::{CatalogApi, MAX_PAGE_SIZE, VideoItem, parse_count};
use crate::enumerator::VideoId;
use crate::error::ExportError;
use crate::pacing::Pacer;
use crate::partial::Partial;
use crate::progress::{ProgressSink, Stage};

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Column order of the exported file.
pub const COLUMNS: [&str; 12] = [
    "title",
    "video_id",
    "url",
    "view_count",
    "like_count",
    "comment_count",
    "publish_date",
    "duration_seconds",
    "description",
    "tags",
    "transcript",
    "content",
];

/// One exported row.
///
/// `transcript` and `content` always repeat `description`; downstream tools
/// expect all three columns to be present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRecord {
    pub title: String,
    pub video_id: String,
    pub url: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub publish_date: String,
    pub duration_seconds: u64,
    pub description: String,
    pub tags: String,
    pub transcript: String,
    pub content: String,
}

impl VideoRecord {
    /// Builds the row for one `videos.list` item. Missing parts default
    /// instead of failing.
    pub fn from_item(item: &VideoItem) -> Self {
        let snippet = item.snippet.as_ref();
        let statistics = item.statistics.as_ref();

        let description = snippet
            .map(|snippet| snippet.description.clone())
            .unwrap_or_default();
        let tags = snippet
            .and_then(|snippet| snippet.tags.as_ref())
            .map(|tags| tags.join(", "))
            .unwrap_or_default();
        let duration = item
            .content_details
            .as_ref()
            .and_then(|details| details.duration.as_deref());

        Self {
            title: snippet.map(|snippet| snippet.title.clone()).unwrap_or_default(),
            video_id: item.id.clone(),
            url: watch_url(&item.id),
            view_count: parse_count(statistics.and_then(|stats| stats.view_count.as_deref())),
            like_count: parse_count(statistics.and_then(|stats| stats.like_count.as_deref())),
            comment_count: parse_count(
                statistics.and_then(|stats| stats.comment_count.as_deref()),
            ),
            publish_date: publish_date(snippet.and_then(|snippet| snippet.published_at.as_deref())),
            duration_seconds: duration.and_then(parse_iso8601_duration).unwrap_or(0),
            transcript: description.clone(),
            content: description.clone(),
            description,
            tags,
        }
    }

    /// Field values in [`COLUMNS`] order.
    pub fn to_row(&self) -> [String; 12] {
        [
            self.title.clone(),
            self.video_id.clone(),
            self.url.clone(),
            self.view_count.to_string(),
            self.like_count.to_string(),
            self.comment_count.to_string(),
            self.publish_date.clone(),
            self.duration_seconds.to_string(),
            self.description.clone(),
            self.tags.clone(),
            self.transcript.clone(),
            self.content.clone(),
        ]
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_URL_PREFIX}{video_id}")
}

/// Date part (`YYYY-MM-DD`) of an RFC 3339 timestamp.
fn publish_date(published_at: Option<&str>) -> String {
    let Some(raw) = published_at.map(str::trim).filter(|value| !value.is_empty()) else {
        return String::new();
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(datetime) => datetime.date_naive().format("%Y-%m-%d").to_string(),
        Err(_) => raw.split('T').next().unwrap_or(raw).to_string(),
    }
}

/// Parses an ISO-8601 duration such as `PT1H2M3S` or `P1DT4M` into seconds.
///
/// Every component is optional (`PT` is zero seconds). Returns `None` for
/// anything that is not a well-formed duration.
pub fn parse_iso8601_duration(value: &str) -> Option<u64> {
    let rest = value.trim().strip_prefix('P')?;
    let mut total: u64 = 0;
    let mut in_time = false;
    let mut digits = String::new();

    for ch in rest.chars() {
        match ch {
            '0'..='9' => digits.push(ch),
            'T' if !in_time && digits.is_empty() => in_time = true,
            unit => {
                let amount: u64 = digits.parse().ok()?;
                digits.clear();
                let factor = match (in_time, unit) {
                    (false, 'W') => 604_800,
                    (false, 'D') => 86_400,
                    (true, 'H') => 3_600,
                    (true, 'M') => 60,
                    (true, 'S') => 1,
                    _ => return None,
                };
                total = total.checked_add(amount.checked_mul(factor)?)?;
            }
        }
    }

    digits.is_empty().then_some(total)
}

/// Fetches details for `video_ids` in batches of [`MAX_PAGE_SIZE`].
///
/// Videos the API no longer returns are skipped. Rows keep the order of
/// `video_ids`. A failing first batch is an error; a later failing batch
/// stops the loop and the rows mapped so far come back with the error.
pub fn fetch_details<C: CatalogApi + ?Sized>(
    api: &C,
    video_ids: &[VideoId],
    delay: Duration,
    progress: &mut dyn ProgressSink,
) -> Result<Partial<VideoRecord>, ExportError> {
    let total = video_ids.len().div_ceil(MAX_PAGE_SIZE);
    let mut pacer = Pacer::new(delay);
    let mut records = Vec::with_capacity(video_ids.len());

    for (index, batch) in video_ids.chunks(MAX_PAGE_SIZE).enumerate() {
        let batch_number = index + 1;
        pacer.before_call();
        debug!("fetching details batch {batch_number}/{total} ({} ids)", batch.len());

        let items = match api.videos(batch) {
            Ok(items) => items,
            Err(source) => {
                let err = ExportError::DetailFetchFailed {
                    batch: batch_number,
                    total,
                    source,
                };
                if index == 0 {
                    return Err(err);
                }
                warn!("stopping after {} rows: {err}", records.len());
                return Ok(Partial::interrupted(records, err));
            }
        };

        let mut by_id: HashMap<&str, &VideoItem> =
            items.iter().map(|item| (item.id.as_str(), item)).collect();
        let before = records.len();
        for id in batch {
            if let Some(item) = by_id.remove(id.as_str()) {
                records.push(VideoRecord::from_item(item));
            }
        }
        let dropped = batch.len() - (records.len() - before);
        if dropped > 0 {
            info!("{dropped} video(s) in batch {batch_number} are no longer available");
        }

        progress.report(Stage::Details, batch_number, total);
    }

    Ok(Partial::complete(records))
}
