#![forbid(unsafe_code)]

//! Lists a channel's uploads, newest first, via its uploads playlist.

use std::time::Duration;

use log::{debug, info, warn};

use crate::catalog::{CatalogApi, MAX_PAGE_SIZE};
use crate::error::ExportError;
use crate::pacing::Pacer;
use crate::partial::Partial;
use crate::progress::{ProgressSink, Stage};
use crate::resolver::ChannelId;

pub type VideoId = String;

/// Collects up to `max_results` video ids from the channel's uploads.
///
/// A failing first page is an error. A failing later page ends the listing
/// and the ids gathered so far come back with the error attached.
pub fn enumerate_videos<C: CatalogApi + ?Sized>(
    api: &C,
    channel_id: &ChannelId,
    max_results: usize,
    delay: Duration,
    progress: &mut dyn ProgressSink,
) -> Result<Partial<VideoId>, ExportError> {
    if max_results == 0 {
        return Ok(Partial::complete(Vec::new()));
    }

    let playlist_id = channel_id.uploads_playlist_id();
    let mut pacer = Pacer::new(delay);
    let mut video_ids: Vec<VideoId> = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let remaining = max_results - video_ids.len();
        pacer.before_call();
        debug!(
            "listing {playlist_id} page {} (cursor {cursor:?})",
            pacer.calls()
        );

        let page = match api.playlist_page(
            &playlist_id,
            cursor.as_deref(),
            remaining.min(MAX_PAGE_SIZE),
        ) {
            Ok(page) => page,
            Err(source) => {
                let err = ExportError::EnumerationFailed {
                    channel_id: channel_id.to_string(),
                    source,
                };
                if pacer.calls() == 1 {
                    return Err(err);
                }
                warn!(
                    "stopping video listing after {} ids: {err}",
                    video_ids.len()
                );
                return Ok(Partial::interrupted(video_ids, err));
            }
        };

        video_ids.extend(page.video_ids);
        video_ids.truncate(max_results);
        progress.report(Stage::Enumerate, video_ids.len(), max_results);

        if video_ids.len() >= max_results {
            break;
        }
        match page.next_page_token {
            Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
            _ => break,
        }
    }

    info!(
        "listed {} videos from {playlist_id} in {} page(s)",
        video_ids.len(),
        pacer.calls()
    );
    Ok(Partial::complete(video_ids))
}
