#![forbid(unsafe_code)]

//! The remote catalog as seen by the export stages.
//!
//! [`CatalogApi`] is the seam between the pipeline and the YouTube Data API:
//! the production implementation lives in [`crate::client`], tests plug in an
//! in-memory fake. Wire structs mirror the JSON the API returns and keep every
//! part optional, since videos with disabled counts or removed snippets still
//! show up in listings.

use serde::Deserialize;

use crate::error::TransportError;

/// Hard upper bound the API accepts for `maxResults` and for `id=` lists.
pub const MAX_PAGE_SIZE: usize = 50;

/// Remote calls the exporter issues. Every method is one blocking request.
pub trait CatalogApi {
    /// `channels.list?forHandle=`; `handle` already carries its `@`.
    fn channel_id_for_handle(&self, handle: &str) -> Result<Option<String>, TransportError>;

    /// `search.list` restricted to channels, first hit only.
    fn search_channel(&self, query: &str) -> Result<Option<String>, TransportError>;

    /// One page of `playlistItems.list`.
    fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<PlaylistPage, TransportError>;

    /// `videos.list` with snippet, statistics and contentDetails parts.
    /// Callers never pass more than [`MAX_PAGE_SIZE`] ids.
    fn videos(&self, ids: &[String]) -> Result<Vec<VideoItem>, TransportError>;

    /// `channels.list?id=` with snippet and statistics parts.
    fn channel(&self, channel_id: &str) -> Result<Option<ChannelItem>, TransportError>;

    /// Cheapest call that proves the key is accepted.
    fn probe(&self) -> Result<(), TransportError>;
}

/// Video ids of one playlist page plus the continuation cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaylistPage {
    pub video_ids: Vec<String>,
    pub next_page_token: Option<String>,
}

/// Envelope shared by every `*.list` response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelIdItem {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub id: Option<SearchResultId>,
    #[serde(default)]
    pub snippet: Option<SearchSnippet>,
}

impl SearchItem {
    pub fn channel_id(&self) -> Option<&str> {
        self.snippet
            .as_ref()
            .and_then(|snippet| snippet.channel_id.as_deref())
            .or_else(|| self.id.as_ref().and_then(|id| id.channel_id.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResultId {
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    #[serde(default)]
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    #[serde(default)]
    pub content_details: Option<PlaylistItemContentDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemContentDetails {
    #[serde(default)]
    pub video_id: Option<String>,
}

/// A single `videos.list` item.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    #[serde(default)]
    pub snippet: Option<VideoSnippet>,
    #[serde(default)]
    pub statistics: Option<VideoStatistics>,
    #[serde(default)]
    pub content_details: Option<VideoContentDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Counts come back as decimal strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    #[serde(default)]
    pub view_count: Option<String>,
    #[serde(default)]
    pub like_count: Option<String>,
    #[serde(default)]
    pub comment_count: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoContentDetails {
    #[serde(default)]
    pub duration: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelItem {
    pub id: String,
    #[serde(default)]
    pub snippet: Option<ChannelSnippet>,
    #[serde(default)]
    pub statistics: Option<ChannelStatistics>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelSnippet {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    #[serde(default)]
    pub subscriber_count: Option<String>,
    #[serde(default)]
    pub video_count: Option<String>,
    #[serde(default)]
    pub view_count: Option<String>,
}

/// Parses the API's string-encoded counters, treating anything unusable as 0.
pub fn parse_count(value: Option<&str>) -> u64 {
    value
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(0)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_item_tolerates_missing_parts() {
        let item: VideoItem = serde_json::from_str(r#"{"id":"abc"}"#).unwrap();
        assert_eq!(item.id, "abc");
        assert!(item.snippet.is_none());
        assert!(item.statistics.is_none());
        assert!(item.content_details.is_none());
    }

    #[test]
    fn list_response_reads_items_and_cursor() {
        let raw = r#"{
            "kind": "youtube#playlistItemListResponse",
            "nextPageToken": "CAUQAA",
            "items": [
                {"contentDetails": {"videoId": "v1", "videoPublishedAt": "2024-01-01T00:00:00Z"}},
                {"contentDetails": {}}
            ]
        }"#;
        let response: ListResponse<PlaylistItem> = serde_json::from_str(raw).unwrap();
        assert_eq!(response.next_page_token.as_deref(), Some("CAUQAA"));
        let ids: Vec<_> = response
            .items
            .iter()
            .filter_map(|item| item.content_details.as_ref()?.video_id.clone())
            .collect();
        assert_eq!(ids, vec!["v1".to_string()]);
    }

    #[test]
    fn list_response_without_items_is_empty() {
        let response: ListResponse<ChannelIdItem> =
            serde_json::from_str(r#"{"kind":"youtube#channelListResponse","pageInfo":{}}"#)
                .unwrap();
        assert!(response.items.is_empty());
        assert!(response.next_page_token.is_none());
    }

    #[test]
    fn search_item_prefers_snippet_channel_id() {
        let raw = r#"{"id":{"kind":"youtube#channel","channelId":"UCfromid"},
                      "snippet":{"channelId":"UCfromsnippet"}}"#;
        let item: SearchItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item.channel_id(), Some("UCfromsnippet"));

        let only_id: SearchItem =
            serde_json::from_str(r#"{"id":{"channelId":"UCfromid"}}"#).unwrap();
        assert_eq!(only_id.channel_id(), Some("UCfromid"));
    }

    #[test]
    fn parse_count_defaults_to_zero() {
        assert_eq!(parse_count(Some("1234")), 1234);
        assert_eq!(parse_count(Some("n/a")), 0);
        assert_eq!(parse_count(None), 0);
    }
}
