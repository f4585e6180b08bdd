#![forbid(unsafe_code)]

//! Blocking YouTube Data API v3 client.
//!
//! Each [`CatalogApi`] method maps to exactly one `GET` request. Failures are
//! translated into [`TransportError`] here so no `ureq` type leaks past this
//! module.

use log::debug;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::catalog::{
    CatalogApi, ChannelIdItem, ChannelItem, ListResponse, MAX_PAGE_SIZE, PlaylistItem,
    PlaylistPage, SearchItem, VideoItem,
};
use crate::error::TransportError;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Google error reasons that mean "stop, you are out of quota".
const QUOTA_REASONS: &[&str] = &[
    "quotaExceeded",
    "rateLimitExceeded",
    "userRateLimitExceeded",
    "dailyLimitExceeded",
];

pub struct YouTubeClient {
    agent: ureq::Agent,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_API_BASE)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, &str)],
    ) -> Result<T, TransportError> {
        let url = format!("{}/{resource}", self.base_url);
        debug!("GET {url} {params:?}");

        let mut request = self.agent.get(&url);
        for (name, value) in params {
            request = request.query(name, value);
        }
        request = request.query("key", &self.api_key);

        match request.call() {
            Ok(response) => response
                .into_json::<T>()
                .map_err(|err| TransportError::Decode(format!("{resource}: {err}"))),
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Err(classify_status(status, &body))
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(TransportError::Network(transport.to_string()))
            }
        }
    }
}

impl CatalogApi for YouTubeClient {
    fn channel_id_for_handle(&self, handle: &str) -> Result<Option<String>, TransportError> {
        let response: ListResponse<ChannelIdItem> =
            self.get("channels", &[("part", "id"), ("forHandle", handle)])?;
        Ok(response.items.into_iter().next().map(|item| item.id))
    }

    fn search_channel(&self, query: &str) -> Result<Option<String>, TransportError> {
        let response: ListResponse<SearchItem> = self.get(
            "search",
            &[
                ("part", "snippet"),
                ("type", "channel"),
                ("maxResults", "1"),
                ("q", query),
            ],
        )?;
        Ok(response
            .items
            .iter()
            .find_map(|item| item.channel_id().map(str::to_string)))
    }

    fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<&str>,
        max_results: usize,
    ) -> Result<PlaylistPage, TransportError> {
        let max_results = max_results.clamp(1, MAX_PAGE_SIZE).to_string();
        let mut params = vec![
            ("part", "contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        let response: ListResponse<PlaylistItem> = self.get("playlistItems", &params)?;
        let video_ids = response
            .items
            .into_iter()
            .filter_map(|item| item.content_details?.video_id)
            .collect();
        Ok(PlaylistPage {
            video_ids,
            next_page_token: response.next_page_token.filter(|token| !token.is_empty()),
        })
    }

    fn videos(&self, ids: &[String]) -> Result<Vec<VideoItem>, TransportError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = ids.join(",");
        let response: ListResponse<VideoItem> = self.get(
            "videos",
            &[
                ("part", "snippet,statistics,contentDetails"),
                ("id", joined.as_str()),
                ("maxResults", "50"),
            ],
        )?;
        Ok(response.items)
    }

    fn channel(&self, channel_id: &str) -> Result<Option<ChannelItem>, TransportError> {
        let response: ListResponse<ChannelItem> = self.get(
            "channels",
            &[("part", "snippet,statistics"), ("id", channel_id)],
        )?;
        Ok(response.items.into_iter().next())
    }

    fn probe(&self) -> Result<(), TransportError> {
        let _: ListResponse<SearchItem> = self.get(
            "search",
            &[
                ("part", "snippet"),
                ("type", "video"),
                ("maxResults", "1"),
                ("q", "test"),
            ],
        )?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

/// Turns a non-2xx response into the matching [`TransportError`].
pub fn classify_status(status: u16, body: &str) -> TransportError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let quota_reason = parsed.as_ref().is_some_and(|envelope| {
        envelope
            .error
            .errors
            .iter()
            .any(|detail| QUOTA_REASONS.contains(&detail.reason.as_str()))
    });
    let message = parsed
        .map(|envelope| envelope.error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| body.trim().chars().take(200).collect());

    if status == 429 || quota_reason {
        TransportError::QuotaExceeded { status, message }
    } else {
        TransportError::Status { status, message }
    }
}
