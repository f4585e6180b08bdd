#![forbid(unsafe_code)]

//! Turns whatever the user typed into a canonical channel id.
//!
//! Resolution walks [`RESOLUTION_ORDER`] and stops at the first strategy that
//! yields an id. Only the canonical-id check is free; the handle lookup and the
//! channel search cost one remote call each.

use std::fmt;

use log::{debug, info, warn};

use crate::catalog::CatalogApi;
use crate::error::{ExportError, TransportError};

const CANONICAL_PREFIX: &str = "UC";
const CANONICAL_LEN: usize = 24;

/// A channel reference as supplied by the user: a channel id, an `@handle`,
/// a free-text name, or a channel URL wrapping one of the first two.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    raw: String,
    normalized: String,
}

impl ChannelRef {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize_reference(&raw);
        Self { raw, normalized }
    }

    /// The reference exactly as it was supplied.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The reference with URLs and surrounding whitespace stripped.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Handle form of the reference, `@`-prefixed.
    pub fn as_handle(&self) -> String {
        if self.normalized.starts_with('@') {
            self.normalized.clone()
        } else {
            format!("@{}", self.normalized)
        }
    }
}

fn normalize_reference(raw: &str) -> String {
    let trimmed = raw.trim();
    let tail = |marker: &str| {
        trimmed.split_once(marker).map(|(_, rest)| {
            rest.split(['/', '?', '#'])
                .next()
                .unwrap_or_default()
                .to_string()
        })
    };

    if let Some(id) = tail("/channel/").filter(|id| !id.is_empty()) {
        return id;
    }
    if let Some(handle) = tail("/@").filter(|handle| !handle.is_empty()) {
        return format!("@{handle}");
    }
    trimmed.to_string()
}

/// Canonical channel identifier (`UC` followed by 22 id characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId(String);

impl ChannelId {
    /// Accepts `value` only when it already has the canonical shape.
    pub fn parse_canonical(value: &str) -> Option<Self> {
        is_canonical_id(value).then(|| Self(value.to_string()))
    }

    pub(crate) fn from_api(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id of the playlist holding every upload of the channel: the channel id
    /// with its second character replaced by `U`.
    pub fn uploads_playlist_id(&self) -> String {
        self.0
            .chars()
            .enumerate()
            .map(|(index, ch)| if index == 1 { 'U' } else { ch })
            .collect()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn is_canonical_id(value: &str) -> bool {
    value.len() == CANONICAL_LEN
        && value.starts_with(CANONICAL_PREFIX)
        && value[CANONICAL_PREFIX.len()..]
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    CanonicalId,
    Handle,
    Search,
}

pub const RESOLUTION_ORDER: [Strategy; 3] =
    [Strategy::CanonicalId, Strategy::Handle, Strategy::Search];

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::CanonicalId => "channel id",
            Strategy::Handle => "handle lookup",
            Strategy::Search => "channel search",
        }
    }

    /// Runs this strategy alone. `Ok(None)` means "not found this way".
    pub fn attempt<C: CatalogApi + ?Sized>(
        self,
        reference: &ChannelRef,
        api: &C,
    ) -> Result<Option<ChannelId>, TransportError> {
        match self {
            Strategy::CanonicalId => Ok(ChannelId::parse_canonical(reference.as_str())),
            Strategy::Handle => Ok(api
                .channel_id_for_handle(&reference.as_handle())?
                .map(ChannelId::from_api)),
            Strategy::Search => {
                let query = reference.as_str().trim_start_matches('@');
                if query.is_empty() {
                    return Ok(None);
                }
                Ok(api.search_channel(query)?.map(ChannelId::from_api))
            }
        }
    }
}

/// Resolves `reference` to a channel id.
///
/// A strategy that fails with a transport error is skipped, except for quota
/// exhaustion: every later strategy would hit the same wall, so that error is
/// returned as is.
pub fn resolve_channel<C: CatalogApi + ?Sized>(
    api: &C,
    reference: &ChannelRef,
) -> Result<ChannelId, ExportError> {
    if reference.as_str().is_empty() {
        return Err(ExportError::ChannelNotFound {
            reference: reference.raw().to_string(),
        });
    }

    for strategy in RESOLUTION_ORDER {
        match strategy.attempt(reference, api) {
            Ok(Some(channel_id)) => {
                info!(
                    "resolved {:?} to {channel_id} via {}",
                    reference.raw(),
                    strategy.name()
                );
                return Ok(channel_id);
            }
            Ok(None) => debug!("{} found nothing for {:?}", strategy.name(), reference.raw()),
            Err(err) if err.is_quota_exceeded() => return Err(err.into()),
            Err(err) => warn!("{} failed for {:?}: {err}", strategy.name(), reference.raw()),
        }
    }

    Err(ExportError::ChannelNotFound {
        reference: reference.raw().to_string(),
    })
}
