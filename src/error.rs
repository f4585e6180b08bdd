#![forbid(unsafe_code)]

use thiserror::Error;

/// Failure of a single remote call, already translated out of the HTTP layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("YouTube API quota exceeded (HTTP {status}): {message}")]
    QuotaExceeded { status: u16, message: String },

    #[error("YouTube API returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request to YouTube API failed: {0}")]
    Network(String),

    #[error("could not decode YouTube API response: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::QuotaExceeded { status, .. } | TransportError::Status { status, .. } => {
                Some(*status)
            }
            TransportError::Network(_) | TransportError::Decode(_) => None,
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, TransportError::QuotaExceeded { .. })
    }
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("channel not found: {reference}")]
    ChannelNotFound { reference: String },

    #[error("could not list videos for channel {channel_id}: {source}")]
    EnumerationFailed {
        channel_id: String,
        #[source]
        source: TransportError,
    },

    #[error("fetching video details failed on batch {batch}/{total}: {source}")]
    DetailFetchFailed {
        batch: usize,
        total: usize,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// The transport failure underneath this error, if any.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            ExportError::EnumerationFailed { source, .. }
            | ExportError::DetailFetchFailed { source, .. }
            | ExportError::Transport(source) => Some(source),
            _ => None,
        }
    }

    pub fn is_quota_exceeded(&self) -> bool {
        self.transport()
            .is_some_and(TransportError::is_quota_exceeded)
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_reported_for_http_failures_only() {
        let quota = TransportError::QuotaExceeded {
            status: 403,
            message: "quota".into(),
        };
        assert_eq!(quota.status(), Some(403));
        assert!(quota.is_quota_exceeded());
        assert_eq!(TransportError::Network("reset".into()).status(), None);
    }

    #[test]
    fn quota_is_visible_through_wrapping_errors() {
        let err = ExportError::DetailFetchFailed {
            batch: 2,
            total: 4,
            source: TransportError::QuotaExceeded {
                status: 429,
                message: "slow down".into(),
            },
        };
        assert!(err.is_quota_exceeded());
        assert!(err.to_string().contains("batch 2/4"));

        let not_found = ExportError::ChannelNotFound {
            reference: "@nobody".into(),
        };
        assert!(!not_found.is_quota_exceeded());
        assert!(not_found.to_string().contains("@nobody"));
    }
}
