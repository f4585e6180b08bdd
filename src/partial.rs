#![forbid(unsafe_code)]

use crate::error::ExportError;

/// Items collected by a stage that may have stopped early.
///
/// `error` is the failure that ended the stage; when it is `None` the stage
/// ran to completion. Keeping both lets the caller write what was collected
/// and still report why the output is short.
#[derive(Debug)]
pub struct Partial<T> {
    pub items: Vec<T>,
    pub error: Option<ExportError>,
}

impl<T> Partial<T> {
    pub fn complete(items: Vec<T>) -> Self {
        Self { items, error: None }
    }

    pub fn interrupted(items: Vec<T>, error: ExportError) -> Self {
        Self {
            items,
            error: Some(error),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_parts(self) -> (Vec<T>, Option<ExportError>) {
        (self.items, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupted_keeps_items_and_error() {
        let partial = Partial::interrupted(
            vec![1, 2],
            ExportError::ChannelNotFound {
                reference: "x".into(),
            },
        );
        assert!(!partial.is_complete());
        let (items, error) = partial.into_parts();
        assert_eq!(items, vec![1, 2]);
        assert!(matches!(error, Some(ExportError::ChannelNotFound { .. })));
    }

    #[test]
    fn complete_has_no_error() {
        let partial = Partial::complete(vec!["a"]);
        assert!(partial.is_complete());
        assert_eq!(partial.items, vec!["a"]);
    }
}
