use reader_core::FailureKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuitabilityError {
    #[error("url matches unsuitable pattern {pattern}")]
    UnsuitableUrl { pattern: String },
    #[error("page text too short ({chars} < {min} characters)")]
    TooLittleText { chars: usize, min: usize },
    #[error("too few substantial text blocks ({found} < {min})")]
    TooFewBlocks { found: usize, min: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("unsuitable page")]
    Unsuitable(#[source] SuitabilityError),
    #[error("no content parsed")]
    NoContentParsed,
    #[error("insufficient content ({chars} characters)")]
    InsufficientContent { chars: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SanitizeError {
    #[error("no block-level element with content survived sanitization")]
    NoBlockContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("document has no <body> element")]
    MissingBody,
}

/// Every way an activation can fail before the reader view is mounted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("sanitization failed: {0}")]
    Sanitize(#[from] SanitizeError),
    #[error("page could not be updated: {0}")]
    Page(#[from] PageError),
}

impl ReaderError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ReaderError::Extraction(ExtractionError::Unsuitable(_)) => FailureKind::Unsuitable,
            ReaderError::Extraction(ExtractionError::NoContentParsed) => {
                FailureKind::NoContentParsed
            }
            ReaderError::Extraction(ExtractionError::InsufficientContent { .. }) => {
                FailureKind::InsufficientContent
            }
            // Sanitizer and page faults take the same recovery path as extraction failures.
            ReaderError::Sanitize(_) | ReaderError::Page(_) => FailureKind::Sanitization,
        }
    }

    /// Banner text shown to the user.
    pub fn user_message(&self) -> String {
        match self.failure_kind() {
            FailureKind::Unsuitable => {
                "This page does not look like an article, so reading mode is not available."
                    .to_string()
            }
            FailureKind::NoContentParsed => {
                "No readable content could be found on this page.".to_string()
            }
            FailureKind::InsufficientContent => {
                "The readable content on this page is too short to display.".to_string()
            }
            FailureKind::Sanitization => {
                "The page content could not be prepared for reading mode.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_reasons_match_user_facing_text() {
        let unsuitable = ExtractionError::Unsuitable(SuitabilityError::TooFewBlocks {
            found: 1,
            min: 3,
        });
        assert_eq!(unsuitable.to_string(), "unsuitable page");
        assert_eq!(ExtractionError::NoContentParsed.to_string(), "no content parsed");
    }

    #[test]
    fn sanitize_failures_share_the_extraction_recovery_kind() {
        let err = ReaderError::from(SanitizeError::NoBlockContent);
        assert_eq!(err.failure_kind(), FailureKind::Sanitization);
        assert!(err.failure_kind().is_retryable());
    }
}
