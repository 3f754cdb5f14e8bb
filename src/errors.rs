use std::time::Duration;
use thiserror::Error;

/// Upstream message the Gemini API returns when the referenced model or key
/// no longer resolves. Surfaced to callers as [`MangaError::ApiKeyExpired`].
pub(crate) const ENTITY_NOT_FOUND_MESSAGE: &str = "Requested entity was not found";

/// Defines errors that can occur while explaining pages or generating artwork.
///
/// # Example: Handling Errors
///
/// ```ignore
/// match explainer.explain(&pages).await {
///     Err(MangaError::ApiKeyExpired) => {
///         // Reset key selection and ask the user to re-authenticate
///     }
///     Err(e) if e.is_retryable() => {
///         tracing::warn!("Upstream still failing after retries: {}", e);
///     }
///     Err(e) => tracing::error!("Explanation failed: {}", e),
///     Ok(scenes) => { /* render */ }
/// }
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MangaError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    /// API error with structured context for debugging and automated handling.
    ///
    /// Contains the HTTP status code (for retry logic), error message, and
    /// optional request ID (for correlation with Google API logs/support).
    #[error("API error (HTTP {status_code}): {message}")]
    Api {
        /// HTTP status code (e.g., 400, 429, 500)
        status_code: u16,
        /// Error message from the API response body
        message: String,
        /// Request ID from `x-goog-request-id` header, if available
        request_id: Option<String>,
    },
    /// Request timed out after the specified duration.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// API returned a successful response without any usable content.
    #[error("Malformed API response: {0}")]
    MalformedResponse(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The image model answered, but no part carried inline image data.
    #[error("No image data returned from model")]
    NoImageReturned,
    /// The API key (or the model it points at) was rejected as not found.
    ///
    /// Callers should reset their key selection and prompt for
    /// re-authentication instead of suggesting a later retry.
    #[error("API key expired or no longer valid for this model")]
    ApiKeyExpired,
    /// The run was cancelled before the next request was issued.
    #[error("Operation cancelled")]
    Cancelled,
    /// Failed to build the HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Tagged view of a failure, independent of how it was transported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// HTTP 429.
    RateLimited,
    /// Any other 4xx status.
    ClientError(u16),
    /// Any 5xx status.
    ServerFailure,
    /// Network, timeout, or undecodable-response failure with no status.
    Transport,
    NoImageReturned,
    ApiKeyExpired,
    /// Input validation, cancellation, and client construction failures.
    Other,
}

impl MangaError {
    /// Returns `true` if this error is likely transient and the request may succeed on retry.
    ///
    /// Any failure lacking a definite client-error status is retried: network
    /// errors, timeouts, undecodable or empty success bodies, rate limits (429)
    /// and server errors (5xx). Other 4xx statuses fail immediately, as do
    /// failures that originate on this side of the wire (invalid input,
    /// cancellation, key expiry).
    ///
    /// # Example
    ///
    /// ```rust
    /// use manga_explainer::MangaError;
    ///
    /// let rate_limited = MangaError::Api {
    ///     status_code: 429,
    ///     message: "Resource exhausted".to_string(),
    ///     request_id: None,
    /// };
    /// assert!(rate_limited.is_retryable());
    ///
    /// let not_found = MangaError::Api {
    ///     status_code: 404,
    ///     message: "Not found".to_string(),
    ///     request_id: None,
    /// };
    /// assert!(!not_found.is_retryable());
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            MangaError::Http(_) | MangaError::Timeout(_) | MangaError::MalformedResponse(_) => {
                true
            }

            MangaError::Api { status_code, .. } => *status_code == 429 || *status_code >= 500,

            MangaError::InvalidInput(_)
            | MangaError::NoImageReturned
            | MangaError::ApiKeyExpired
            | MangaError::Cancelled
            | MangaError::ClientBuild(_) => false,
        }
    }

    /// Returns the HTTP status code carried by this error, if any.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            MangaError::Api { status_code, .. } => Some(*status_code),
            MangaError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Classifies this error into an [`ErrorKind`].
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            MangaError::Api { status_code, .. } => match *status_code {
                429 => ErrorKind::RateLimited,
                code if code >= 500 => ErrorKind::ServerFailure,
                code if (400..500).contains(&code) => ErrorKind::ClientError(code),
                _ => ErrorKind::Other,
            },
            MangaError::Http(_) | MangaError::Timeout(_) | MangaError::MalformedResponse(_) => {
                ErrorKind::Transport
            }
            MangaError::NoImageReturned => ErrorKind::NoImageReturned,
            MangaError::ApiKeyExpired => ErrorKind::ApiKeyExpired,
            MangaError::InvalidInput(_) | MangaError::Cancelled | MangaError::ClientBuild(_) => {
                ErrorKind::Other
            }
        }
    }

    /// Translates an upstream "entity not found" failure into
    /// [`MangaError::ApiKeyExpired`], leaving every other error untouched.
    #[must_use]
    pub(crate) fn translate_key_expiry(self) -> Self {
        if self.to_string().contains(ENTITY_NOT_FOUND_MESSAGE) {
            MangaError::ApiKeyExpired
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status_code: u16, message: &str) -> MangaError {
        MangaError::Api {
            status_code,
            message: message.to_string(),
            request_id: None,
        }
    }

    #[test]
    fn test_api_error_display() {
        let error = MangaError::Api {
            status_code: 429,
            message: "Rate limited".to_string(),
            request_id: Some("req-123".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("429"));
        assert!(display.contains("Rate limited"));
    }

    #[test]
    fn test_api_error_debug_includes_request_id() {
        let error = MangaError::Api {
            status_code: 400,
            message: "Bad request".to_string(),
            request_id: Some("req-456".to_string()),
        };
        let debug = format!("{:?}", error);
        assert!(debug.contains("Api"));
        assert!(debug.contains("req-456"));
    }

    #[test]
    fn test_timeout_display() {
        let error = MangaError::Timeout(Duration::from_secs(30));
        assert!(format!("{}", error).contains("30s"));
    }

    #[test]
    fn test_no_image_and_key_expired_display() {
        assert_eq!(
            MangaError::NoImageReturned.to_string(),
            "No image data returned from model"
        );
        assert!(MangaError::ApiKeyExpired.to_string().contains("API key"));
    }

    // =============================================================================
    // is_retryable() Tests
    // =============================================================================

    #[test]
    fn test_is_retryable_rate_limit_429() {
        assert!(api(429, "Resource exhausted").is_retryable());
    }

    #[test]
    fn test_is_retryable_server_errors_5xx() {
        for status_code in [500, 502, 503, 504] {
            assert!(
                api(status_code, "Server error").is_retryable(),
                "{} errors should be retryable",
                status_code
            );
        }
    }

    #[test]
    fn test_is_retryable_client_errors_4xx_not_retryable() {
        for status_code in [400, 401, 403, 404, 422] {
            assert!(
                !api(status_code, "Client error").is_retryable(),
                "{} errors should NOT be retryable",
                status_code
            );
        }
    }

    #[test]
    fn test_is_retryable_statusless_failures() {
        assert!(MangaError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(MangaError::MalformedResponse("no candidates".to_string()).is_retryable());
    }

    #[test]
    fn test_is_retryable_local_failures_not_retryable() {
        assert!(!MangaError::InvalidInput("bad".to_string()).is_retryable());
        assert!(!MangaError::Cancelled.is_retryable());
        assert!(!MangaError::ApiKeyExpired.is_retryable());
        assert!(!MangaError::NoImageReturned.is_retryable());
        assert!(!MangaError::ClientBuild("tls".to_string()).is_retryable());
    }

    // =============================================================================
    // kind() Tests
    // =============================================================================

    #[test]
    fn test_kind_from_status() {
        assert_eq!(api(429, "").kind(), ErrorKind::RateLimited);
        assert_eq!(api(404, "").kind(), ErrorKind::ClientError(404));
        assert_eq!(api(400, "").kind(), ErrorKind::ClientError(400));
        assert_eq!(api(500, "").kind(), ErrorKind::ServerFailure);
        assert_eq!(api(503, "").kind(), ErrorKind::ServerFailure);
    }

    #[test]
    fn test_kind_non_api() {
        assert_eq!(
            MangaError::Timeout(Duration::from_secs(1)).kind(),
            ErrorKind::Transport
        );
        assert_eq!(MangaError::NoImageReturned.kind(), ErrorKind::NoImageReturned);
        assert_eq!(MangaError::ApiKeyExpired.kind(), ErrorKind::ApiKeyExpired);
        assert_eq!(MangaError::Cancelled.kind(), ErrorKind::Other);
    }

    #[test]
    fn test_status_code() {
        assert_eq!(api(503, "").status_code(), Some(503));
        assert_eq!(MangaError::Cancelled.status_code(), None);
    }

    // =============================================================================
    // translate_key_expiry() Tests
    // =============================================================================

    #[test]
    fn test_translate_key_expiry_matches_entity_not_found() {
        let error = api(404, "{\"error\": {\"message\": \"Requested entity was not found.\"}}");
        assert!(matches!(
            error.translate_key_expiry(),
            MangaError::ApiKeyExpired
        ));
    }

    #[test]
    fn test_translate_key_expiry_leaves_other_errors() {
        let error = api(404, "Model is not supported for generateContent");
        assert!(matches!(
            error.translate_key_expiry(),
            MangaError::Api {
                status_code: 404,
                ..
            }
        ));
        assert!(matches!(
            MangaError::NoImageReturned.translate_key_expiry(),
            MangaError::NoImageReturned
        ));
    }
}
