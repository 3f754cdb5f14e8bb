//! Error handling utilities for HTTP responses and error context formatting.

use crate::errors::MangaError;
use reqwest::Response;
use serde::de::DeserializeOwned;

/// Maximum characters to include from error body in context messages
const ERROR_BODY_PREVIEW_LENGTH: usize = 200;

/// Google's request ID header name.
///
/// Uniquely identifies each request; useful when correlating with server
/// logs or contacting support.
const REQUEST_ID_HEADER: &str = "x-goog-request-id";

/// Returns the response unchanged if its status is successful, otherwise the
/// error built by [`read_error_with_context`].
///
/// # Errors
///
/// Returns [`MangaError::Api`] on non-success status.
pub async fn check_response(response: Response) -> Result<Response, MangaError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(read_error_with_context(response).await)
    }
}

/// Reads an error response into a [`MangaError::Api`].
///
/// Keeps the status code, the first 200 characters of the body, and the
/// request ID header when present. If the body cannot be read, the message
/// describes the read failure instead.
pub async fn read_error_with_context(response: Response) -> MangaError {
    let status_code = response.status().as_u16();

    // Headers must be read before the body consumes the response
    let request_id = response
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let error_body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("Failed to read error body: {}", e));

    MangaError::Api {
        status_code,
        message: truncate_for_context(&error_body, ERROR_BODY_PREVIEW_LENGTH),
        request_id,
    }
}

/// Deserializes `body`, reporting a preview of the raw text on failure.
///
/// An empty body is reported as [`MangaError::MalformedResponse`] since
/// there is nothing for the caller to interpret.
///
/// # Errors
///
/// Returns [`MangaError::MalformedResponse`] when `body` is blank or does not
/// parse as `T`.
pub fn deserialize_with_context<T: DeserializeOwned>(
    body: &str,
    context: &str,
) -> Result<T, MangaError> {
    if body.trim().is_empty() {
        return Err(MangaError::MalformedResponse(format!(
            "Empty body for {context}"
        )));
    }
    serde_json::from_str(body).map_err(|e| {
        MangaError::MalformedResponse(format!(
            "Failed to parse {context}: {e} | Context: {}",
            truncate_for_context(body, ERROR_BODY_PREVIEW_LENGTH)
        ))
    })
}

/// Truncates a string to `max_len` bytes, adding "..." if truncated.
///
/// Cuts on a character boundary so multi-byte UTF-8 never panics.
pub(crate) fn truncate_for_context(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let truncate_at = s
            .char_indices()
            .take_while(|(i, c)| i + c.len_utf8() <= max_len)
            .last()
            .map_or(0, |(i, c)| i + c.len_utf8());
        format!("{}...", &s[..truncate_at])
    }
}
