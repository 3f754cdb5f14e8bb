use super::common::{API_KEY_HEADER, Endpoint, construct_endpoint_url};
use super::error_helpers::{check_response, deserialize_with_context};
use super::loud_wire;
use crate::errors::MangaError;
use crate::wire::{GenerateContentRequest, GenerateContentResponse};
use reqwest::Client as ReqwestClient;
use std::time::Duration;
use tracing::{debug, warn};

/// Calls `models/{model}:generateContent` once.
///
/// `timeout` is the client's configured request timeout; it is only used to
/// report [`MangaError::Timeout`] when reqwest gives up.
///
/// # Errors
///
/// Returns an error if:
/// - The HTTP request fails or times out
/// - The response status is not successful
/// - The body is empty or cannot be parsed
pub async fn generate_content(
    http_client: &ReqwestClient,
    base_url: &str,
    api_key: &str,
    timeout: Option<Duration>,
    model: &str,
    request: &GenerateContentRequest,
) -> Result<GenerateContentResponse, MangaError> {
    let url = construct_endpoint_url(base_url, Endpoint::GenerateContent { model });

    let request_id = loud_wire::next_request_id();
    if loud_wire::is_enabled() {
        match serde_json::to_string(request) {
            Ok(body) => loud_wire::log_request(request_id, "POST", &url, Some(&body)),
            Err(e) => warn!("LOUD_WIRE: Failed to serialize request body: {}", e),
        }
    }

    debug!("POST generateContent for model {}", model);
    let response = http_client
        .post(&url)
        .header(API_KEY_HEADER, api_key)
        .json(request)
        .send()
        .await
        .map_err(|e| map_send_error(e, timeout))?;

    loud_wire::log_response_status(request_id, response.status().as_u16());

    let response = check_response(response).await?;
    let response_text = response
        .text()
        .await
        .map_err(|e| map_send_error(e, timeout))?;

    loud_wire::log_response_body(request_id, &response_text);

    deserialize_with_context(&response_text, "GenerateContentResponse")
}

fn map_send_error(error: reqwest::Error, timeout: Option<Duration>) -> MangaError {
    match timeout {
        Some(limit) if error.is_timeout() => MangaError::Timeout(limit),
        _ => MangaError::Http(error),
    }
}
