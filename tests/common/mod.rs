//! Common test utilities shared across all integration test files.
//!
//! Usage in test files:
//! ```ignore
//! mod common;
//! use common::*;
//! ```

use manga_explainer::{Client, InlineImage, Page};
use std::env;
use std::future::Future;
use std::time::Duration;

/// Creates a client from the GEMINI_API_KEY environment variable.
/// Returns None if the API key is not set.
#[allow(dead_code)]
pub fn get_client() -> Option<Client> {
    env::var("GEMINI_API_KEY").ok().and_then(|key| {
        Client::builder(key)
            .timeout(EXTENDED_TEST_TIMEOUT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .ok()
    })
}

// =============================================================================
// Timeout Utilities
// =============================================================================

/// Default timeout for integration tests (60 seconds).
#[allow(dead_code)]
pub const TEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Extended timeout for multi-batch runs and image generation (180 seconds).
#[allow(dead_code)]
pub const EXTENDED_TEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Wraps a future with a timeout, panicking if the timeout is exceeded.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, future)
        .await
        .unwrap_or_else(|_| panic!("Test timed out after {:?}", duration))
}

// =============================================================================
// Test Assets
// =============================================================================

/// Small 1x1 red PNG image encoded as base64
#[allow(dead_code)]
pub const TINY_RED_PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

/// `n` tiny PNG pages labelled `page-1.png`, `page-2.png`, ...
#[allow(dead_code)]
pub fn tiny_pages(n: usize) -> Vec<Page> {
    (1..=n)
        .map(|i| {
            Page::new(
                InlineImage::new("image/png", TINY_RED_PNG_BASE64),
                format!("page-{i}.png"),
            )
        })
        .collect()
}

/// A `generateContent` response body carrying `text`.
#[allow(dead_code)]
pub fn text_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
}
