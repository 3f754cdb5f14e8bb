// Tests for error handling and retry behavior through the public API
mod common;

use async_trait::async_trait;
use common::{TEST_TIMEOUT, get_client, tiny_pages, with_timeout};
use manga_explainer::{
    AspectRatio, CancellationToken, Client, Delay, ErrorKind, MangaError, Page, RetryPolicy,
    RetryingExecutor,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct NoSleep {
    requested: Mutex<Vec<Duration>>,
}

#[async_trait]
impl Delay for NoSleep {
    async fn sleep(&self, duration: Duration) {
        self.requested.lock().unwrap().push(duration);
    }
}

fn api(status_code: u16) -> MangaError {
    MangaError::Api {
        status_code,
        message: format!("status {status_code}"),
        request_id: None,
    }
}

#[tokio::test]
async fn test_executor_retries_twice_then_succeeds() {
    let delay = Arc::new(NoSleep::default());
    let executor = RetryingExecutor::with_delay(RetryPolicy::default(), delay.clone());
    let calls = AtomicU32::new(0);

    let result = executor
        .execute(|_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n < 2 { Err(api(500)) } else { Ok("done") } }
        })
        .await;

    assert_eq!(result.unwrap(), "done");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        *delay.requested.lock().unwrap(),
        vec![Duration::from_millis(1000), Duration::from_millis(2000)]
    );
}

#[tokio::test]
async fn test_executor_does_not_retry_not_found() {
    let delay = Arc::new(NoSleep::default());
    let executor = RetryingExecutor::with_delay(RetryPolicy::default(), delay.clone());
    let calls = AtomicU32::new(0);

    let result: Result<(), _> = executor
        .execute(|_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(api(404)) }
        })
        .await;

    assert_eq!(result.unwrap_err().kind(), ErrorKind::ClientError(404));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(delay.requested.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_executor_stops_when_cancelled() {
    let delay = Arc::new(NoSleep::default());
    let executor = RetryingExecutor::with_delay(RetryPolicy::default(), delay);
    let token = CancellationToken::new();
    let calls = AtomicU32::new(0);

    let result: Result<(), _> = executor
        .execute_with_cancel(&token, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            token.cancel();
            async { Err(api(503)) }
        })
        .await;

    assert!(matches!(result, Err(MangaError::Cancelled)));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_error_display() {
    assert_eq!(
        api(429).to_string(),
        "API error (HTTP 429): status 429"
    );
    assert_eq!(
        MangaError::NoImageReturned.to_string(),
        "No image data returned from model"
    );
    assert_eq!(MangaError::Cancelled.to_string(), "Operation cancelled");
}

#[test]
fn test_error_kinds() {
    assert_eq!(api(429).kind(), ErrorKind::RateLimited);
    assert_eq!(api(502).kind(), ErrorKind::ServerFailure);
    assert_eq!(api(403).kind(), ErrorKind::ClientError(403));
    assert_eq!(
        MangaError::Timeout(Duration::from_secs(1)).kind(),
        ErrorKind::Transport
    );
    assert!(!MangaError::ApiKeyExpired.is_retryable());
}

#[tokio::test]
async fn test_page_from_missing_file() {
    let err = Page::from_file("/definitely/not/here/001.png")
        .await
        .unwrap_err();
    assert!(matches!(err, MangaError::InvalidInput(_)));
}

#[tokio::test]
async fn test_page_from_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chapter.pdf");
    std::fs::write(&path, b"%PDF-1.4").unwrap();

    let err = Page::from_file(&path).await.unwrap_err();
    assert!(matches!(err, MangaError::InvalidInput(_)));
}

#[test]
fn test_unsupported_aspect_ratio() {
    let err = "7:5".parse::<AspectRatio>().unwrap_err();
    assert!(matches!(err, MangaError::InvalidInput(_)));
}

#[test]
fn test_empty_api_key_rejected() {
    assert!(matches!(
        Client::builder(String::new()).build(),
        Err(MangaError::InvalidInput(_))
    ));
}

#[tokio::test]
#[ignore = "Makes real API calls"]
async fn test_invalid_model_name() {
    let Some(client) = get_client() else {
        println!("Skipping test_invalid_model_name: GEMINI_API_KEY not set.");
        return;
    };

    let explainer = client
        .explainer()
        .with_model("non-existent-model-12345")
        .build()
        .unwrap();

    let result = with_timeout(TEST_TIMEOUT, explainer.explain(&tiny_pages(1))).await;
    let err = result.expect_err("Expected error with invalid model name");
    assert!(!err.is_retryable(), "unexpected error: {err:?}");
}

#[tokio::test]
#[ignore = "Makes real API calls"]
async fn test_invalid_api_key() {
    let client = Client::builder("invalid-api-key".to_string()).build().unwrap();
    let explainer = client.explainer().build().unwrap();

    let result = with_timeout(TEST_TIMEOUT, explainer.explain(&tiny_pages(1))).await;
    match result {
        Err(MangaError::Api { status_code, .. }) => {
            assert!((400..500).contains(&status_code));
        }
        other => panic!("Unexpected result: {other:?}"),
    }
}
