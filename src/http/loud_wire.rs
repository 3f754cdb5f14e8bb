//! Wire-level debugging via the `LOUD_WIRE` environment variable.
//!
//! When `LOUD_WIRE` is set to any value, raw JSON of API requests and
//! responses is printed to stderr with pretty formatting and colors:
//!
//! - Green `>>>` for outgoing requests
//! - Red `<<<` for incoming responses
//! - Timestamps and request IDs for correlation
//!
//! ```bash
//! LOUD_WIRE=1 cargo test --test explainer_tests -- --include-ignored
//! ```
//!
//! Page images are sent as base64, so `data` fields are truncated to keep
//! the output readable.

use colored::Colorize;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};

static REQUEST_COUNTER: AtomicUsize = AtomicUsize::new(1);

static ENABLED: OnceLock<bool> = OnceLock::new();

/// Whether `LOUD_WIRE` debugging is enabled.
///
/// Cached on first call, so the variable must be set before the first
/// request is made.
#[must_use]
pub fn is_enabled() -> bool {
    *ENABLED.get_or_init(|| std::env::var("LOUD_WIRE").is_ok())
}

/// Next request ID for correlating a request with its response.
#[must_use]
pub fn next_request_id() -> usize {
    REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Fields holding base64 payloads.
const TRUNCATE_FIELDS: &[&str] = &["data"];

const TRUNCATE_THRESHOLD: usize = 100;

/// Longest non-JSON body echoed verbatim.
const RAW_BODY_PREVIEW: usize = 1000;

/// Walks the JSON tree and shortens long `data` strings. Text parts, which
/// carry the narration, are left whole.
fn truncate_long_fields(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if TRUNCATE_FIELDS.contains(&key.as_str()) {
                    if let serde_json::Value::String(s) = val
                        && s.len() > TRUNCATE_THRESHOLD
                    {
                        // base64 is ASCII, but fall back to a char boundary anyway
                        let cut = (0..=TRUNCATE_THRESHOLD)
                            .rev()
                            .find(|&i| s.is_char_boundary(i))
                            .unwrap_or(0);
                        *s = format!("{}... ({} bytes)", &s[..cut], s.len());
                    }
                } else {
                    truncate_long_fields(val);
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for item in arr.iter_mut() {
                truncate_long_fields(item);
            }
        }
        _ => {}
    }
}

fn timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

fn prefix(request_id: usize) -> String {
    format!(
        "{} {} {}",
        "[LOUD_WIRE]".bold(),
        timestamp().dimmed(),
        format!("[REQ#{}]", request_id).cyan()
    )
}

/// Prints a JSON body line by line under `label`, or a truncated raw preview
/// when it is not JSON.
fn print_body(prefix: &str, label: &str, body: &str) {
    if let Ok(mut parsed) = serde_json::from_str::<serde_json::Value>(body) {
        truncate_long_fields(&mut parsed);
        eprintln!("{prefix} {label}:");
        let rendered = colored_json::to_colored_json_auto(&parsed)
            .ok()
            .or_else(|| serde_json::to_string_pretty(&parsed).ok());
        if let Some(rendered) = rendered {
            for line in rendered.lines() {
                eprintln!("{prefix} {line}");
            }
        }
    } else {
        let preview = super::error_helpers::truncate_for_context(body, RAW_BODY_PREVIEW);
        eprintln!("{prefix} {label}: {preview}");
    }
}

/// Logs an outgoing HTTP request.
pub fn log_request(request_id: usize, method: &str, url: &str, body: Option<&str>) {
    if !is_enabled() {
        return;
    }

    let prefix = prefix(request_id);
    eprintln!("{prefix} {} {method} {url}", ">>>".green().bold());

    if let Some(body) = body {
        print_body(&prefix, &"Body".green().to_string(), body);
    }
}

/// Logs an incoming HTTP response status.
pub fn log_response_status(request_id: usize, status: u16) {
    if !is_enabled() {
        return;
    }

    let status_text = if status < 300 {
        format!("{status} OK").green()
    } else {
        format!("{status} ERROR").red()
    };
    eprintln!(
        "{} {} {status_text}",
        prefix(request_id),
        "<<<".red().bold()
    );
}

/// Logs an incoming HTTP response body.
pub fn log_response_body(request_id: usize, body: &str) {
    if !is_enabled() {
        return;
    }

    print_body(&prefix(request_id), &"Response".red().to_string(), body);
}
