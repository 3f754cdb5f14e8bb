//! Best-effort parser for the model's production-script text.
//!
//! The model is asked to answer in a small line-oriented format:
//!
//! ```text
//! Scene 1: The Rooftop Standoff
//! Panels: 1, 2
//! Duration: 20 sec
//! Voice:
//! "Narration..."
//! ---
//! [SUMMARY]Where the story stands now[/SUMMARY]
//! ```
//!
//! Nothing here fails. A field that cannot be read takes its fallback value,
//! and a block that does not look like a scene still becomes a scene.
//!
//! Panel numbers are converted from 1-based to 0-based but are otherwise left
//! as the model wrote them, relative to the batch they were asked about.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

/// Context carried forward when a response has no summary tag.
pub const SUMMARY_FALLBACK: &str = "Continuing the story…";

/// Duration used when a block has no readable `Duration:` line.
pub const DEFAULT_DURATION: &str = "15 sec";

/// Panel label used when a block has no readable `Panels:` line.
pub const DEFAULT_PAGES_LABEL: &str = "Active Panels";

const BLOCK_DELIMITER: &str = "---";

static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\[SUMMARY\](.*?)\[/SUMMARY\]").expect("summary pattern is valid")
});
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Scene\s+\d+\s*:\s*(.*)").expect("title pattern is valid"));
static PANELS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Panels:\s*(.*)").expect("panels pattern is valid"));
static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Duration:\s*(.*)").expect("duration pattern is valid"));
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("number pattern is valid"));

/// One narrated beat of the production script.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    /// 1-based position in the script. Assigned by the explainer.
    pub id: u32,
    pub title: String,
    /// Human-readable panel list, e.g. `"Panels 2, 3"`.
    pub pages_label: String,
    /// 0-based page indices this beat narrates.
    pub panel_indices: Vec<usize>,
    /// Free-form reading time, e.g. `"15 sec"`.
    pub duration_label: String,
    pub voice_over: String,
}

/// Scenes read from one response plus the story context to carry forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBatch {
    pub scenes: Vec<Scene>,
    pub context_update: String,
}

/// Parses one model response.
///
/// Scene ids are numbered from 1 within the response and panel indices are
/// batch-local.
///
/// ```
/// use manga_explainer::parse_batch;
///
/// let parsed = parse_batch("Scene 1: T\nPanels: 2, 3\nDuration: 12 sec\nVoice:\n\"hello\"\n---");
/// assert_eq!(parsed.scenes.len(), 1);
/// assert_eq!(parsed.scenes[0].panel_indices, vec![1, 2]);
/// assert_eq!(parsed.scenes[0].voice_over, "hello");
/// ```
#[must_use]
pub fn parse_batch(text: &str) -> ParsedBatch {
    let (body, context_update) = extract_summary(text);
    let scenes: Vec<Scene> = split_blocks(&body)
        .iter()
        .enumerate()
        .map(|(index, block)| parse_block(block, index))
        .collect();

    debug!(
        "Parsed {} scene(s) from {} chars of model output",
        scenes.len(),
        text.len()
    );

    ParsedBatch {
        scenes,
        context_update,
    }
}

/// Removes every `[SUMMARY]...[/SUMMARY]` region from `text`.
///
/// Returns the remaining text and the trimmed inner text of the last summary,
/// or [`SUMMARY_FALLBACK`] when there is none or it is blank.
#[must_use]
pub fn extract_summary(text: &str) -> (String, String) {
    let summary = SUMMARY_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .last()
        .filter(|s| !s.is_empty())
        .map_or_else(|| SUMMARY_FALLBACK.to_string(), str::to_string);

    let body = SUMMARY_RE.replace_all(text, "").into_owned();
    (body, summary)
}

/// Splits text into blocks on lines consisting only of `---`.
///
/// Blank blocks are dropped; surviving blocks are trimmed.
#[must_use]
pub fn split_blocks(text: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim() == BLOCK_DELIMITER {
            blocks.push(current.join("\n"));
            current.clear();
        } else {
            current.push(line);
        }
    }
    blocks.push(current.join("\n"));

    blocks
        .into_iter()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .collect()
}

/// Parses a single scene block. `index` is the block's 0-based position
/// among the surviving blocks of its response.
#[must_use]
pub fn parse_block(block: &str, index: usize) -> Scene {
    let lines: Vec<&str> = block.trim().lines().collect();
    let line = |i: usize| lines.get(i).copied().unwrap_or("");

    let title = capture(&TITLE_RE, line(0))
        .map(|t| t.trim_matches('*').trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| format!("Production Beat {}", index + 1));

    let panels = capture(&PANELS_RE, line(1)).filter(|p| !p.is_empty());
    let pages_label = panels.map_or_else(
        || DEFAULT_PAGES_LABEL.to_string(),
        |p| format!("Panels {}", p),
    );
    let panel_indices = panels.map(panel_numbers).unwrap_or_default();

    let duration_label = capture(&DURATION_RE, line(2))
        .filter(|d| !d.is_empty())
        .map_or_else(|| DEFAULT_DURATION.to_string(), str::to_string);

    Scene {
        id: u32::try_from(index + 1).unwrap_or(u32::MAX),
        title,
        pages_label,
        panel_indices,
        duration_label,
        voice_over: voice_over(&lines),
    }
}

fn capture<'t>(re: &Regex, line: &'t str) -> Option<&'t str> {
    re.captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// Every integer token in `text`, converted from 1-based to 0-based.
///
/// Tokens that overflow or are `0` (no valid 0-based index) are skipped.
fn panel_numbers(text: &str) -> Vec<usize> {
    NUMBER_RE
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<usize>().ok())
        .filter_map(|n| n.checked_sub(1))
        .collect()
}

/// Narration body: everything after the first `Voice:` line, including any
/// text on that line after the marker, with the quotes around each line
/// stripped.
fn voice_over(lines: &[&str]) -> String {
    let Some(start) = lines
        .iter()
        .position(|l| l.trim_start().to_lowercase().starts_with("voice:"))
    else {
        return String::new();
    };

    let marker_line = lines[start].trim_start();
    // "voice:" is ASCII, so its lowercase match spans the same 6 bytes
    let inline = marker_line.get("voice:".len()..).unwrap_or("").trim();

    let mut body: Vec<&str> = Vec::with_capacity(lines.len() - start);
    if !inline.is_empty() {
        body.push(inline);
    }
    body.extend_from_slice(&lines[start + 1..]);

    body.iter()
        .map(|l| l.trim().trim_matches(is_quote).trim())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn is_quote(c: char) -> bool {
    matches!(c, '"' | '“' | '”')
}
