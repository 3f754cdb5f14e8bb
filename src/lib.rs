//! Turns manga pages into a narrated production script using Gemini.
//!
//! Pages go in as inline images. The [`Explainer`] sends them to the model in
//! batches, carries a short story summary from each batch into the next, and
//! returns one [`Scene`] list with ids `1..=N` and panel indices pointing into
//! the original page sequence. An [`ImageGenerator`] produces standalone
//! manga-style artwork from a prompt.
//!
//! # Quick Start
//!
//! ```no_run
//! use manga_explainer::{Client, Page};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::from_env()?;
//! let explainer = client.explainer().build()?;
//!
//! let pages = vec![Page::from_file("ch1/001.jpg").await?, Page::from_file("ch1/002.jpg").await?];
//! for scene in explainer.explain(&pages).await? {
//!     println!("Scene {}: {} ({}, {})", scene.id, scene.title, scene.pages_label, scene.duration_label);
//!     println!("{}\n", scene.voice_over);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Set `LOUD_WIRE=1` to dump every request and response to stderr.

mod backend;
mod client;
mod errors;
mod explainer;
mod http;
mod imagegen;
mod page;
mod prompts;
mod retry;
mod script;
mod wire;

#[cfg(test)]
mod test_support;

// Errors
pub use errors::{ErrorKind, MangaError};

// Transport
pub use backend::GenerativeBackend;
pub use client::{API_KEY_ENV, Client, ClientBuilder};
pub use wire::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    ImageConfig, Part,
};

// Input
pub use page::{InlineImage, Page, detect_mime_type};

// Retry
pub use retry::{
    DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS, Delay, RetryPolicy, RetryingExecutor, TokioDelay,
};

// Script extraction
pub use explainer::{
    Batch, DEFAULT_BATCH_SIZE, DEFAULT_TEMPERATURE, DEFAULT_TEXT_MODEL, Explainer,
    ExplainerBuilder, RunState, plan_batches,
};
pub use prompts::{NarrationStyle, batch_prompt, system_instruction};
pub use script::{
    DEFAULT_DURATION, DEFAULT_PAGES_LABEL, ParsedBatch, SUMMARY_FALLBACK, Scene, extract_summary,
    parse_batch, parse_block, split_blocks,
};

// Image generation
pub use imagegen::{
    AspectRatio, DEFAULT_IMAGE_MODEL, GeneratedImage, ImageGenerator, ImageSize, STYLE_PREFIX,
};

pub use tokio_util::sync::CancellationToken;
