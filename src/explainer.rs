//! Multi-batch production-script extraction.
//!
//! An [`Explainer`] splits the page sequence into consecutive batches, sends
//! one request per batch through a [`RetryingExecutor`], parses each reply,
//! and stitches the results into one script:
//!
//! - scene ids run `1, 2, 3, ...` across the whole run,
//! - panel indices are shifted from batch-local onto whole-document indices,
//! - the summary from each batch becomes the story context for the next.
//!
//! Batches run strictly in order because each prompt depends on the previous
//! batch's summary. Any batch that still fails after its retries aborts the
//! run; no partial script is returned.
//!
//! # Example
//!
//! ```no_run
//! use manga_explainer::{Client, Page};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::builder("api_key".to_string()).build()?;
//! let explainer = client.explainer().with_batch_size(8).build()?;
//!
//! let pages = vec![
//!     Page::from_file("chapter1/001.png").await?,
//!     Page::from_file("chapter1/002.png").await?,
//! ];
//! for scene in explainer.explain(&pages).await? {
//!     println!("{} [{}] {}", scene.id, scene.pages_label, scene.title);
//! }
//! # Ok(())
//! # }
//! ```

use crate::backend::GenerativeBackend;
use crate::errors::MangaError;
use crate::page::Page;
use crate::prompts::{NarrationStyle, batch_prompt, system_instruction};
use crate::retry::{Delay, RetryPolicy, RetryingExecutor};
use crate::script::{ParsedBatch, Scene, parse_batch};
use crate::wire::{Content, GenerateContentRequest, GenerationConfig, Part};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default model for script extraction.
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";

/// Default number of pages sent per request.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

/// A contiguous slice of the page sequence sent in one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    /// Index of the batch's first page in the whole document.
    pub start: usize,
    pub len: usize,
}

impl Batch {
    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// Partitions `total_pages` into consecutive batches of at most
/// `batch_size` pages. A `batch_size` of 0 is treated as 1.
///
/// ```
/// use manga_explainer::{Batch, plan_batches};
///
/// assert_eq!(
///     plan_batches(25, 10),
///     vec![
///         Batch { start: 0, len: 10 },
///         Batch { start: 10, len: 10 },
///         Batch { start: 20, len: 5 },
///     ]
/// );
/// assert!(plan_batches(0, 10).is_empty());
/// ```
#[must_use]
pub fn plan_batches(total_pages: usize, batch_size: usize) -> Vec<Batch> {
    let batch_size = batch_size.max(1);
    (0..total_pages)
        .step_by(batch_size)
        .map(|start| Batch {
            start,
            len: batch_size.min(total_pages - start),
        })
        .collect()
}

/// State threaded from one batch to the next within a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    /// Id given to the next scene appended.
    pub next_id: u32,
    /// Summary of the story through the last completed batch.
    pub context: String,
    pub scenes: Vec<Scene>,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            context: String::new(),
            scenes: Vec::new(),
        }
    }

    /// Folds one parsed batch into the run.
    ///
    /// Renumbers scene ids, shifts batch-local panel indices by
    /// `batch.start`, drops indices that fall outside the batch, and replaces
    /// the context with the batch's summary.
    #[must_use]
    pub fn apply_batch(mut self, batch: &Batch, parsed: ParsedBatch) -> Self {
        for mut scene in parsed.scenes {
            let id = self.next_id;
            scene.id = id;
            self.next_id = self.next_id.saturating_add(1);

            let local = std::mem::take(&mut scene.panel_indices);
            scene.panel_indices = local
                .into_iter()
                .filter(|&i| {
                    let in_batch = i < batch.len;
                    if !in_batch {
                        warn!(
                            "Scene {} references panel {} outside its {}-panel batch; dropped",
                            id,
                            i + 1,
                            batch.len
                        );
                    }
                    in_batch
                })
                .map(|i| batch.start + i)
                .collect();

            self.scenes.push(scene);
        }
        self.context = parsed.context_update;
        self
    }

    #[must_use]
    pub fn into_scenes(self) -> Vec<Scene> {
        self.scenes
    }
}

/// Drives script extraction over an arbitrarily long page sequence.
#[derive(Clone)]
pub struct Explainer {
    backend: Arc<dyn GenerativeBackend>,
    model: String,
    batch_size: usize,
    temperature: f32,
    executor: RetryingExecutor,
    style: NarrationStyle,
}

impl fmt::Debug for Explainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Explainer")
            .field("model", &self.model)
            .field("batch_size", &self.batch_size)
            .field("temperature", &self.temperature)
            .field("executor", &self.executor)
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

impl Explainer {
    /// Creates a builder using the given backend.
    #[must_use]
    pub fn builder(backend: Arc<dyn GenerativeBackend>) -> ExplainerBuilder {
        ExplainerBuilder::new(backend)
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Produces the production script for `pages`.
    ///
    /// Returns an empty script, without any request, when `pages` is empty.
    ///
    /// # Errors
    ///
    /// Returns the failure of the first batch that could not be completed
    /// within its retry budget.
    #[doc(alias = "run")]
    pub async fn explain(&self, pages: &[Page]) -> Result<Vec<Scene>, MangaError> {
        self.explain_with_cancel(pages, &CancellationToken::new())
            .await
    }

    /// Like [`explain`](Self::explain), but stops with
    /// [`MangaError::Cancelled`] once `cancel` fires. Cancellation is observed
    /// before each batch and before each retry attempt; a request already in
    /// flight is allowed to finish.
    ///
    /// # Errors
    ///
    /// Returns [`MangaError::Cancelled`] or the failure of the first batch that
    /// could not be completed.
    pub async fn explain_with_cancel(
        &self,
        pages: &[Page],
        cancel: &CancellationToken,
    ) -> Result<Vec<Scene>, MangaError> {
        let batches = plan_batches(pages.len(), self.batch_size);
        if batches.is_empty() {
            debug!("No pages to explain");
            return Ok(Vec::new());
        }

        info!(
            "Explaining {} page(s) in {} batch(es) with {}",
            pages.len(),
            batches.len(),
            self.model
        );

        let mut state = RunState::new();
        for (n, batch) in batches.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Explanation cancelled before batch {}/{}", n + 1, batches.len());
                return Err(MangaError::Cancelled);
            }

            debug!(
                "Batch {}/{}: pages {}..{}",
                n + 1,
                batches.len(),
                batch.start + 1,
                batch.start + batch.len
            );
            let request = self.build_request(pages, batch, &state.context)?;
            let parsed = self.run_batch(&request, cancel).await?;
            debug!(
                "Batch {}/{} produced {} scene(s)",
                n + 1,
                batches.len(),
                parsed.scenes.len()
            );
            state = state.apply_batch(batch, parsed);
        }

        info!("Explanation complete: {} scene(s)", state.scenes.len());
        Ok(state.into_scenes())
    }

    /// Builds the request for one batch: its page images in order, followed
    /// by the batch prompt carrying `context`.
    pub(crate) fn build_request(
        &self,
        pages: &[Page],
        batch: &Batch,
        context: &str,
    ) -> Result<GenerateContentRequest, MangaError> {
        let batch_pages = pages.get(batch.range()).ok_or_else(|| {
            MangaError::InvalidInput(format!(
                "Batch covers pages {}..{} but only {} page(s) were given",
                batch.start,
                batch.start + batch.len,
                pages.len()
            ))
        })?;
        let mut parts: Vec<Part> = batch_pages
            .iter()
            .map(|page| Part::inline(page.image.clone()))
            .collect();
        parts.push(Part::text(batch_prompt(
            batch,
            pages.len(),
            context,
            &self.style,
        )));

        Ok(GenerateContentRequest {
            contents: vec![Content::user(parts)],
            system_instruction: Some(Content::system(system_instruction(&self.style))),
            generation_config: Some(GenerationConfig {
                temperature: Some(self.temperature),
                ..Default::default()
            }),
        })
    }

    async fn run_batch(
        &self,
        request: &GenerateContentRequest,
        cancel: &CancellationToken,
    ) -> Result<ParsedBatch, MangaError> {
        let backend = &self.backend;
        let model = self.model.as_str();

        let response = self
            .executor
            .execute_with_cancel(cancel, move |attempt| {
                debug!("Sending batch request (attempt {})", attempt + 1);
                backend.generate_content(model, request)
            })
            .await?;

        let text = response.text().unwrap_or_else(|| {
            warn!("Model returned no text for this batch; continuing with no scenes");
            String::new()
        });
        Ok(parse_batch(&text))
    }
}

/// Builder for [`Explainer`].
pub struct ExplainerBuilder {
    backend: Arc<dyn GenerativeBackend>,
    model: String,
    batch_size: usize,
    temperature: f32,
    retry_policy: RetryPolicy,
    delay: Option<Arc<dyn Delay>>,
    style: NarrationStyle,
}

impl fmt::Debug for ExplainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplainerBuilder")
            .field("model", &self.model)
            .field("batch_size", &self.batch_size)
            .field("temperature", &self.temperature)
            .field("retry_policy", &self.retry_policy)
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

impl ExplainerBuilder {
    fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            model: DEFAULT_TEXT_MODEL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            temperature: DEFAULT_TEMPERATURE,
            retry_policy: RetryPolicy::default(),
            delay: None,
            style: NarrationStyle::default(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the maximum number of pages per request. Use a value at least as
    /// large as the page count to send everything in one request.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Replaces the timer used between retries.
    #[must_use]
    pub fn with_delay(mut self, delay: Arc<dyn Delay>) -> Self {
        self.delay = Some(delay);
        self
    }

    #[must_use]
    pub fn with_narration_style(mut self, style: NarrationStyle) -> Self {
        self.style = style;
        self
    }

    /// Builds the [`Explainer`].
    ///
    /// # Errors
    ///
    /// Returns [`MangaError::InvalidInput`] if the batch size is 0, the model
    /// name is empty, or the temperature is outside `0.0..=2.0`.
    pub fn build(self) -> Result<Explainer, MangaError> {
        if self.batch_size == 0 {
            return Err(MangaError::InvalidInput(
                "Batch size must be at least 1".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(MangaError::InvalidInput(
                "Model name must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(MangaError::InvalidInput(format!(
                "Temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }

        let executor = match self.delay {
            Some(delay) => RetryingExecutor::with_delay(self.retry_policy, delay),
            None => RetryingExecutor::new(self.retry_policy),
        };

        Ok(Explainer {
            backend: self.backend,
            model: self.model,
            batch_size: self.batch_size,
            temperature: self.temperature,
            executor,
            style: self.style,
        })
    }
}
