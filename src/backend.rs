use crate::errors::MangaError;
use crate::wire::{GenerateContentRequest, GenerateContentResponse};
use async_trait::async_trait;

/// A service that can answer a `generateContent` request for a model.
///
/// [`Client`](crate::Client) implements this against the Gemini REST API.
/// The explainer and image generator only depend on this trait, so tests
/// and alternative transports can supply their own implementation.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use manga_explainer::{GenerateContentRequest, GenerateContentResponse, GenerativeBackend, MangaError};
///
/// struct Canned(&'static str);
///
/// #[async_trait]
/// impl GenerativeBackend for Canned {
///     async fn generate_content(
///         &self,
///         _model: &str,
///         _request: &GenerateContentRequest,
///     ) -> Result<GenerateContentResponse, MangaError> {
///         Ok(GenerateContentResponse::from_text(self.0))
///     }
/// }
/// ```
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Sends one request and returns the decoded response.
    ///
    /// # Errors
    ///
    /// Implementations return [`MangaError::Api`] for non-success statuses so
    /// retry classification can see the status code.
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, MangaError>;
}
