use crate::backend::GenerativeBackend;
use crate::errors::MangaError;
use crate::explainer::{Explainer, ExplainerBuilder};
use crate::http::common::BASE_URL_PREFIX;
use crate::http::generate;
use crate::imagegen::ImageGenerator;
use crate::wire::{GenerateContentRequest, GenerateContentResponse};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable read by [`Client::from_env`].
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// HTTP client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct Client {
    pub(crate) api_key: String,
    #[allow(clippy::struct_field_names)]
    pub(crate) http_client: ReqwestClient,
    base_url: String,
    timeout: Option<Duration>,
}

/// Builder for `Client` instances.
///
/// # Example
///
/// ```
/// use manga_explainer::Client;
/// use std::time::Duration;
///
/// let client = Client::builder("api_key".to_string())
///     .timeout(Duration::from_secs(120))
///     .connect_timeout(Duration::from_secs(10))
///     .build()
///     .unwrap();
/// ```
#[derive(Debug)]
pub struct ClientBuilder {
    api_key: String,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    base_url: Option<String>,
}

impl ClientBuilder {
    /// Sets the total request timeout.
    ///
    /// A batch of ten full-page images with a long narration can take well
    /// over a minute to answer, so keep this generous (120-300 seconds).
    ///
    /// If not set, uses reqwest's default (no timeout).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// If not set, uses reqwest's default.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Overrides the API origin, e.g. to point at a local proxy.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builds the `Client`.
    ///
    /// # Errors
    ///
    /// Returns [`MangaError::InvalidInput`] for an empty API key and
    /// [`MangaError::ClientBuild`] if the HTTP client cannot be created.
    pub fn build(self) -> Result<Client, MangaError> {
        if self.api_key.trim().is_empty() {
            return Err(MangaError::InvalidInput(
                "API key must not be empty".to_string(),
            ));
        }

        let mut builder = ReqwestClient::builder();

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        let http_client = builder
            .build()
            .map_err(|e| MangaError::ClientBuild(e.to_string()))?;

        Ok(Client {
            api_key: self.api_key,
            http_client,
            base_url: self
                .base_url
                .unwrap_or_else(|| BASE_URL_PREFIX.to_string()),
            timeout: self.timeout,
        })
    }
}

impl Client {
    /// Creates a new builder for `Client` instances.
    #[must_use]
    pub const fn builder(api_key: String) -> ClientBuilder {
        ClientBuilder {
            api_key,
            timeout: None,
            connect_timeout: None,
            base_url: None,
        }
    }

    /// Creates a client with default settings.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            http_client: ReqwestClient::new(),
            base_url: BASE_URL_PREFIX.to_string(),
            timeout: None,
        }
    }

    /// Creates a client from the `GEMINI_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`MangaError::InvalidInput`] when the variable is unset or
    /// empty.
    pub fn from_env() -> Result<Self, MangaError> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                MangaError::InvalidInput(format!("{API_KEY_ENV} environment variable not set"))
            })?;
        Self::builder(api_key).build()
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Starts configuring an [`Explainer`] backed by this client.
    ///
    /// ```no_run
    /// # use manga_explainer::Client;
    /// # fn example() -> Result<(), manga_explainer::MangaError> {
    /// let client = Client::from_env()?;
    /// let explainer = client
    ///     .explainer()
    ///     .with_model("gemini-3-flash-preview")
    ///     .with_batch_size(10)
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn explainer(&self) -> ExplainerBuilder {
        Explainer::builder(Arc::new(self.clone()))
    }

    /// Creates an [`ImageGenerator`] backed by this client.
    #[must_use]
    pub fn image_generator(&self) -> ImageGenerator {
        ImageGenerator::new(Arc::new(self.clone()))
    }
}

#[async_trait]
impl GenerativeBackend for Client {
    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, MangaError> {
        generate::generate_content(
            &self.http_client,
            &self.base_url,
            &self.api_key,
            self.timeout,
            model,
            request,
        )
        .await
    }
}
