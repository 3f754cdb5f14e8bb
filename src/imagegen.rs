//! Single-shot manga artwork generation.
//!
//! # Example
//!
//! ```no_run
//! use manga_explainer::{AspectRatio, Client, MangaError};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::from_env()?;
//! let result = client
//!     .image_generator()
//!     .generate_image("a lone swordsman on a rain-soaked rooftop", AspectRatio::Widescreen)
//!     .await;
//!
//! match result {
//!     Ok(image) => std::fs::write("cover.png", image.bytes()?)?,
//!     Err(MangaError::ApiKeyExpired) => eprintln!("Please select your API key again"),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

use crate::backend::GenerativeBackend;
use crate::errors::MangaError;
use crate::page::InlineImage;
use crate::wire::{Content, GenerateContentRequest, GenerationConfig, ImageConfig, Part};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default model for image generation.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-3-pro-image-preview";

/// Prepended to every user prompt.
pub const STYLE_PREFIX: &str =
    "High quality manga art illustration, professional line art, cinematic lighting, ";

/// Output frame shapes the image model accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "2:3")]
    Portrait2x3,
    #[serde(rename = "3:2")]
    Landscape3x2,
    #[serde(rename = "3:4")]
    Portrait3x4,
    #[serde(rename = "4:3")]
    Landscape4x3,
    #[serde(rename = "9:16")]
    Tall,
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "21:9")]
    Cinematic,
}

impl AspectRatio {
    pub const ALL: [Self; 8] = [
        Self::Square,
        Self::Portrait2x3,
        Self::Landscape3x2,
        Self::Portrait3x4,
        Self::Landscape4x3,
        Self::Tall,
        Self::Widescreen,
        Self::Cinematic,
    ];

    /// The `W:H` tag sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Portrait2x3 => "2:3",
            Self::Landscape3x2 => "3:2",
            Self::Portrait3x4 => "3:4",
            Self::Landscape4x3 => "4:3",
            Self::Tall => "9:16",
            Self::Widescreen => "16:9",
            Self::Cinematic => "21:9",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = MangaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == tag)
            .ok_or_else(|| {
                MangaError::InvalidInput(format!(
                    "Unsupported aspect ratio '{}'. Expected one of: {}",
                    s,
                    Self::ALL.map(Self::as_str).join(", ")
                ))
            })
    }
}

/// Output resolution tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl ImageSize {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneK => "1K",
            Self::TwoK => "2K",
            Self::FourK => "4K",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image returned by the model, with the request that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImage {
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
    /// The caller's prompt, without the style prefix.
    pub prompt: String,
    pub aspect_ratio: AspectRatio,
    pub created_at: DateTime<Utc>,
}

impl GeneratedImage {
    fn from_inline(image: &InlineImage, prompt: &str, aspect_ratio: AspectRatio) -> Self {
        Self {
            mime_type: image.mime_type.clone(),
            data: image.data.clone(),
            prompt: prompt.to_string(),
            aspect_ratio,
            created_at: Utc::now(),
        }
    }

    /// `data:<mime>;base64,<data>` form, ready for an `<img src>`.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decoded image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MangaError::InvalidInput`] if `data` is not valid base64.
    pub fn bytes(&self) -> Result<Vec<u8>, MangaError> {
        InlineImage::new(self.mime_type.clone(), self.data.clone()).bytes()
    }
}

/// Generates artwork from a text prompt.
///
/// Each call is a single request with no retry; callers trigger it directly
/// and can simply ask again.
#[derive(Clone)]
pub struct ImageGenerator {
    backend: Arc<dyn GenerativeBackend>,
    model: String,
    image_size: ImageSize,
}

impl fmt::Debug for ImageGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageGenerator")
            .field("model", &self.model)
            .field("image_size", &self.image_size)
            .finish_non_exhaustive()
    }
}

impl ImageGenerator {
    #[must_use]
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            model: DEFAULT_IMAGE_MODEL.to_string(),
            image_size: ImageSize::default(),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub const fn with_image_size(mut self, image_size: ImageSize) -> Self {
        self.image_size = image_size;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Builds the request for `prompt`: one text part carrying the style
    /// prefix, plus the image configuration.
    #[must_use]
    pub fn build_request(&self, prompt: &str, aspect_ratio: AspectRatio) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(format!(
                "{STYLE_PREFIX}{prompt}"
            ))])],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
                image_config: Some(ImageConfig {
                    aspect_ratio: aspect_ratio.to_string(),
                    image_size: self.image_size.to_string(),
                }),
                ..Default::default()
            }),
        }
    }

    /// Generates one image.
    ///
    /// # Errors
    ///
    /// - [`MangaError::InvalidInput`] for a blank prompt
    /// - [`MangaError::NoImageReturned`] when no response part carries image data
    /// - [`MangaError::ApiKeyExpired`] when the API reports the requested
    ///   entity as not found
    /// - any other upstream failure unchanged
    pub async fn generate_image(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
    ) -> Result<GeneratedImage, MangaError> {
        if prompt.trim().is_empty() {
            return Err(MangaError::InvalidInput(
                "Image prompt must not be empty".to_string(),
            ));
        }

        debug!(
            "Generating {} image at {} with {}",
            aspect_ratio, self.image_size, self.model
        );
        let request = self.build_request(prompt, aspect_ratio);
        let response = self
            .backend
            .generate_content(&self.model, &request)
            .await
            .map_err(|e| {
                let e = e.translate_key_expiry();
                warn!("Image generation failed: {}", e);
                e
            })?;

        let image = response.first_inline_image().ok_or_else(|| {
            warn!("Image model answered without inline image data");
            MangaError::NoImageReturned
        })?;

        info!("Generated {} image ({} base64 chars)", image.mime_type, image.data.len());
        Ok(GeneratedImage::from_inline(image, prompt, aspect_ratio))
    }
}
