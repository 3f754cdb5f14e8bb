//! Page images handed over by the ingestion layer.
//!
//! Rasterizing PDFs or reading uploads happens elsewhere; this module only
//! turns what that layer produces (data URLs, raw bytes, or files on disk)
//! into the [`Page`] values the explainer consumes.
//!
//! # Example
//!
//! ```
//! use manga_explainer::Page;
//!
//! let page = Page::from_data_url("data:image/png;base64,iVBORw0KGgo=", "page-1.png").unwrap();
//! assert_eq!(page.image.mime_type, "image/png");
//! assert_eq!(page.image.data, "iVBORw0KGgo=");
//! ```

use crate::errors::MangaError;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Base64-encoded image bytes tagged with their MIME type.
///
/// Serializes to the API's `inlineData` shape (`mimeType`, `data`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 payload, without any `data:` prefix.
    pub data: String,
}

impl InlineImage {
    #[must_use]
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Renders this image as a `data:` URL.
    #[must_use]
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Decodes the base64 payload.
    ///
    /// # Errors
    ///
    /// Returns [`MangaError::InvalidInput`] if the payload is not valid base64.
    pub fn bytes(&self) -> Result<Vec<u8>, MangaError> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| MangaError::InvalidInput(format!("Invalid base64 image data: {}", e)))
    }
}

/// One uploaded page or panel image, in reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub image: InlineImage,
    pub label: String,
}

impl Page {
    #[must_use]
    pub fn new(image: InlineImage, label: impl Into<String>) -> Self {
        Self {
            image,
            label: label.into(),
        }
    }

    /// Creates a page from raw image bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>, label: impl Into<String>) -> Self {
        let data = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self::new(InlineImage::new(mime_type, data), label)
    }

    /// Creates a page from a `data:<mime>;base64,<payload>` URL, the form
    /// browsers and PDF rasterizers hand back.
    ///
    /// # Errors
    ///
    /// Returns [`MangaError::InvalidInput`] if the URL is not a base64 data URL
    /// or its payload is empty.
    pub fn from_data_url(url: &str, label: impl Into<String>) -> Result<Self, MangaError> {
        let rest = url.strip_prefix("data:").ok_or_else(|| {
            MangaError::InvalidInput("Page image is not a data URL (missing 'data:' prefix)".into())
        })?;
        let (header, payload) = rest.split_once(',').ok_or_else(|| {
            MangaError::InvalidInput("Page data URL has no ',' separating header and payload".into())
        })?;
        let mime_type = header.strip_suffix(";base64").ok_or_else(|| {
            MangaError::InvalidInput(format!(
                "Page data URL header '{}' is not base64-encoded",
                header
            ))
        })?;
        if payload.trim().is_empty() {
            return Err(MangaError::InvalidInput("Page data URL has an empty payload".into()));
        }
        let mime_type = if mime_type.is_empty() {
            "image/png"
        } else {
            mime_type
        };
        Ok(Self::new(InlineImage::new(mime_type, payload.trim()), label))
    }

    /// Loads a page from an image file, detecting the MIME type from its
    /// extension. The label is the file name.
    ///
    /// # Errors
    ///
    /// Returns [`MangaError::InvalidInput`] if the extension is not a
    /// supported image type or the file cannot be read.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, MangaError> {
        let path = path.as_ref();
        let mime_type = detect_mime_type(path).ok_or_else(|| {
            MangaError::InvalidInput(format!(
                "Unsupported page image '{}'. Supported extensions: jpg, jpeg, png, gif, webp, heic, heif.",
                path.display()
            ))
        })?;
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            let suggestion = match e.kind() {
                std::io::ErrorKind::NotFound => " Check that the file path is correct.",
                std::io::ErrorKind::PermissionDenied => " Check file permissions.",
                _ => "",
            };
            MangaError::InvalidInput(format!(
                "Failed to read file '{}': {}.{}",
                path.display(),
                e,
                suggestion
            ))
        })?;
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::from_bytes(&bytes, mime_type, label))
    }
}

/// Detects an image MIME type from a file extension.
///
/// - `jpg`, `jpeg` → `image/jpeg`
/// - `png` → `image/png`
/// - `gif` → `image/gif`
/// - `webp` → `image/webp`
/// - `heic`, `heif` → `image/heic`
///
/// ```
/// use std::path::Path;
/// use manga_explainer::detect_mime_type;
///
/// assert_eq!(detect_mime_type(Path::new("page-01.jpg")), Some("image/jpeg"));
/// assert_eq!(detect_mime_type(Path::new("chapter.pdf")), None);
/// ```
pub fn detect_mime_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" | "heif" => Some("image/heic"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_detect_mime_type_images() {
        assert_eq!(detect_mime_type(Path::new("a.jpg")), Some("image/jpeg"));
        assert_eq!(detect_mime_type(Path::new("a.jpeg")), Some("image/jpeg"));
        assert_eq!(detect_mime_type(Path::new("a.png")), Some("image/png"));
        assert_eq!(detect_mime_type(Path::new("a.gif")), Some("image/gif"));
        assert_eq!(detect_mime_type(Path::new("a.webp")), Some("image/webp"));
        assert_eq!(detect_mime_type(Path::new("a.heif")), Some("image/heic"));
    }

    #[test]
    fn test_detect_mime_type_case_insensitive() {
        assert_eq!(detect_mime_type(Path::new("photo.JPG")), Some("image/jpeg"));
        assert_eq!(detect_mime_type(Path::new("photo.PNG")), Some("image/png"));
    }

    #[test]
    fn test_detect_mime_type_unknown() {
        assert_eq!(detect_mime_type(Path::new("file.pdf")), None);
        assert_eq!(detect_mime_type(Path::new("noextension")), None);
        assert_eq!(detect_mime_type(Path::new("file.")), None);
    }

    #[test]
    fn test_from_data_url() {
        let page = Page::from_data_url("data:image/jpeg;base64,/9j/4AAQ", "p1").unwrap();
        assert_eq!(page.image.mime_type, "image/jpeg");
        assert_eq!(page.image.data, "/9j/4AAQ");
        assert_eq!(page.label, "p1");
        assert_eq!(page.image.data_url(), "data:image/jpeg;base64,/9j/4AAQ");
    }

    #[test]
    fn test_from_data_url_rejects_malformed() {
        for url in [
            "iVBORw0KGgo=",
            "data:image/png;base64",
            "data:image/png,plain",
            "data:image/png;base64,",
        ] {
            let err = Page::from_data_url(url, "x").unwrap_err();
            assert!(
                matches!(err, MangaError::InvalidInput(_)),
                "expected InvalidInput for {url}"
            );
        }
    }

    #[test]
    fn test_from_bytes_roundtrips_through_base64() {
        let page = Page::from_bytes(&[1, 2, 3, 255], "image/png", "raw");
        assert_eq!(page.image.bytes().unwrap(), vec![1, 2, 3, 255]);
    }

    #[test]
    fn test_bytes_rejects_invalid_base64() {
        let image = InlineImage::new("image/png", "not base64!!");
        assert!(matches!(image.bytes(), Err(MangaError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .unwrap();
        file.write_all(&[0x89, b'P', b'N', b'G']).unwrap();

        let page = Page::from_file(file.path()).await.unwrap();
        assert_eq!(page.image.mime_type, "image/png");
        assert_eq!(page.image.bytes().unwrap(), vec![0x89, b'P', b'N', b'G']);
        assert!(page.label.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_from_file_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        let err = Page::from_file(file.path()).await.unwrap_err();
        assert!(err.to_string().contains("Unsupported page image"));
    }

    #[tokio::test]
    async fn test_from_file_missing() {
        let err = Page::from_file("/definitely/not/here/page.png")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Check that the file path is correct"));
    }
}
