/// Represents the API version to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V1Beta,
}

impl ApiVersion {
    const fn as_str(self) -> &'static str {
        match self {
            Self::V1Beta => "v1beta",
        }
    }
}

// --- URL Construction ---
pub const BASE_URL_PREFIX: &str = "https://generativelanguage.googleapis.com";

/// Header name for API key authentication.
///
/// Keeps the key out of URLs, and therefore out of proxy logs and error
/// messages that echo the request URL.
pub const API_KEY_HEADER: &str = "X-Goog-Api-Key";

/// API endpoints this crate calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint<'a> {
    /// `models/{model}:generateContent`
    GenerateContent { model: &'a str },
}

impl Endpoint<'_> {
    fn to_path(&self, version: ApiVersion) -> String {
        match self {
            Self::GenerateContent { model } => format!(
                "/{}/models/{}:generateContent",
                version.as_str(),
                urlencoding::encode(model)
            ),
        }
    }
}

/// Constructs a URL for `endpoint` under `base_url`.
///
/// A trailing `/` on `base_url` is ignored. Authentication goes in the
/// [`API_KEY_HEADER`] header, never in the query string.
#[must_use]
pub fn construct_endpoint_url(base_url: &str, endpoint: Endpoint) -> String {
    let path = endpoint.to_path(ApiVersion::V1Beta);
    format!("{}{path}", base_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_version_as_str() {
        assert_eq!(ApiVersion::V1Beta.as_str(), "v1beta");
    }

    #[test]
    fn test_generate_content_url() {
        let url = construct_endpoint_url(
            BASE_URL_PREFIX,
            Endpoint::GenerateContent {
                model: "gemini-3-flash-preview",
            },
        );
        assert_eq!(
            url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:generateContent"
        );
        assert!(!url.contains("key=")); // API key should not be in URL
    }

    #[test]
    fn test_model_name_is_encoded() {
        let url = construct_endpoint_url(
            BASE_URL_PREFIX,
            Endpoint::GenerateContent {
                model: "weird/model name",
            },
        );
        assert!(url.ends_with("/models/weird%2Fmodel%20name:generateContent"));
    }

    #[test]
    fn test_custom_base_url_trailing_slash() {
        let url = construct_endpoint_url(
            "http://localhost:8080/",
            Endpoint::GenerateContent { model: "m" },
        );
        assert_eq!(url, "http://localhost:8080/v1beta/models/m:generateContent");
    }

    #[test]
    fn test_api_key_header_constant() {
        assert_eq!(API_KEY_HEADER, "X-Goog-Api-Key");
    }
}
