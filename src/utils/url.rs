//! URL utilities for consistent endpoint construction
//!
//! The Gemini API addresses a model directly in the request path, so the
//! helpers here build `models/{model}:{method}` URLs from a normalized base.

/// Normalize a base URL by removing trailing slashes.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path without producing double slashes.
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// Build the streaming generation endpoint for a model.
///
/// `?alt=sse` asks the service for server-sent events rather than a JSON
/// array of chunks.
pub fn stream_generate_url(base_url: &str, model: &str) -> String {
    format!(
        "{}?alt=sse",
        construct_api_url(base_url, &format!("models/{model}:streamGenerateContent"))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://generativelanguage.googleapis.com/v1beta"),
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(
            normalize_base_url("https://generativelanguage.googleapis.com/v1beta/"),
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(
            normalize_base_url("https://example.com///"),
            "https://example.com"
        );
        assert_eq!(normalize_base_url(""), "");
        assert_eq!(normalize_base_url("///"), "");
    }

    #[test]
    fn test_construct_api_url() {
        assert_eq!(
            construct_api_url("https://example.com/v1beta", "models"),
            "https://example.com/v1beta/models"
        );
        assert_eq!(
            construct_api_url("https://example.com/v1beta/", "/models"),
            "https://example.com/v1beta/models"
        );
        assert_eq!(
            construct_api_url("https://example.com/v1beta///", "models"),
            "https://example.com/v1beta/models"
        );
    }

    #[test]
    fn test_stream_generate_url() {
        assert_eq!(
            stream_generate_url(
                "https://generativelanguage.googleapis.com/v1beta",
                "gemini-2.5-flash"
            ),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
        // Trailing slash on the base must not produce a double slash.
        assert_eq!(
            stream_generate_url("https://example.com/v1beta/", "gemini-2.5-pro"),
            "https://example.com/v1beta/models/gemini-2.5-pro:streamGenerateContent?alt=sse"
        );
    }
}
