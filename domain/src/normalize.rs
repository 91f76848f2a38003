//! URL normalization: trim, default the scheme, validate.

use url::Url;

use crate::CoreError;

/// Canonicalize a user-submitted URL.
///
/// Surrounding whitespace is trimmed and `http://` is prepended when the input
/// has no http/https scheme. The result must parse as an absolute http(s) URL
/// with a host. The returned string is the prefixed input itself, not the
/// parser's re-serialization, so scheme and host casing are preserved.
pub fn normalize(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidUrl("empty".into()));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(CoreError::InvalidUrl("contains whitespace".into()));
    }
    let candidate = with_scheme(trimmed);
    let parsed = Url::parse(&candidate).map_err(|e| CoreError::InvalidUrl(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CoreError::InvalidUrl("must be http or https".into()));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(CoreError::InvalidUrl("missing host".into()));
    }
    Ok(candidate)
}

/// Where to send a visitor for a stored URL. Legacy values that no longer
/// validate still get a scheme so the redirect stays absolute.
pub fn redirect_target(stored: &str) -> String {
    normalize(stored).unwrap_or_else(|_| with_scheme(stored.trim()))
}

fn has_http_scheme(s: &str) -> bool {
    let head = s.get(..8).unwrap_or(s).to_ascii_lowercase();
    head.starts_with("http://") || head.starts_with("https://")
}

fn with_scheme(s: &str) -> String {
    if has_http_scheme(s) {
        s.to_string()
    } else {
        format!("http://{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepends_http_when_scheme_missing() {
        assert_eq!(normalize("example.com/x").unwrap(), "http://example.com/x");
        assert_eq!(
            normalize("  https://example.com/a?b=1  ").unwrap(),
            "https://example.com/a?b=1"
        );
    }

    #[test]
    fn keeps_uppercase_scheme_and_validates() {
        assert_eq!(
            normalize("HTTPS://Example.com").unwrap(),
            "HTTPS://Example.com"
        );
        assert_eq!(normalize("Http://e.example").unwrap(), "Http://e.example");
    }

    #[test]
    fn rejects_blank_and_spaced_input() {
        assert!(matches!(normalize("   "), Err(CoreError::InvalidUrl(_))));
        assert!(matches!(normalize(""), Err(CoreError::InvalidUrl(_))));
        assert!(matches!(normalize("not a url"), Err(CoreError::InvalidUrl(_))));
        assert!(normalize("http://exa mple.com").is_err());
    }

    #[test]
    fn rejects_malformed_authorities() {
        assert!(normalize("http://").is_err());
        assert!(normalize("https://").is_err());
        assert!(normalize("javascript:alert(1)").is_err());
        assert!(normalize("http://[::1").is_err());
    }

    #[test]
    fn redirect_target_prefixes_legacy_values() {
        assert_eq!(redirect_target("example.com"), "http://example.com");
        assert_eq!(redirect_target("https://e.example"), "https://e.example");
        assert_eq!(redirect_target(" bad host "), "http://bad host");
    }
}
