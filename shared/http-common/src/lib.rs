//! Shared HTTP utilities for the URL shortener workspace.
//!
//! Framework-agnostic helpers used by the api-server: structured JSON error
//! bodies, short URL building and HTML escaping for the rendered page.

// ============================================================================
// JSON Response Helpers (framework-agnostic)
// ============================================================================

/// Create a structured error JSON with a default message based on the code.
///
/// Returns: `{"error": {"code": "<code>", "message": "<default message>"}}`
pub fn json_err(code: &str) -> serde_json::Value {
    let message = match code {
        "error" | "internal" => "Internal server error",
        _ => code, // Fallback to code as message for unknown codes
    };
    serde_json::json!({"error": {"code": code, "message": message}})
}

// ============================================================================
// URL Building
// ============================================================================

/// Base URL short links hang off.
///
/// A configured public base wins. Otherwise `{scheme}://{host}`, where the
/// scheme comes from a proxy's `X-Forwarded-Proto` value (http if absent or
/// unrecognized). An empty host yields an empty base, i.e. relative links.
pub fn base_url(configured: Option<&str>, forwarded_proto: Option<&str>, host: &str) -> String {
    if let Some(dom) = configured.map(str::trim).filter(|d| !d.is_empty()) {
        return dom.trim_end_matches('/').to_string();
    }
    if host.is_empty() {
        return String::new();
    }
    let scheme = match forwarded_proto.map(|p| p.trim().to_ascii_lowercase()) {
        Some(p) if p == "https" => "https",
        _ => "http",
    };
    format!("{}://{}", scheme, host)
}

/// Join a base from [`base_url`] with a short code.
pub fn build_short_url(base: &str, code: &str) -> String {
    format!("{}/{}", base, code)
}

// ============================================================================
// HTML
// ============================================================================

/// Escape text for interpolation into HTML element content or a quoted
/// attribute value.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_err() {
        let err = json_err("internal");
        assert_eq!(err, serde_json::json!({"error": {"code": "internal", "message": "Internal server error"}}));

        // Unknown code falls back to code as message
        let err = json_err("custom_error");
        assert_eq!(err, serde_json::json!({"error": {"code": "custom_error", "message": "custom_error"}}));
    }

    #[test]
    fn test_base_url() {
        assert_eq!(base_url(None, None, "example.com"), "http://example.com");
        assert_eq!(base_url(None, Some("HTTPS"), "example.com:8443"), "https://example.com:8443");
        assert_eq!(base_url(None, Some("gopher"), "example.com"), "http://example.com");
        assert_eq!(base_url(Some("https://sho.rt/"), Some("http"), "ignored"), "https://sho.rt");
        assert_eq!(base_url(Some("  "), None, "example.com"), "http://example.com");
        assert_eq!(base_url(None, None, ""), "");
    }

    #[test]
    fn test_build_short_url() {
        assert_eq!(build_short_url("http://example.com", "abc123"), "http://example.com/abc123");
        assert_eq!(build_short_url("", "abc123"), "/abc123");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#039;");
        assert_eq!(escape_html("ø plain"), "ø plain");
    }
}
