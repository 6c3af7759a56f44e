//! URL repair and validation.
//!
//! Everything here is pure and syntactic; nothing checks reachability.
//!
//! [`try_fix`] and [`validate`] are the lenient pair the sweeper uses on
//! stored records. New links go through the stricter [`try_fix_target`] and
//! [`validate_target`], which only accept web schemes with a host.

use url::{ParseError, Url};

/// Scheme prepended to URLs that were stored without one.
const DEFAULT_SCHEME_PREFIX: &str = "http://";

/// Schemes a new short link may redirect to.
pub const ALLOWED_SCHEMES: &[&str] = &["http", "https", "ftp"];

/// Why a URL failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidUrlReason {
    #[error("null or whitespace")]
    Blank,

    #[error("not a valid url")]
    NotAbsolute,

    #[error("scheme is not http, https or ftp")]
    SchemeNotAllowed,

    #[error("missing host")]
    MissingHost,
}

/// Attempts to repair a URL.
///
/// Trims surrounding whitespace and, when the remainder only parses as a
/// relative reference (no scheme), prefixes `http://`.
///
/// Returns the possibly rewritten URL and whether anything changed. Blank
/// input is returned untouched.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(try_fix("  example.com "), ("http://example.com".to_string(), true));
/// assert_eq!(try_fix("http://example.com"), ("http://example.com".to_string(), false));
/// ```
pub fn try_fix(url: &str) -> (String, bool) {
    if url.trim().is_empty() {
        return (url.to_string(), false);
    }

    let trimmed = url.trim();
    let mut changed = trimmed.len() != url.len();

    let fixed = match Url::parse(trimmed) {
        Err(ParseError::RelativeUrlWithoutBase) => {
            changed = true;
            format!("{DEFAULT_SCHEME_PREFIX}{trimmed}")
        }
        _ => trimmed.to_string(),
    };

    (fixed, changed)
}

/// Checks that a URL is non-blank and parses as an absolute URI.
///
/// # Errors
///
/// Returns the [`InvalidUrlReason`] describing the failure.
pub fn validate(url: &str) -> Result<Url, InvalidUrlReason> {
    if url.trim().is_empty() {
        return Err(InvalidUrlReason::Blank);
    }

    Url::parse(url).map_err(|_| InvalidUrlReason::NotAbsolute)
}

/// Like [`try_fix`], but also reads `host:port` input as a bare host.
///
/// `example.com:8080/path` parses as an absolute URL with the scheme
/// `example.com`, so [`try_fix`] leaves it alone. Here a digit right after the
/// first colon means a port and the input gets `http://` in front.
pub fn try_fix_target(url: &str) -> (String, bool) {
    let (fixed, changed) = try_fix(url);

    if starts_with_host_port(&fixed) {
        return (format!("{DEFAULT_SCHEME_PREFIX}{fixed}"), true);
    }

    (fixed, changed)
}

fn starts_with_host_port(url: &str) -> bool {
    match url.split_once(':') {
        Some((head, rest)) => {
            !ALLOWED_SCHEMES.contains(&head.to_ascii_lowercase().as_str())
                && rest.starts_with(|c: char| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Checks that a URL is absolute, uses an allowed scheme and names a host.
///
/// # Errors
///
/// Returns the [`InvalidUrlReason`] describing the failure.
pub fn validate_target(url: &str) -> Result<Url, InvalidUrlReason> {
    let parsed = validate(url)?;

    if !ALLOWED_SCHEMES.contains(&parsed.scheme()) {
        return Err(InvalidUrlReason::SchemeNotAllowed);
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(InvalidUrlReason::MissingHost);
    }

    Ok(parsed)
}

/// Boolean form of [`validate`]: `(true, "")` on success, `(false, reason)` otherwise.
pub fn is_valid(url: &str) -> (bool, String) {
    match validate(url) {
        Ok(_) => (true, String::new()),
        Err(reason) => (false, reason.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_fix_trims_and_adds_scheme() {
        assert_eq!(
            try_fix("  example.com "),
            ("http://example.com".to_string(), true)
        );
    }

    #[test]
    fn test_try_fix_leaves_absolute_url_unchanged() {
        assert_eq!(
            try_fix("http://example.com"),
            ("http://example.com".to_string(), false)
        );
    }

    #[test]
    fn test_try_fix_trim_only() {
        assert_eq!(
            try_fix(" https://example.com/path\n"),
            ("https://example.com/path".to_string(), true)
        );
    }

    #[test]
    fn test_try_fix_adds_scheme_without_trim() {
        assert_eq!(
            try_fix("example.com/a?b=c"),
            ("http://example.com/a?b=c".to_string(), true)
        );
    }

    #[test]
    fn test_try_fix_blank_input() {
        assert_eq!(try_fix(""), (String::new(), false));
        assert_eq!(try_fix("   "), ("   ".to_string(), false));
    }

    #[test]
    fn test_try_fix_keeps_non_http_absolute() {
        assert_eq!(
            try_fix("mailto:someone@example.com"),
            ("mailto:someone@example.com".to_string(), false)
        );
    }

    #[test]
    fn test_is_valid_accepts_absolute() {
        assert_eq!(is_valid("http://example.com"), (true, String::new()));
        assert_eq!(is_valid("https://example.com/a?b#c"), (true, String::new()));
    }

    #[test]
    fn test_is_valid_rejects_garbage() {
        let (ok, reason) = is_valid("not a url");
        assert!(!ok);
        assert_eq!(reason, "not a valid url");
    }

    #[test]
    fn test_is_valid_rejects_relative() {
        let (ok, _) = is_valid("example.com");
        assert!(!ok);
    }

    #[test]
    fn test_is_valid_rejects_blank() {
        assert_eq!(is_valid(""), (false, "null or whitespace".to_string()));
        assert_eq!(is_valid(" \t"), (false, "null or whitespace".to_string()));
    }

    #[test]
    fn test_fixed_garbage_is_still_invalid() {
        let (fixed, changed) = try_fix("not a url");
        assert!(changed);
        assert!(!is_valid(&fixed).0);
    }

    #[test]
    fn test_try_fix_target_treats_port_as_host() {
        assert_eq!(
            try_fix_target("example.com:8080/path"),
            ("http://example.com:8080/path".to_string(), true)
        );
        assert_eq!(
            try_fix_target(" localhost:3000 "),
            ("http://localhost:3000".to_string(), true)
        );
    }

    #[test]
    fn test_try_fix_target_keeps_scheme_urls() {
        assert_eq!(
            try_fix_target("https://example.com:8443/a"),
            ("https://example.com:8443/a".to_string(), false)
        );
        assert_eq!(
            try_fix_target("javascript:alert(1)"),
            ("javascript:alert(1)".to_string(), false)
        );
        assert_eq!(
            try_fix_target("example.com"),
            ("http://example.com".to_string(), true)
        );
    }

    #[test]
    fn test_validate_target_accepts_web_schemes() {
        for url in [
            "http://example.com",
            "https://example.com/a?b#c",
            "ftp://files.example.com/pub",
            "http://localhost:3000",
        ] {
            assert!(validate_target(url).is_ok(), "'{url}' should be accepted");
        }
    }

    #[test]
    fn test_validate_target_rejects_other_schemes() {
        for url in [
            "javascript:alert(1)",
            "data:text/html,<script>alert(1)</script>",
            "file:///etc/passwd",
            "mailto:someone@example.com",
            "example.com:8080/path",
        ] {
            assert_eq!(
                validate_target(url).unwrap_err(),
                InvalidUrlReason::SchemeNotAllowed,
                "'{url}' should be rejected"
            );
        }
    }

    #[test]
    fn test_lenient_check_still_accepts_other_schemes() {
        assert!(is_valid("mailto:someone@example.com").0);
        assert!(is_valid("file:///etc/passwd").0);
    }

    #[test]
    fn test_validate_exposes_host() {
        let url = validate("https://TNY.wtf/abc").unwrap();
        assert_eq!(url.host_str(), Some("tny.wtf"));
    }
}
