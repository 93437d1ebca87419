use url::Url;

use crate::error::{FetchError, Result};

/// Returns `true` if the HTTP status code indicates a redirect.
///
/// # Recognized Redirect Codes
///
/// - 301: Moved Permanently
/// - 302: Found
/// - 303: See Other
/// - 307: Temporary Redirect
/// - 308: Permanent Redirect
///
/// # Examples
///
/// ```
/// use covup_fetch::is_redirect;
///
/// assert!(is_redirect(301));
/// assert!(is_redirect(302));
/// assert!(!is_redirect(200));
/// assert!(!is_redirect(404));
/// ```
pub fn is_redirect(status: u16) -> bool {
    matches!(status, 301 | 302 | 303 | 307 | 308)
}

/// Returns `true` for 2xx statuses.
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Parse a download source. Only absolute `http` and `https` URLs are accepted.
pub fn parse_source_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(FetchError::InvalidUrl(format!(
            "{raw}: unsupported scheme {other:?}"
        ))),
    }
}

/// Resolve a `Location` header against the URL that produced it.
pub fn resolve_redirect(base: &Url, location: &str) -> Result<Url> {
    let next = base
        .join(location)
        .map_err(|e| FetchError::Network(format!("invalid redirect location {location:?}: {e}")))?;
    match next.scheme() {
        "http" | "https" => Ok(next),
        other => Err(FetchError::Network(format!(
            "redirect to unsupported scheme {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_redirect_all_codes() {
        assert!(is_redirect(301));
        assert!(is_redirect(302));
        assert!(is_redirect(303));
        assert!(is_redirect(307));
        assert!(is_redirect(308));
    }

    #[test]
    fn test_is_redirect_edge_cases() {
        assert!(!is_redirect(300)); // Multiple Choices (not in our list)
        assert!(!is_redirect(304)); // Not Modified
        assert!(!is_redirect(305));
        assert!(!is_redirect(306));
        assert!(!is_redirect(200));
        assert!(!is_redirect(404));
    }

    #[test]
    fn test_is_success() {
        assert!(is_success(200));
        assert!(is_success(204));
        assert!(is_success(299));
        assert!(!is_success(199));
        assert!(!is_success(300));
        assert!(!is_success(404));
    }

    #[test]
    fn test_parse_source_url_accepts_http_and_https() {
        assert!(parse_source_url("https://cli.codecov.io/latest/linux/codecov").is_ok());
        assert!(parse_source_url("http://127.0.0.1:8080/x").is_ok());
    }

    #[test]
    fn test_parse_source_url_rejects_relative_and_other_schemes() {
        assert!(matches!(
            parse_source_url("latest/linux/codecov"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_source_url("ftp://example.com/codecov"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_source_url("file:///etc/passwd"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_resolve_redirect_relative_and_absolute() {
        let base = Url::parse("https://cli.codecov.io/latest/linux/codecov").unwrap();
        assert_eq!(
            resolve_redirect(&base, "/v1.2.3/linux/codecov").unwrap().as_str(),
            "https://cli.codecov.io/v1.2.3/linux/codecov"
        );
        assert_eq!(
            resolve_redirect(&base, "https://mirror.example/codecov").unwrap().as_str(),
            "https://mirror.example/codecov"
        );
    }

    #[test]
    fn test_resolve_redirect_rejects_non_http() {
        let base = Url::parse("https://cli.codecov.io/latest/linux/codecov").unwrap();
        assert!(resolve_redirect(&base, "file:///tmp/evil").is_err());
    }
}
