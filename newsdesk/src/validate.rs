//! Form input checks shared by the editorial and reader-facing operations.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::{Error, Result};

static EMAIL: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$"));

/// Trimmed `value`, which must not be blank.
pub(crate) fn required(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::invalid(field, "is required"));
    }
    Ok(value.to_string())
}

/// Trimmed `value`, with blank treated as absent.
pub(crate) fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// `value`, refused if longer than `max` characters.
pub(crate) fn max_chars(field: &'static str, value: String, max: usize) -> Result<String> {
    let count = value.chars().count();
    if count > max {
        return Err(Error::invalid(
            field,
            format!("must be at most {max} characters, got {count}"),
        ));
    }
    Ok(value)
}

/// An absolute http(s) URL, or a site-relative path starting with `/`.
pub(crate) fn link(field: &'static str, value: &str) -> Result<String> {
    if value.starts_with('/') && !value.starts_with("//") {
        return Ok(value.to_string());
    }
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(value.to_string()),
        Ok(url) => Err(Error::invalid(
            field,
            format!("unsupported scheme {}", url.scheme()),
        )),
        Err(e) => Err(Error::invalid(field, e.to_string())),
    }
}

/// Normalized (trimmed, lower-cased) email address.
pub(crate) fn email(value: &str) -> Result<String> {
    let email = value.trim().to_lowercase();
    let pattern = EMAIL
        .as_ref()
        .map_err(|e| Error::Config(format!("email pattern: {e}")))?;
    if !pattern.is_match(&email) {
        return Err(Error::invalid("email", "is not a valid email address"));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_trims() {
        assert_eq!(required("title", "  Budget  ").unwrap(), "Budget");
        assert!(matches!(
            required("title", " \n "),
            Err(Error::Validation { field: "title", .. })
        ));
    }

    #[test]
    fn links() {
        assert!(link("image_url", "https://cdn.example.com/a.png").is_ok());
        assert!(link("image_url", "/storage/post-images/a.png").is_ok());
        assert!(link("image_url", "javascript:alert(1)").is_err());
        assert!(link("image_url", "not a url").is_err());
        assert!(link("image_url", "//evil.example/a.png").is_err());
    }

    #[test]
    fn emails() {
        assert_eq!(email(" Reader@Example.COM ").unwrap(), "reader@example.com");
        assert!(email("reader").is_err());
        assert!(email("reader@localhost").is_err());
        assert!(email("a b@example.com").is_err());
    }

    #[test]
    fn max_chars_counts_characters() {
        assert!(max_chars("content", "é".repeat(10), 10).is_ok());
        assert!(max_chars("content", "a".repeat(11), 10).is_err());
    }
}
