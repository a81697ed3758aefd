//! Input validation utilities

use regex::Regex;
use reqwest::Url;
use std::sync::OnceLock;

/// Normalize a user-entered instance domain to an absolute base URL
///
/// `https://` is prefixed when no scheme is given. Only `http` and `https`
/// are accepted, the authority is lowercased, and paths or trailing slashes
/// are not part of the result.
pub fn normalize_instance_url(instance: &str) -> Result<String, String> {
    let instance = instance.trim().trim_end_matches('/');
    if instance.is_empty() {
        return Err("Instance domain is required".to_string());
    }

    let (scheme, authority) = match instance.split_once("://") {
        Some((scheme, authority)) => (scheme.to_ascii_lowercase(), authority),
        None => ("https".to_string(), instance),
    };

    if scheme != "https" && scheme != "http" {
        return Err(format!("Unsupported scheme: {}", scheme));
    }

    if authority.len() > 253 {
        return Err("Instance domain must be at most 253 characters long".to_string());
    }

    static AUTHORITY_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = AUTHORITY_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9.-]*[a-zA-Z0-9])?(:[0-9]{1,5})?$")
            .expect("Failed to compile instance domain regex")
    });

    if !regex.is_match(authority) {
        return Err(format!("Invalid instance domain: {}", authority));
    }

    let normalized = format!("{}://{}", scheme, authority.to_ascii_lowercase());
    Url::parse(&normalized).map_err(|e| format!("Invalid instance domain: {}: {}", authority, e))?;

    Ok(normalized)
}

/// Validate a status or account id before it becomes part of an API path
///
/// Mastodon ids are numeric and Pleroma ids are alphanumeric flake ids.
pub fn validate_object_id(id: &str) -> Result<(), String> {
    static ID_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = ID_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("Failed to compile object id regex")
    });

    if !regex.is_match(id) {
        return Err(format!("Invalid id: {}", id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_domain_gets_https() {
        assert_eq!(
            normalize_instance_url("sub.example.org").unwrap(),
            "https://sub.example.org"
        );
    }

    #[test]
    fn test_existing_scheme_is_kept() {
        assert_eq!(
            normalize_instance_url("https://example.com").unwrap(),
            "https://example.com"
        );
        assert_eq!(
            normalize_instance_url("http://127.0.0.1:3000").unwrap(),
            "http://127.0.0.1:3000"
        );
    }

    #[test]
    fn test_whitespace_case_and_trailing_slash() {
        assert_eq!(
            normalize_instance_url("  Mastodon.Social/ ").unwrap(),
            "https://mastodon.social"
        );
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert!(normalize_instance_url("").is_err());
        assert!(normalize_instance_url("   ").is_err());
        assert!(normalize_instance_url("ftp://example.com").is_err());
        assert!(normalize_instance_url("example.com/path").is_err());
        assert!(normalize_instance_url("exa mple.com").is_err());
        assert!(normalize_instance_url("user@example.com").is_err());
    }

    #[test]
    fn test_rejects_out_of_range_port() {
        assert!(normalize_instance_url("example.com:99999").is_err());
        assert!(normalize_instance_url("example.com:65536").is_err());
        assert_eq!(
            normalize_instance_url("example.com:65535").unwrap(),
            "https://example.com:65535"
        );
    }

    #[test]
    fn test_object_ids() {
        assert!(validate_object_id("109876543210").is_ok());
        assert!(validate_object_id("AbC-9_z").is_ok());
        assert!(validate_object_id("").is_err());
        assert!(validate_object_id("..").is_err());
        assert!(validate_object_id("../accounts/9/follow?x=").is_err());
        assert!(validate_object_id("1/favourite").is_err());
        assert!(validate_object_id("1%2F2").is_err());
    }
}
