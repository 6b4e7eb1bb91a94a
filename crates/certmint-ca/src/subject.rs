//! Subject classification for certificate requests.
//!
//! Every raw argument resolves to exactly one [`Subject`] variant or the
//! whole batch fails. Precedence is fixed: IP literal, then email, then
//! URI, then DNS hostname candidate.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use email_address::EmailAddress;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::{CaError, Result};

/// Hostname grammar: one optional leading wildcard label, then labels of
/// letters, digits, hyphens and underscores separated by dots.
static HOSTNAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\*\.)?[0-9a-z_-]([0-9a-z._-]*[0-9a-z_-])?$").expect("valid hostname pattern")
});

/// Wildcard directly over a top-level label, e.g. `*.com`.
static SECOND_LEVEL_WILDCARD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\*\.[0-9a-z_-]+$").expect("valid wildcard pattern"));

/// A single certificate subject, classified from a raw argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// IPv4 or IPv6 address literal
    Ip(IpAddr),
    /// Bare email address (no display name)
    Email(String),
    /// URI with both a scheme and a host component
    Uri(String),
    /// DNS name normalized to ASCII; may carry one leading wildcard label
    Dns(String),
}

impl Subject {
    /// Classify one raw argument.
    ///
    /// Hostname candidates go through an IDNA-to-ASCII transform before
    /// grammar validation, so internationalized names come back punycoded.
    ///
    /// # Errors
    ///
    /// Returns [`CaError::InvalidSubject`] carrying the original input when
    /// no variant matches.
    pub fn classify(raw: &str) -> Result<Self> {
        if let Ok(ip) = raw.parse::<IpAddr>() {
            return Ok(Self::Ip(ip));
        }
        if let Ok(email) = EmailAddress::from_str(raw) {
            // Accept only input that already is the canonical address form.
            if email.to_string() == raw {
                return Ok(Self::Email(raw.to_string()));
            }
        }
        if let Ok(uri) = Url::parse(raw) {
            if !uri.scheme().is_empty() && uri.host_str().is_some() {
                return Ok(Self::Uri(raw.to_string()));
            }
        }
        let ascii = idna::domain_to_ascii(raw).map_err(|_| CaError::InvalidSubject {
            input: raw.to_string(),
        })?;
        if !HOSTNAME_RE.is_match(&ascii) {
            return Err(CaError::InvalidSubject {
                input: raw.to_string(),
            });
        }
        Ok(Self::Dns(ascii))
    }

    /// The value that ends up in the certificate. DNS names are the
    /// normalized ASCII form, not the raw input.
    pub fn value(&self) -> String {
        match self {
            Self::Ip(ip) => ip.to_string(),
            Self::Email(email) => email.clone(),
            Self::Uri(uri) => uri.clone(),
            Self::Dns(name) => name.clone(),
        }
    }

    /// Whether this is an email subject (drives the EmailProtection EKU).
    pub const fn is_email(&self) -> bool {
        matches!(self, Self::Email(_))
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value())
    }
}

/// Classify a full argument list atomically.
///
/// The first invalid entry fails the whole batch; callers never observe a
/// partially classified list. Returned subjects carry normalized values.
///
/// # Errors
///
/// Returns [`CaError::InvalidSubject`] for the first unclassifiable entry.
pub fn classify_all(args: &[String]) -> Result<Vec<Subject>> {
    args.iter().map(|raw| Subject::classify(raw)).collect()
}

/// Advisory lines for wildcard subjects. Never an error.
pub fn wildcard_advisories(subjects: &[Subject]) -> Vec<String> {
    let mut lines = Vec::new();
    for subject in subjects {
        let Subject::Dns(name) = subject else {
            continue;
        };
        if SECOND_LEVEL_WILDCARD_RE.is_match(name) {
            lines.push(format!(
                "Warning: many browsers don't support second-level wildcards like {name:?}"
            ));
        }
        if let Some(base) = name.strip_prefix("*.") {
            lines.push(format!(
                "Reminder: X.509 wildcards only go one level deep, so this won't match a.b.{base}"
            ));
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(raw: &str) -> Subject {
        Subject::classify(raw).unwrap()
    }

    #[test]
    fn test_ip_literals() {
        assert_eq!(classify("127.0.0.1"), Subject::Ip("127.0.0.1".parse().unwrap()));
        assert_eq!(classify("::1"), Subject::Ip("::1".parse().unwrap()));
        // IP classification never punycodes
        assert_eq!(classify("10.0.0.7").value(), "10.0.0.7");
    }

    #[test]
    fn test_email() {
        assert_eq!(
            classify("dev@example.com"),
            Subject::Email("dev@example.com".to_string())
        );
    }

    #[test]
    fn test_email_with_display_name_rejected() {
        // A display-name-wrapped address is not a bare subject, and it is
        // not a hostname either
        assert!(Subject::classify("Jane Dev <jane@example.com>").is_err());
    }

    #[test]
    fn test_uri() {
        assert_eq!(
            classify("https://example.com/path"),
            Subject::Uri("https://example.com/path".to_string())
        );
    }

    #[test]
    fn test_uri_without_host_is_not_a_uri() {
        // Has a scheme but no host, and the colon fails the hostname grammar
        assert!(Subject::classify("mailto:dev@example.com").is_err());
    }

    #[test]
    fn test_dns_name() {
        assert_eq!(classify("example.org"), Subject::Dns("example.org".to_string()));
        assert_eq!(classify("my_host.local"), Subject::Dns("my_host.local".to_string()));
    }

    #[test]
    fn test_internationalized_name_is_punycoded() {
        assert_eq!(
            classify("bücher.example"),
            Subject::Dns("xn--bcher-kva.example".to_string())
        );
    }

    #[test]
    fn test_classification_is_idempotent_on_ascii_output() {
        let first = classify("bücher.example");
        let again = classify(&first.value());
        assert_eq!(first, again);
    }

    #[test]
    fn test_wildcard_accepted() {
        assert_eq!(
            classify("*.example.org"),
            Subject::Dns("*.example.org".to_string())
        );
    }

    #[test]
    fn test_wildcard_without_dot_rejected() {
        assert!(Subject::classify("*example.org").is_err());
    }

    #[test]
    fn test_host_port_rejected() {
        assert!(Subject::classify("localhost:8443").is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert!(Subject::classify("").is_err());
    }

    #[test]
    fn test_error_carries_original_input() {
        let err = Subject::classify("*example.org").unwrap_err();
        assert!(err.to_string().contains("*example.org"));
    }

    #[test]
    fn test_classify_all_is_atomic() {
        let args = vec!["example.org".to_string(), "not valid!".to_string()];
        assert!(classify_all(&args).is_err());
    }

    #[test]
    fn test_classify_all_preserves_order() {
        let args = vec![
            "example.com".to_string(),
            "myapp.dev".to_string(),
            "127.0.0.1".to_string(),
        ];
        let subjects = classify_all(&args).unwrap();
        let values: Vec<String> = subjects.iter().map(Subject::value).collect();
        assert_eq!(values, vec!["example.com", "myapp.dev", "127.0.0.1"]);
    }

    #[test]
    fn test_wildcard_advisories() {
        let subjects = classify_all(&["*.com".to_string(), "*.example.org".to_string()]).unwrap();
        let lines = wildcard_advisories(&subjects);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("second-level"));
        assert!(lines[2].contains("a.b.example.org"));
    }

    #[test]
    fn test_no_advisories_for_plain_names() {
        let subjects = classify_all(&["example.org".to_string()]).unwrap();
        assert!(wildcard_advisories(&subjects).is_empty());
    }
}
