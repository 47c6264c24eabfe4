//! Log Redaction Layer
//!
//! Scrubs API keys, access tokens, e-mail addresses and phone numbers from
//! strings prior to logging. Lease text is full of tenant and landlord contact
//! details, so excerpts go through here before they reach a log line.

use regex::Regex;
use std::sync::LazyLock;

static TELEPHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap()
});
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").unwrap()
});
static API_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9\-_]{20,})|(AIza[0-9A-Za-z\-_]{35})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)")
        .unwrap()
});

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    // Keys first: a long key can contain digit runs that look like phone numbers.
    let redacted = API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]");
    let redacted = EMAIL_RE.replace_all(&redacted, "[REDACTED_EMAIL]");
    TELEPHONE_RE
        .replace_all(&redacted, "[REDACTED_PHONE]")
        .into_owned()
}

/// Redacted prefix of `input`, at most `max_chars` characters, for log lines.
pub fn excerpt(input: &str, max_chars: usize) -> String {
    let mut short: String = input.chars().take(max_chars).collect();
    if input.chars().nth(max_chars).is_some() {
        short.push('…');
    }
    redact_sensitive_data(&short)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction() {
        let raw = "Sending to +1-555-123-4567 with Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("+1-555-123-4567"));
        assert!(!clean.contains("Bearer eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"));
    }

    #[test]
    fn test_redacts_email_and_keys() {
        let raw = "Contact landlord@example.com, key sk-or-v1-abcdefghijklmnopqrstuvwxyz012345";
        let clean = redact_sensitive_data(raw);
        assert!(clean.contains("[REDACTED_EMAIL]"));
        assert!(clean.contains("[REDACTED_TOKEN]"));
        assert!(!clean.contains("example.com"));
    }

    #[test]
    fn test_plain_lease_text_untouched() {
        let raw = "Tenant shall pay rent of $1,200 on the 1st of each month.";
        assert_eq!(redact_sensitive_data(raw), raw);
    }

    #[test]
    fn test_excerpt_truncates_on_char_boundary() {
        assert_eq!(excerpt("Ärger über Miete", 5), "Ärger…");
        assert_eq!(excerpt("short", 10), "short");
    }
}
