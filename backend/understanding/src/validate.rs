//! Lease text validation.
//!
//! A cheap, advisory check that recovered text plausibly is a lease before
//! spending model calls on it. Callers decide what to do with a rejection.

/// Texts shorter than this (after trimming) are rejected outright.
pub const MIN_TEXT_CHARS: usize = 50;

/// Distinct keywords required for acceptance.
pub const MIN_KEYWORD_HITS: usize = 2;

pub const LEASE_KEYWORDS: &[&str] = &[
    "lease",
    "tenant",
    "landlord",
    "rent",
    "property",
    "agreement",
    "monthly",
    "deposit",
    "premises",
];

/// Keywords from [`LEASE_KEYWORDS`] found in `text`, case-insensitively, in list order.
pub fn keyword_hits(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    LEASE_KEYWORDS
        .iter()
        .copied()
        .filter(|kw| lowered.contains(kw))
        .collect()
}

/// Whether `text` looks like a lease document.
pub fn looks_like_lease(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_TEXT_CHARS {
        return false;
    }
    keyword_hits(trimmed).len() >= MIN_KEYWORD_HITS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_rejected() {
        assert!(!looks_like_lease("lease tenant rent"));
        assert!(!looks_like_lease("   "));
    }

    #[test]
    fn test_keywords_padded_to_length_accepted() {
        let text = format!("lease tenant rent {}", "x".repeat(40));
        assert!(looks_like_lease(&text));
    }

    #[test]
    fn test_single_keyword_rejected() {
        let text = format!("This rent receipt is for March. {}", "Thank you. ".repeat(5));
        assert_eq!(keyword_hits(&text), vec!["rent"]);
        assert!(!looks_like_lease(&text));
    }

    #[test]
    fn test_case_insensitive_substrings() {
        let text = "THE LANDLORD AND THE TENANTS ENTER INTO THIS RESIDENTIAL AGREEMENT TODAY.";
        assert_eq!(keyword_hits(text), vec!["tenant", "landlord", "agreement"]);
        assert!(looks_like_lease(text));
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        let text = format!("{} and more filler words here", "rent rent rent rent ".repeat(3));
        assert!(!looks_like_lease(&text));
    }

    #[test]
    fn test_empty_text_rejected() {
        assert!(!looks_like_lease(""));
        assert!(keyword_hits("").is_empty());
    }

    #[test]
    fn test_long_text_without_keywords_rejected() {
        let text = "The quick brown fox jumps over the lazy dog near a big oaks.";
        assert_eq!(text.chars().count(), 60);
        assert!(keyword_hits(text).is_empty());
        assert!(!looks_like_lease(text));
    }
}
