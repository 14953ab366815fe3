//! URL detection.
//!
//! Pattern-based on purpose: anything that looks like a link is treated as one,
//! including domain-like prose such as `end.me`.

use std::sync::OnceLock;

use regex::Regex;

/// Top-level domains recognized on bare `name.tld` tokens.
pub const TLD_ALLOW_LIST: &[&str] = &[
    "com", "net", "org", "io", "co", "xyz", "me", "info", "ru", "biz", "online", "site",
];

fn url_regex() -> &'static Regex {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    URL_RE.get_or_init(|| {
        let tlds = TLD_ALLOW_LIST.join("|");
        Regex::new(&format!(r"(?i)https?://\S+|www\.\S+|\S+\.({tlds})\b")).expect("valid regex")
    })
}

/// Returns true if `text` contains a URL-like token.
pub fn contains_url(text: Option<&str>) -> bool {
    match text {
        Some(t) => text_contains_url(t),
        None => false,
    }
}

pub fn text_contains_url(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    url_regex().is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_scheme_prefixed_links() {
        assert!(text_contains_url("see https://example.org/path"));
        assert!(text_contains_url("http://10.0.0.1:8080"));
        assert!(text_contains_url("HTTPS://LOUD.EXAMPLE"));
    }

    #[test]
    fn detects_www_prefix() {
        assert!(text_contains_url("go to www.somewhere"));
        assert!(text_contains_url("WWW.Example"));
    }

    #[test]
    fn detects_bare_domains_with_allowed_tld() {
        assert!(text_contains_url("buy at shop.com now"));
        assert!(text_contains_url("Mirror: files.XYZ"));
        assert!(text_contains_url("join chat.online"));
        assert!(text_contains_url("ping me at a.b.ru."));
    }

    #[test]
    fn ignores_unlisted_tlds_and_word_continuations() {
        assert!(!text_contains_url("config.toml is fine"));
        assert!(!text_contains_url("see file.common"));
        assert!(!text_contains_url("ends with .com"));
    }

    #[test]
    fn domain_like_prose_is_treated_as_a_link() {
        assert!(text_contains_url("that was the end.Me too"));
    }

    #[test]
    fn empty_or_absent_text_is_clean() {
        assert!(!contains_url(None));
        assert!(!contains_url(Some("")));
        assert!(!contains_url(Some("   \n\t")));
        assert!(!contains_url(Some("hello world")));
    }
}
