//! Log Redaction Layer
//!
//! Scrubs API keys, bearer tokens, and inline image payloads from strings
//! prior to logging.

use regex::Regex;
use std::sync::LazyLock;

static NVAPI_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"nvapi-[A-Za-z0-9_\-]{8,}").unwrap());
static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9\-\._~+/]+=*").unwrap());
static DATA_URI_PAYLOAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(;base64,)([A-Za-z0-9+/=]{16})[A-Za-z0-9+/=]*").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = NVAPI_KEY_RE.replace_all(input, "[REDACTED_KEY]");
    let redacted = BEARER_RE.replace_all(&redacted, "[REDACTED_TOKEN]");

    // Keep a short prefix of base64 payloads so log lines stay readable
    DATA_URI_PAYLOAD_RE
        .replace_all(&redacted, "${1}${2}...[TRUNCATED]")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redaction() {
        let raw = "calling with Bearer nvapi-AbCdEf0123456789xyz";
        let clean = redact_sensitive_data(raw);
        assert!(!clean.contains("nvapi-AbCdEf0123456789xyz"));
        assert!(clean.contains("[REDACTED"));
    }

    #[test]
    fn truncates_inline_payloads() {
        let payload = "A".repeat(4096);
        let raw = format!("data:image/jpeg;base64,{payload}");
        let clean = redact_sensitive_data(&raw);
        assert_eq!(
            clean,
            "data:image/jpeg;base64,AAAAAAAAAAAAAAAA...[TRUNCATED]"
        );
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(redact_sensitive_data("cat.jpg"), "cat.jpg");
    }
}
