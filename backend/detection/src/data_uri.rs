//! Extracting image references from chat text.

use std::path::Path;

use anyhow::{Context, Result};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use once_cell::sync::Lazy;
use regex::Regex;

/// `[data:]<type>/<subtype>;base64,`; the payload follows the match.
static DATA_URI_HEAD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:data:)?([A-Za-z0-9.+-]+/[A-Za-z0-9.+-]+);base64,").unwrap());

static IMAGE_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[IMAGE\]\s*(.*?)\s*\[/IMAGE\]").unwrap());

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Chat clients are inconsistent about trailing `=` padding.
const LENIENT_CONFIG: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_CONFIG);
const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_CONFIG);

/// A base64 data URI found in message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub payload: String,
}

impl DataUri {
    /// Decode the payload. `-`/`_` select the URL-safe alphabet; mixing both
    /// alphabets is an error.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let payload: Vec<u8> = self
            .payload
            .bytes()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        let engine = if payload.iter().any(|b| matches!(b, b'-' | b'_')) {
            &LENIENT_URL_SAFE
        } else {
            &LENIENT
        };
        engine
            .decode(&payload)
            .with_context(|| format!("malformed base64 payload for {}", self.mime))
    }
}

/// Find the first base64 data URI anywhere in `text`.
///
/// A payload may be wrapped over several lines: when it runs to the end of
/// its line, following lines made only of base64 characters are appended
/// until a line is shorter than the ones before it or carries padding.
pub fn find_data_uri(text: &str) -> Option<DataUri> {
    let caps = DATA_URI_HEAD_RE.captures(text)?;
    let rest = &text[caps.get(0)?.end()..];
    Some(DataUri {
        mime: caps[1].to_string(),
        payload: collect_payload(rest),
    })
}

fn is_base64_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '-' | '_' | '=')
}

fn collect_payload(rest: &str) -> String {
    let mut lines = rest.split('\n');
    let first = lines.next().unwrap_or_default().trim_end();
    let run_len = first
        .find(|c: char| !is_base64_char(c))
        .unwrap_or(first.len());
    let mut payload = first[..run_len].to_string();

    // Something follows on the same line, or the payload is already padded.
    if run_len < first.len() || payload.is_empty() || payload.contains('=') {
        return payload;
    }

    let mut width: Option<usize> = None;
    for line in lines {
        let line = line.trim();
        if line.is_empty() || !line.chars().all(is_base64_char) {
            break;
        }
        if width.is_some_and(|w| line.len() > w) {
            break;
        }
        payload.push_str(line);
        if line.contains('=') {
            break;
        }
        match width {
            None => width = Some(line.len()),
            Some(w) if line.len() < w => break,
            Some(_) => {}
        }
    }
    payload
}

/// Inline payload form accepted by the detection API.
pub fn inline_image_uri(b64: &str) -> String {
    format!("data:image/jpeg;base64,{b64}")
}

/// Payload form referencing a previously uploaded asset.
pub fn asset_image_uri(asset_id: &str) -> String {
    format!("data:image/jpeg;asset_id,{asset_id}")
}

/// Find the file the message refers to.
///
/// Looks for an `[IMAGE]name[/IMAGE]` block, then the first token with an
/// image extension, then falls back to the whole text. Only the final path
/// component is returned.
pub fn find_file_reference(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let candidate = IMAGE_BLOCK_RE
        .captures(text)
        .map(|caps| caps[1].to_string())
        .or_else(|| {
            text.split_whitespace()
                .map(trim_token)
                .find(|token| has_image_extension(token))
                .map(str::to_string)
        })
        .unwrap_or_else(|| text.to_string());

    file_name_of(&candidate)
}

/// Final path component of a path or URL, with any query or fragment removed.
pub fn file_name_of(reference: &str) -> Option<String> {
    let reference = reference
        .split(['?', '#'])
        .next()
        .unwrap_or(reference)
        .trim();
    Path::new(reference)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn trim_token(token: &str) -> &str {
    token.trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '(' | ')' | '[' | ']' | '<' | '>' | ',' | ';' | ':' | '!' | '?'))
        .trim_end_matches('.')
}

fn has_image_extension(token: &str) -> bool {
    Path::new(token)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}
