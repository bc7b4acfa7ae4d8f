//! Human-readable verdicts.

use hivecheck_core::ClassificationResult;
use indexmap::IndexMap;

/// Source name the detector uses when no generator matched.
const NO_SOURCE: &str = "none";

/// The source with the highest confidence.
///
/// Uses a strict comparison, so on ties the first entry in response order wins.
pub fn top_source(sources: &IndexMap<String, f64>) -> Option<(&str, f64)> {
    let mut best: Option<(&str, f64)> = None;
    for (name, &confidence) in sources {
        if best.is_none_or(|(_, top)| confidence > top) {
            best = Some((name.as_str(), confidence));
        }
    }
    best
}

/// Format a classification for the chat.
pub fn summarize(result: &ClassificationResult) -> String {
    let mut lines = vec![
        "AI-generated image analysis".to_string(),
        format!(
            "Probability of AI generation: {:.2}%",
            result.is_ai_generated * 100.0
        ),
    ];

    match top_source(&result.possible_sources) {
        Some((name, confidence)) if name != NO_SOURCE => lines.push(format!(
            "Most likely source: {} ({:.2}% confidence)",
            name,
            confidence * 100.0
        )),
        _ => lines.push("No specific AI source identified".to_string()),
    }

    lines.join("\n")
}
