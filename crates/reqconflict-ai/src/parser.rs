//! Response parsing: raw model text into a validated `(category, reason)`.
//!
//! Parsing is total. Whatever the service returns, the category is a member of
//! [`ConflictCategory`]; unparseable or unrecognised output becomes
//! [`ConflictCategory::Other`] with the raw text kept as the reason for audit.

use reqconflict_core::ConflictCategory;
use tracing::warn;

use crate::inference::FAILURE_PREFIX;

/// Reason recorded when the service returned nothing.
pub const EMPTY_RESPONSE_REASON: &str = "Empty response from inference service";

const TYPE_LABEL: &str = "Conflict_Type:";
const REASON_LABEL: &str = "Reason:";
const FIELD_DELIMITER: &str = "||";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub category: ConflictCategory,
    pub reason: String,
}

impl ParsedResponse {
    fn new(category: ConflictCategory, reason: impl Into<String>) -> Self {
        Self {
            category,
            reason: reason.into(),
        }
    }

    fn fallback(raw: &str, problem: &str) -> Self {
        warn!(raw = %raw, "{problem}, classifying as Other");
        Self::new(ConflictCategory::Other, raw)
    }
}

/// Parse a completion into a category and reason.
///
/// Accepted shapes, tried in order:
/// 1. failure sentinel or empty text → `Other`
/// 2. `Conflict_Type: <X>||Reason: <Y>`; `<X>` must be a known label, either
///    whole or as its last `:`-separated segment
/// 3. `<X>: <Y>` split on the first colon; `<X>` must be a known label
/// 4. anything else → `Other` with the raw text as reason
pub fn parse_response(raw: &str) -> ParsedResponse {
    let text = raw.trim();

    if text.is_empty() {
        warn!("empty completion, classifying as Other");
        return ParsedResponse::new(ConflictCategory::Other, EMPTY_RESPONSE_REASON);
    }
    // Already reported by the client when the call failed.
    if text.starts_with(FAILURE_PREFIX) {
        return ParsedResponse::new(ConflictCategory::Other, raw);
    }

    if let Some((kind, reason)) = text.split_once(FIELD_DELIMITER) {
        return parse_delimited(raw, kind, reason);
    }

    if let Some((kind, reason)) = text.split_once(':')
        && let Some(category) = ConflictCategory::from_label(kind.trim())
    {
        return ParsedResponse::new(category, reason.trim());
    }

    if text.contains(':') {
        ParsedResponse::fallback(raw, "unknown category label")
    } else {
        ParsedResponse::fallback(raw, "unrecognised completion shape")
    }
}

fn parse_delimited(raw: &str, kind: &str, reason: &str) -> ParsedResponse {
    let kind = strip_label(kind, TYPE_LABEL);
    // A trailing third field (resolution suggestion) is dropped.
    let reason = reason.split(FIELD_DELIMITER).next().unwrap_or_default();
    let reason = strip_label(reason, REASON_LABEL);

    if let Some(category) = ConflictCategory::from_label(kind) {
        return ParsedResponse::new(category, reason);
    }

    // Models sometimes prefix the label, e.g. "Type: Cost Conflict".
    if let Some(last) = kind.rsplit(':').next()
        && let Some(category) = ConflictCategory::from_label(last.trim())
    {
        return ParsedResponse::new(category, reason);
    }

    ParsedResponse::fallback(raw, "unknown category label")
}

fn strip_label<'a>(field: &'a str, label: &str) -> &'a str {
    let field = field.trim();
    field.strip_prefix(label).unwrap_or(field).trim()
}
