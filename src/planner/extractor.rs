//! Plan extraction from translator text
//!
//! Translator output is untrusted: the plan may sit in a fenced code block,
//! be wrapped in prose, or be bare JSON. Candidates are tried in priority
//! order and the first one that parses to an object wins.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::domain::errors::DomainError;
use crate::domain::model::{EditPlan, Segment};
use crate::utils::path::truncate_head;

/// Longest snippet carried by a `MalformedPlan` error
pub const SNIPPET_LIMIT: usize = 200;

const FENCED_JSON: &str = r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```";

fn fenced_json() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(FENCED_JSON).ok()).as_ref()
}

/// Extracts an edit plan from free-form text
pub struct PlanExtractor;

impl PlanExtractor {
    /// Parse the plan embedded in `text`
    pub fn extract(text: &str) -> Result<EditPlan, DomainError> {
        let object = Self::candidates(text)
            .into_iter()
            .find_map(|candidate| match serde_json::from_str::<Value>(&collapse_lines(&candidate)) {
                Ok(value @ Value::Object(_)) => Some(value),
                Ok(_) => None,
                Err(err) => {
                    debug!("Plan candidate rejected: {}", err);
                    None
                }
            })
            .ok_or_else(|| DomainError::MalformedPlan {
                snippet: truncate_head(text.trim(), SNIPPET_LIMIT),
            })?;

        Self::plan_from_value(object, text)
    }

    /// Candidate JSON spans in priority order
    pub fn candidates(text: &str) -> Vec<String> {
        let mut candidates = Vec::new();

        if let Some(captures) = fenced_json().and_then(|re| re.captures(text)) {
            if let Some(body) = captures.get(1) {
                candidates.push(body.as_str().to_string());
            }
        }

        if let (Some(first), Some(last)) = (text.find('{'), text.rfind('}')) {
            if first < last {
                candidates.push(text[first..=last].to_string());
            }
        }

        let mut spans = balanced_spans(text);
        spans.sort_by_key(|span| std::cmp::Reverse(span.len()));
        candidates.extend(spans.into_iter().map(str::to_string));

        candidates.dedup();
        candidates
    }

    fn plan_from_value(value: Value, text: &str) -> Result<EditPlan, DomainError> {
        let entries = match value.get("parts").or_else(|| value.get("segments")) {
            Some(Value::Array(entries)) if !entries.is_empty() => entries.clone(),
            _ => return Err(DomainError::EmptyPlan),
        };

        let parts: Vec<Segment> =
            serde_json::from_value(Value::Array(entries)).map_err(|err| {
                debug!("Plan entries rejected: {}", err);
                DomainError::MalformedPlan {
                    snippet: truncate_head(text.trim(), SNIPPET_LIMIT),
                }
            })?;

        Ok(EditPlan::new(parts))
    }
}

/// Replace embedded line breaks with spaces
fn collapse_lines(candidate: &str) -> String {
    candidate.replace(['\r', '\n'], " ")
}

/// Top-level brace-delimited spans, ignoring braces inside strings
fn balanced_spans(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    if let Some(s) = start.take() {
                        spans.push(&text[s..=i]);
                    }
                }
            }
            _ => {}
        }
    }

    spans
}
