//! Tolerant parsing of free-form model output into findings.
//!
//! Models are asked for JSON but do not always comply, so the parser tries a
//! fixed sequence of shapes and never fails:
//!
//! 1. JSON: an object with an `issues` (or `findings`) array, or a bare array
//!    of issues, optionally wrapped in a markdown fence or surrounded by prose.
//! 2. Tagged lines: `- [HIGH] src/db.rs:42 - message`, `2. **Critical**: message`,
//!    `MEDIUM: message` and similar, one finding per line.
//! 3. An empty reply or one that says there are no issues: zero findings.
//! 4. Anything else: the whole reply as a single `info` finding.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::review::finding::{Category, Finding, Severity};

static TAGGED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:[-*•]|\d+[.)])?\s*(?:\[(?P<bracket>[a-z]+)\]|\*\*(?P<bold>[a-z]+)\*\*|\((?P<paren>[a-z]+)\)|(?P<bare>[a-z]+)\s*:)\s*[:\-–]?\s*(?P<rest>.+)$",
    )
    .expect("tagged line pattern is valid")
});

static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<tick>`)?(?P<path>[\w\-./]+\.[A-Za-z0-9]+)`?(?::(?P<line>\d+))?\s*(?:-|–|:)\s+(?P<message>.+)$",
    )
    .expect("location pattern is valid")
});

static SUGGESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+(?:fix|suggestion|recommendation):\s*(?P<fix>.+)$")
        .expect("suggestion pattern is valid")
});

const NO_ISSUE_PHRASES: [&str; 4] = ["no issues found", "no issues", "lgtm", "looks good to me"];

/// Findings plus the model's own summary, when it gave one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    pub findings: Vec<Finding>,
    pub summary: Option<String>,
}

/// Parse a model reply.
///
/// `touched` lists the files the reviewed diff changes; `default_path` is used
/// for findings that name no file.
pub fn parse_response(raw: &str, category: Category, touched: &[String], default_path: &str) -> ParsedResponse {
    match parse_json(raw, category, default_path) {
        Ok(parsed) => return parsed,
        Err(e) => tracing::debug!(category = %category, error = %e, "No JSON review in response"),
    }

    let findings = parse_tagged_lines(raw, category, touched, default_path);
    if !findings.is_empty() {
        return ParsedResponse {
            findings,
            summary: None,
        };
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() || says_no_issues(trimmed) {
        return ParsedResponse {
            findings: Vec::new(),
            summary: (!trimmed.is_empty()).then(|| trimmed.to_string()),
        };
    }

    tracing::debug!(category = %category, "Unstructured response, keeping it as one info finding");
    ParsedResponse {
        findings: vec![Finding::new(category, Severity::Info, default_path, trimmed)],
        summary: None,
    }
}

fn parse_json(raw: &str, category: Category, default_path: &str) -> Result<ParsedResponse> {
    let value = extract_json(raw)?;

    let (issues, summary) = match value {
        Value::Array(items) => (items, None),
        Value::Object(mut map) => {
            let issues = match map.remove("issues").or_else(|| map.remove("findings")) {
                Some(Value::Array(items)) => items,
                Some(Value::Null) => Vec::new(),
                Some(other) => {
                    return Err(AppError::Parse(format!(
                        "`issues` is not an array: {other}"
                    )))
                }
                None => return Err(AppError::Parse("object has no `issues` field".to_string())),
            };
            let summary = map
                .get("summary")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            (issues, summary)
        }
        other => return Err(AppError::Parse(format!("unexpected JSON value: {other}"))),
    };

    let findings = issues
        .iter()
        .filter_map(|issue| finding_from_json(issue, category, default_path))
        .collect();

    Ok(ParsedResponse { findings, summary })
}

/// Locate a JSON document in the reply: whole text, fenced block, or the
/// outermost brace/bracket span.
fn extract_json(raw: &str) -> Result<Value> {
    let mut candidates: Vec<&str> = vec![raw.trim()];
    if let Some(fenced) = fenced_block(raw) {
        candidates.push(fenced);
    }
    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (raw.find(open), raw.rfind(close)) {
            if start < end {
                candidates.push(&raw[start..=end]);
            }
        }
    }

    candidates
        .into_iter()
        .filter(|c| c.starts_with('{') || c.starts_with('['))
        .find_map(|c| serde_json::from_str::<Value>(c).ok())
        .ok_or_else(|| AppError::Parse("no JSON document found".to_string()))
}

fn fenced_block(raw: &str) -> Option<&str> {
    let start = raw.find("```")?;
    let after_fence = &raw[start + 3..];
    // Skip the language tag line.
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

fn finding_from_json(issue: &Value, category: Category, default_path: &str) -> Option<Finding> {
    if let Some(text) = issue.as_str() {
        let text = text.trim();
        return (!text.is_empty())
            .then(|| Finding::new(category, Severity::Info, default_path, text));
    }

    let title = str_field(issue, &["title", "summary"]);
    let description = str_field(issue, &["description", "message", "issue", "details"]);
    let message = match (title, description) {
        (Some(t), Some(d)) => format!("{t}: {d}"),
        (Some(m), None) | (None, Some(m)) => m,
        (None, None) => return None,
    };

    let severity = str_field(issue, &["severity", "level"])
        .map(|s| Severity::from_label_lossy(&s))
        .unwrap_or(Severity::Info);
    let file = str_field(issue, &["file", "file_path", "path", "filename"])
        .unwrap_or_else(|| default_path.to_string());

    Some(
        Finding::new(category, severity, file, message)
            .with_line(line_field(issue))
            .with_suggested_fix(str_field(issue, &["suggestion", "suggested_fix", "recommendation", "fix"]))
            .with_suggested_code(str_field(issue, &["suggested_code", "code"])),
    )
}

fn str_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| value.get(*k))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn line_field(value: &Value) -> Option<u32> {
    let line = value.get("line").or_else(|| value.get("line_number"))?;
    match line {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        // "42" or "42-45": take the first number
        Value::String(s) => s
            .trim()
            .split(|c: char| !c.is_ascii_digit())
            .find(|part| !part.is_empty())
            .and_then(|part| part.parse().ok()),
        _ => None,
    }
}

/// Only an opening verdict counts; "otherwise no issues" after a real
/// observation must not swallow it.
fn says_no_issues(text: &str) -> bool {
    let opening = text
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    NO_ISSUE_PHRASES.iter().any(|p| opening.starts_with(p))
}

fn parse_tagged_lines(raw: &str, category: Category, touched: &[String], default_path: &str) -> Vec<Finding> {
    raw.lines()
        .filter_map(|line| {
            let caps = TAGGED_LINE.captures(line)?;
            let label = ["bracket", "bold", "paren", "bare"]
                .iter()
                .find_map(|name| caps.name(name))?;
            let severity = Severity::from_label(label.as_str())?;
            let rest = caps.name("rest")?.as_str().trim();
            Some(tagged_finding(rest, severity, category, touched, default_path))
        })
        .collect()
}

fn tagged_finding(
    rest: &str,
    severity: Severity,
    category: Category,
    touched: &[String],
    default_path: &str,
) -> Finding {
    let location = LOCATION.captures(rest).and_then(|caps| {
        let line = caps.name("line").and_then(|l| l.as_str().parse().ok());
        let path = resolve_path(&caps["path"], caps.name("tick").is_some() || line.is_some(), touched)?;
        Some((path, line, caps["message"].to_string()))
    });
    let (path, line, message) =
        location.unwrap_or_else(|| (default_path.to_string(), None, rest.to_string()));

    let (message, fix) = match SUGGESTION.captures(&message) {
        Some(caps) => {
            let whole = caps.get(0).map_or(message.len(), |m| m.start());
            (message[..whole].trim().to_string(), Some(caps["fix"].trim().to_string()))
        }
        None => (message.trim().to_string(), None),
    };

    Finding::new(category, severity, path, message)
        .with_line(line)
        .with_suggested_fix(fix)
}

/// Accept a leading `path` only if it is a file the diff touches, or the model
/// marked it as one with backticks or a `:line` suffix. Bare `self.count - 1`
/// is prose.
fn resolve_path(candidate: &str, marked: bool, touched: &[String]) -> Option<String> {
    let suffix = format!("/{candidate}");
    if let Some(file) = touched
        .iter()
        .find(|f| f.as_str() == candidate || f.ends_with(&suffix))
    {
        return Some(file.clone());
    }
    marked.then(|| candidate.to_string())
}
