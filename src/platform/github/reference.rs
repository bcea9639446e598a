//! Parsing of pull request references as users type them.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{AppError, Result};

static PR_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?github\.com/([\w.-]+)/([\w.-]+)/pull/(\d+)")
        .expect("PR URL pattern is valid")
});

static SHORT_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w.-]+)/([\w.-]+)[/#](\d+)$").expect("short reference pattern is valid")
});

/// An `owner/repo#number` pull request coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrReference {
    pub owner: String,
    pub repo: String,
    pub number: u64,
    pub url: String,
}

impl PrReference {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        let owner = owner.into();
        let repo = repo.into();
        let url = format!("https://github.com/{owner}/{repo}/pull/{number}");
        Self {
            owner,
            repo,
            number,
            url,
        }
    }
}

impl std::fmt::Display for PrReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// Parse a full PR URL, `owner/repo/123` or `owner/repo#123`.
/// A URL pasted together with surrounding text is accepted too.
pub fn parse_pr_reference(input: &str) -> Result<PrReference> {
    let input = input.trim();

    if let Some(caps) = PR_URL.captures(input) {
        parse_number(&caps[3])?;
        return extract_pr_reference(input).ok_or_else(|| {
            AppError::InvalidRequest(format!("Could not parse PR reference '{input}'"))
        });
    }

    if let Some(caps) = SHORT_REF.captures(input) {
        let number = parse_number(&caps[3])?;
        return Ok(PrReference::new(&caps[1], &caps[2], number));
    }

    if !input.is_empty() && input.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidRequest(
            "Please provide the full GitHub PR URL (e.g. https://github.com/owner/repo/pull/123) \
             or use the format 'owner/repo/123'"
                .to_string(),
        ));
    }

    Err(AppError::InvalidRequest(format!(
        "Could not parse PR reference '{input}'. Expected https://github.com/owner/repo/pull/123 or owner/repo/123"
    )))
}

/// Find the first PR URL mentioned anywhere in free text.
pub fn extract_pr_reference(text: &str) -> Option<PrReference> {
    let caps = PR_URL.captures(text)?;
    let number = caps[3].parse().ok()?;
    let whole = caps.get(0)?;
    // Keep any trailing fragment or query so the URL stays clickable.
    let url_end = text[whole.end()..]
        .find(char::is_whitespace)
        .map_or(text.len(), |offset| whole.end() + offset);

    Some(PrReference {
        owner: caps[1].to_string(),
        repo: caps[2].to_string(),
        number,
        url: text[whole.start()..url_end].to_string(),
    })
}

fn parse_number(raw: &str) -> Result<u64> {
    raw.parse()
        .map_err(|_| AppError::InvalidRequest(format!("Invalid pull request number: {raw}")))
}
