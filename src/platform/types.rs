use serde::{Deserialize, Serialize};

/// Pull request metadata used to build agent context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestInfo {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub author: String,
    pub state: String,
    pub head_sha: String,
    pub head_branch: String,
    pub base_branch: String,
    pub additions: u64,
    pub deletions: u64,
    pub changed_files: u64,
    pub html_url: Option<String>,
}

/// A window of source lines around the line a finding points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeContext {
    pub file_path: String,
    pub target_line_number: u32,
    pub target_line: String,
    pub start_line: u32,
    pub end_line: u32,
    pub snippet: String,
}

impl CodeContext {
    /// Cut `context_lines` lines either side of `line` (1-based) out of `source`.
    ///
    /// Returns `None` when the line is outside the file.
    pub fn from_source(file_path: &str, source: &str, line: u32, context_lines: u32) -> Option<Self> {
        let lines: Vec<&str> = source.lines().collect();
        let target_idx = usize::try_from(line).ok()?.checked_sub(1)?;
        let target_line = lines.get(target_idx)?;

        let radius = usize::try_from(context_lines).unwrap_or(usize::MAX);
        let start_idx = target_idx.saturating_sub(radius);
        let end_idx = target_idx.saturating_add(radius).min(lines.len() - 1);

        Some(Self {
            file_path: file_path.to_string(),
            target_line_number: line,
            target_line: (*target_line).to_string(),
            start_line: u32::try_from(start_idx + 1).ok()?,
            end_line: u32::try_from(end_idx + 1).ok()?,
            snippet: lines[start_idx..=end_idx].join("\n"),
        })
    }
}
