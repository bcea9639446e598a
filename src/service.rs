use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::platform::github::{parse_pr_reference, PrReference};
use crate::platform::types::{CodeContext, PullRequestInfo};
use crate::platform::Platform;
use crate::review::diff::{with_file_header, UNLOCATED};
use crate::review::{Orchestrator, PrIdentifier, ReviewReport};

/// How the caller named the pull request.
#[derive(Debug, Clone)]
pub enum ReviewTarget {
    Reference(String),
    Coordinates { owner: String, repo: String, number: u64 },
}

impl ReviewTarget {
    pub fn resolve(&self) -> Result<PrReference> {
        match self {
            ReviewTarget::Reference(input) => parse_pr_reference(input),
            ReviewTarget::Coordinates { owner, repo, number } => {
                if owner.trim().is_empty() || repo.trim().is_empty() || *number == 0 {
                    return Err(AppError::InvalidRequest(
                        "owner, repo and a positive pr_number are required".to_string(),
                    ));
                }
                Ok(PrReference::new(owner.trim(), repo.trim(), *number))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PullRequestReview {
    pub target: ReviewTarget,
    pub agents: Option<Vec<String>>,
    pub custom_instructions: Option<String>,
    pub post_comments: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DiffReview {
    pub diff: String,
    pub file_path: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub context: Option<String>,
    pub agents: Option<Vec<String>>,
}

/// Whether the rendered report made it onto the pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentStatus {
    pub posted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewResponse {
    #[serde(flatten)]
    pub report: ReviewReport,
    pub code_context: Vec<CodeContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<CommentStatus>,
}

/// Ties the code host to the orchestrator for one review request.
pub struct ReviewService {
    platform: Arc<dyn Platform>,
    orchestrator: Orchestrator,
    context_lines: u32,
}

impl ReviewService {
    pub fn new(platform: Arc<dyn Platform>, orchestrator: Orchestrator, context_lines: u32) -> Self {
        Self {
            platform,
            orchestrator,
            context_lines,
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub async fn review_pull_request(&self, request: PullRequestReview) -> Result<ReviewResponse> {
        let pr_ref = request.target.resolve()?;
        let (owner, repo, number) = (pr_ref.owner.as_str(), pr_ref.repo.as_str(), pr_ref.number);

        tracing::info!(
            pr = %pr_ref,
            url = %pr_ref.url,
            post_comments = request.post_comments,
            "Reviewing pull request"
        );

        let (pr, diff) = tokio::try_join!(
            self.platform.get_pull_request(owner, repo, number),
            self.platform.fetch_diff(owner, repo, number),
        )?;

        let context = pr_context(&pr, request.custom_instructions.as_deref());
        let report = self
            .orchestrator
            .run_review(
                PrIdentifier::pull_request(owner, repo, number),
                &diff,
                Some(&context),
                request.agents.as_deref(),
            )
            .await?;

        let code_context = self.code_context(&pr_ref, &pr.head_sha, &report).await;

        let comment = if request.post_comments {
            Some(self.post_report(&pr_ref, &report).await)
        } else {
            None
        };

        Ok(ReviewResponse {
            report,
            code_context,
            comment,
        })
    }

    pub async fn review_diff(&self, request: DiffReview) -> Result<ReviewResponse> {
        let file_path = non_blank(request.file_path.as_deref());
        let tag = file_path.unwrap_or("manual").to_string();
        // A bare snippet belongs to the named file.
        let diff = match file_path {
            Some(path) => with_file_header(&request.diff, path),
            None => Cow::Borrowed(request.diff.as_str()),
        };

        tracing::info!(review = %tag, diff_bytes = diff.len(), "Reviewing diff");

        let mut sections = Vec::new();
        if let Some(title) = non_blank(request.title.as_deref()) {
            sections.push(format!("PR Title: {title}"));
        }
        if let Some(description) = non_blank(request.description.as_deref()) {
            sections.push(format!("PR Description:\n{description}"));
        }
        if let Some(context) = non_blank(request.context.as_deref()) {
            sections.push(context.to_string());
        }
        let context = (!sections.is_empty()).then(|| sections.join("\n\n"));

        let report = self
            .orchestrator
            .run_review(
                PrIdentifier::adhoc(tag),
                &diff,
                context.as_deref(),
                request.agents.as_deref(),
            )
            .await?;

        Ok(ReviewResponse {
            report,
            code_context: Vec::new(),
            comment: None,
        })
    }

    /// Source windows around every located finding, one fetch per file.
    /// Files that cannot be fetched are skipped.
    async fn code_context(&self, pr_ref: &PrReference, head_sha: &str, report: &ReviewReport) -> Vec<CodeContext> {
        let mut wanted: BTreeMap<&str, BTreeSet<u32>> = BTreeMap::new();
        for finding in report.findings() {
            if let Some(line) = finding.line_hint() {
                if finding.file_path() != UNLOCATED {
                    wanted.entry(finding.file_path()).or_default().insert(line);
                }
            }
        }

        if wanted.is_empty() || head_sha.is_empty() {
            return Vec::new();
        }

        let fetches = wanted.keys().map(|path| {
            self.platform
                .get_file_content(&pr_ref.owner, &pr_ref.repo, path, head_sha)
        });
        let sources = join_all(fetches).await;

        let mut contexts = Vec::new();
        for ((path, lines), source) in wanted.iter().zip(sources) {
            let source = match source {
                Ok(source) => source,
                Err(e) => {
                    tracing::warn!(pr = %pr_ref, file = %path, error = %e, "Could not fetch file for code context");
                    continue;
                }
            };
            contexts.extend(
                lines
                    .iter()
                    .filter_map(|line| CodeContext::from_source(path, &source, *line, self.context_lines)),
            );
        }
        contexts
    }

    async fn post_report(&self, pr_ref: &PrReference, report: &ReviewReport) -> CommentStatus {
        let body = report.to_markdown();
        match self
            .platform
            .post_comment(&pr_ref.owner, &pr_ref.repo, pr_ref.number, &body)
            .await
        {
            Ok(()) => {
                tracing::info!(pr = %pr_ref, "Posted review comment");
                CommentStatus {
                    posted: true,
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!(pr = %pr_ref, error = %e, "Failed to post review comment");
                CommentStatus {
                    posted: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn pr_context(pr: &PullRequestInfo, custom_instructions: Option<&str>) -> String {
    let description = non_blank(Some(&pr.body)).unwrap_or("No description provided");
    let mut context = format!(
        "PR Title: {}\nAuthor: {}\nBranch: {} -> {}\n\nPR Description:\n{description}",
        pr.title, pr.author, pr.head_branch, pr.base_branch
    );
    if let Some(instructions) = non_blank(custom_instructions) {
        context.push_str("\n\nAdditional Instructions:\n");
        context.push_str(instructions);
    }
    context
}
