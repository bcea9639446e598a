use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::service::{DiffReview, PullRequestReview, ReviewTarget};

#[derive(Debug, Deserialize)]
pub struct ReviewPrRequest {
    pub pr_url: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub pr_number: Option<u64>,
    #[serde(alias = "analysis_types")]
    pub agents: Option<Vec<String>>,
    pub custom_instructions: Option<String>,
    #[serde(default)]
    pub post_comments: bool,
}

impl TryFrom<ReviewPrRequest> for PullRequestReview {
    type Error = AppError;

    fn try_from(req: ReviewPrRequest) -> Result<Self> {
        let target = match (req.pr_url, req.owner, req.repo, req.pr_number) {
            (Some(url), _, _, _) if !url.trim().is_empty() => ReviewTarget::Reference(url),
            (_, Some(owner), Some(repo), Some(number)) => ReviewTarget::Coordinates { owner, repo, number },
            _ => {
                return Err(AppError::InvalidRequest(
                    "Provide pr_url, or owner, repo and pr_number".to_string(),
                ))
            }
        };

        Ok(PullRequestReview {
            target,
            agents: req.agents,
            custom_instructions: req.custom_instructions,
            post_comments: req.post_comments,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ReviewDiffRequest {
    #[serde(alias = "code_diff")]
    pub diff: String,
    pub file_path: Option<String>,
    pub pr_title: Option<String>,
    pub pr_description: Option<String>,
    pub context: Option<String>,
    #[serde(alias = "analysis_types")]
    pub agents: Option<Vec<String>>,
}

impl From<ReviewDiffRequest> for DiffReview {
    fn from(req: ReviewDiffRequest) -> Self {
        DiffReview {
            diff: req.diff,
            file_path: req.file_path,
            title: req.pr_title,
            description: req.pr_description,
            context: req.context,
            agents: req.agents,
        }
    }
}
