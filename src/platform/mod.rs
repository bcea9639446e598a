pub mod github;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::PullRequestInfo;

#[async_trait]
pub trait Platform: Send + Sync {
    /// Fetch pull request metadata.
    async fn get_pull_request(&self, owner: &str, repo: &str, pr_number: u64) -> Result<PullRequestInfo>;

    /// Fetch the pull request's changes as one unified diff.
    async fn fetch_diff(&self, owner: &str, repo: &str, pr_number: u64) -> Result<String>;

    /// Post a comment on the pull request conversation.
    async fn post_comment(&self, owner: &str, repo: &str, pr_number: u64, body: &str) -> Result<()>;

    /// Fetch a file's text at a given ref.
    async fn get_file_content(&self, owner: &str, repo: &str, path: &str, git_ref: &str) -> Result<String>;
}
