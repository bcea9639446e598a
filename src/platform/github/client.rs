use async_trait::async_trait;
use base64::Engine;
use octocrab::Octocrab;

use crate::config::GitHubConfig;
use crate::error::{AppError, Result};
use crate::platform::types::PullRequestInfo;
use crate::platform::Platform;

use super::mapper;

pub struct GitHubPlatform {
    client: Octocrab,
}

impl GitHubPlatform {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(config.token.clone())
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build octocrab client: {e}")))?;

        Ok(Self { client })
    }

    fn contents_route(owner: &str, repo: &str, path: &str, git_ref: &str) -> String {
        let encoded_path = path
            .trim_start_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        format!(
            "/repos/{owner}/{repo}/contents/{encoded_path}?ref={}",
            urlencoding::encode(git_ref)
        )
    }
}

#[async_trait]
impl Platform for GitHubPlatform {
    async fn get_pull_request(&self, owner: &str, repo: &str, pr_number: u64) -> Result<PullRequestInfo> {
        let pr = self
            .client
            .pulls(owner, repo)
            .get(pr_number)
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to fetch {owner}/{repo}#{pr_number}: {e}")))?;

        Ok(mapper::map_pull_request(pr))
    }

    async fn fetch_diff(&self, owner: &str, repo: &str, pr_number: u64) -> Result<String> {
        self.client
            .pulls(owner, repo)
            .get_diff(pr_number)
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to fetch diff for {owner}/{repo}#{pr_number}: {e}")))
    }

    async fn post_comment(&self, owner: &str, repo: &str, pr_number: u64, body: &str) -> Result<()> {
        self.client
            .issues(owner, repo)
            .create_comment(pr_number, body)
            .await?;

        Ok(())
    }

    async fn get_file_content(&self, owner: &str, repo: &str, path: &str, git_ref: &str) -> Result<String> {
        let route = Self::contents_route(owner, repo, path, git_ref);
        let response: serde_json::Value = self
            .client
            .get(&route, None::<&()>)
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to fetch {path}@{git_ref}: {e}")))?;

        let encoded = response["content"]
            .as_str()
            .ok_or_else(|| AppError::GitHubApi(format!("{path} is not a file")))?;

        // The contents API wraps base64 at 60 columns
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| AppError::GitHubApi(format!("Invalid base64 content for {path}: {e}")))?;

        String::from_utf8(bytes).map_err(|_| AppError::GitHubApi(format!("{path} is not valid UTF-8")))
    }
}
