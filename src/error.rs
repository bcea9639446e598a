use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("LLM API error: {0}")]
    LlmApi(String),

    #[error("LLM API rate limited: {0}")]
    LlmRateLimited(String),

    #[error("LLM request timed out: {0}")]
    LlmTimeout(String),

    #[error("Malformed LLM response: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures of a network-dependent collaborator (LLM provider or GitHub).
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::GitHubApi(_)
                | AppError::LlmApi(_)
                | AppError::LlmRateLimited(_)
                | AppError::LlmTimeout(_)
                | AppError::Http(_)
        )
    }
}

impl From<octocrab::Error> for AppError {
    fn from(e: octocrab::Error) -> Self {
        AppError::GitHubApi(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
