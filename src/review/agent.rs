use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::llm::{CompletionRequest, LlmClient};
use crate::review::diff;
use crate::review::finding::Category;
use crate::review::parser::parse_response;
use crate::review::prompt;
use crate::review::report::AgentResult;

/// One review perspective over a diff.
///
/// Implementations must fold every failure into the returned
/// [`AgentResult`]; `analyze` has no error path.
#[async_trait]
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    async fn analyze(&self, diff: &str, context: Option<&str>) -> AgentResult;
}

/// Model settings shared by every prompt agent.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Overrides the client's default model.
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_diff_chars: usize,
}

/// An analyzer that prompts a language model from one category's point of view.
pub struct PromptAgent {
    category: Category,
    llm: Arc<dyn LlmClient>,
    settings: AgentSettings,
    system_prompt: String,
}

impl PromptAgent {
    pub fn new(category: Category, llm: Arc<dyn LlmClient>, settings: AgentSettings) -> Self {
        Self {
            category,
            llm,
            settings,
            system_prompt: prompt::system_prompt(category),
        }
    }
}

#[async_trait]
impl Analyzer for PromptAgent {
    fn name(&self) -> &str {
        self.category.as_str()
    }

    fn description(&self) -> &str {
        self.category.description()
    }

    async fn analyze(&self, diff_text: &str, context: Option<&str>) -> AgentResult {
        let started = Instant::now();
        let elapsed_ms = || u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        if diff_text.trim().is_empty() {
            tracing::debug!(agent = self.name(), "Empty diff, nothing to analyze");
            return AgentResult::success(self.name(), Vec::new(), None, elapsed_ms());
        }

        let files = diff::changed_files(diff_text);
        let (diff_text, truncated) = diff::truncate(diff_text, self.settings.max_diff_chars);
        if truncated {
            tracing::info!(
                agent = self.name(),
                max_chars = self.settings.max_diff_chars,
                "Diff truncated before analysis"
            );
        }

        let request = CompletionRequest {
            model: self
                .settings
                .model
                .clone()
                .unwrap_or_else(|| self.llm.default_model().to_string()),
            system: self.system_prompt.clone(),
            prompt: prompt::user_prompt(diff_text, context, truncated),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        let response = match self.llm.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(agent = self.name(), error = %e, "LLM call failed");
                return AgentResult::failed(self.name(), e.to_string(), elapsed_ms());
            }
        };

        let default_path = diff::default_location(&files);
        let parsed = parse_response(&response, self.category, &files, &default_path);

        AgentResult::success(self.name(), parsed.findings, parsed.summary, elapsed_ms())
    }
}
