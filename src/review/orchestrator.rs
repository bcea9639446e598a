use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::llm::LlmClient;
use crate::review::agent::{AgentSettings, Analyzer, PromptAgent};
use crate::review::diff::drop_unreviewable;
use crate::review::report::{AgentResult, PrIdentifier, ReviewReport};

/// The set of analyzers a review can dispatch to. Built once at startup.
#[derive(Clone)]
pub struct AgentRegistry {
    agents: Vec<Arc<dyn Analyzer>>,
}

impl AgentRegistry {
    pub fn new(agents: Vec<Arc<dyn Analyzer>>) -> Result<Self> {
        let mut seen: Vec<String> = Vec::new();
        for agent in &agents {
            let key = normalize(agent.name());
            if seen.contains(&key) {
                return Err(AppError::Config(format!(
                    "Agent registered twice: {}",
                    agent.name()
                )));
            }
            seen.push(key);
        }
        Ok(Self { agents })
    }

    /// One prompt agent per enabled category, sharing one LLM client.
    pub fn from_config(config: &AppConfig, llm: Arc<dyn LlmClient>) -> Self {
        let settings = AgentSettings {
            model: None,
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            max_diff_chars: config.review.max_diff_chars,
        };

        let agents = config
            .enabled_categories()
            .into_iter()
            .map(|category| {
                Arc::new(PromptAgent::new(category, Arc::clone(&llm), settings.clone()))
                    as Arc<dyn Analyzer>
            })
            .collect();

        Self { agents }
    }

    pub fn names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name().to_string()).collect()
    }

    /// Resolve a caller's agent selection. `None` or an empty list means all
    /// agents; names match case-insensitively and repeats are collapsed.
    pub fn select(&self, selection: Option<&[String]>) -> Result<Vec<Arc<dyn Analyzer>>> {
        let requested = match selection {
            Some(names) if !names.is_empty() => names,
            _ => return Ok(self.agents.clone()),
        };

        let mut selected: Vec<Arc<dyn Analyzer>> = Vec::new();
        let mut unknown: Vec<&str> = Vec::new();

        for name in requested {
            let key = normalize(name);
            match self.agents.iter().find(|a| normalize(a.name()) == key) {
                Some(agent) => {
                    if !selected.iter().any(|s| normalize(s.name()) == key) {
                        selected.push(Arc::clone(agent));
                    }
                }
                None => unknown.push(name),
            }
        }

        if !unknown.is_empty() {
            return Err(AppError::InvalidRequest(format!(
                "Invalid agent names: {}. Valid agents: {}",
                unknown.join(", "),
                self.names().join(", ")
            )));
        }

        Ok(selected)
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('-', "_")
}

/// Aborts still-running agent tasks if the review is dropped before the join.
struct AbortOnDrop(Vec<AbortHandle>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        for handle in &self.0 {
            handle.abort();
        }
    }
}

/// Fans a diff out to every selected agent and folds the results into a report.
pub struct Orchestrator {
    registry: AgentRegistry,
    request_timeout: Duration,
}

impl Orchestrator {
    pub fn new(registry: AgentRegistry, request_timeout: Duration) -> Self {
        Self {
            registry,
            request_timeout,
        }
    }

    pub fn agent_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// `(name, description)` for every registered agent.
    pub fn descriptions(&self) -> Vec<(String, String)> {
        self.registry
            .agents
            .iter()
            .map(|a| (a.name().to_string(), a.description().to_string()))
            .collect()
    }

    /// Run one review.
    ///
    /// Lockfile, vendored and asset sections are dropped from the diff first.
    /// Every selected agent runs in its own task. Agent failures, panics and
    /// agents still running at the request deadline are recorded as failed
    /// results; the only error is an invalid agent selection.
    pub async fn run_review(
        &self,
        target: PrIdentifier,
        diff: &str,
        context: Option<&str>,
        selection: Option<&[String]>,
    ) -> Result<ReviewReport> {
        let agents = self.registry.select(selection)?;
        let started = Instant::now();
        let deadline = started + self.request_timeout;
        let timeout_secs = self.request_timeout.as_secs_f64();

        let filtered = drop_unreviewable(diff);
        if !filtered.skipped.is_empty() {
            tracing::info!(review = %target, skipped = ?filtered.skipped, "Skipping non-code files");
        }
        if filtered.text.trim().is_empty() && !diff.trim().is_empty() {
            tracing::info!(review = %target, "No code files to review");
        }

        tracing::info!(
            review = %target,
            agents = agents.len(),
            diff_bytes = filtered.text.len(),
            "Dispatching review"
        );

        let diff: Arc<str> = Arc::from(filtered.text);
        let context: Option<Arc<str>> = context.map(Arc::from);

        let mut names = Vec::with_capacity(agents.len());
        let mut handles = Vec::with_capacity(agents.len());

        for agent in agents {
            let name = agent.name().to_string();
            let diff = Arc::clone(&diff);
            let context = context.clone();
            let task_name = name.clone();

            let handle = tokio::spawn(async move {
                let agent_started = Instant::now();
                tracing::debug!(agent = %task_name, "Agent running");

                match tokio::time::timeout_at(deadline, agent.analyze(&diff, context.as_deref())).await {
                    Ok(result) => result,
                    Err(_) => {
                        let elapsed_ms = millis(agent_started.elapsed());
                        tracing::warn!(agent = %task_name, elapsed_ms, "Agent timed out");
                        AgentResult::failed(
                            task_name,
                            format!("timed out after {timeout_secs:.1}s"),
                            elapsed_ms,
                        )
                    }
                }
            });

            names.push(name);
            handles.push(handle);
        }

        let _guard = AbortOnDrop(handles.iter().map(|h| h.abort_handle()).collect());
        let joined = join_all(handles).await;

        let results: Vec<AgentResult> = names
            .into_iter()
            .zip(joined)
            .map(|(name, joined)| {
                let result = match joined {
                    Ok(result) if result.agent_name() == name => result,
                    Ok(result) => {
                        tracing::warn!(
                            agent = %name,
                            reported = result.agent_name(),
                            "Agent reported under a different name"
                        );
                        AgentResult::failed(
                            name,
                            format!("agent reported its result as '{}'", result.agent_name()),
                            result.elapsed_ms(),
                        )
                    }
                    Err(e) => {
                        tracing::error!(agent = %name, error = %e, "Agent task panicked");
                        AgentResult::failed(name, format!("agent task failed: {e}"), millis(started.elapsed()))
                    }
                };

                if result.is_success() {
                    tracing::info!(
                        agent = result.agent_name(),
                        findings = result.findings().len(),
                        elapsed_ms = result.elapsed_ms(),
                        "Agent completed"
                    );
                } else {
                    tracing::warn!(
                        agent = result.agent_name(),
                        error = result.error_message().unwrap_or_default(),
                        "Agent failed"
                    );
                }
                result
            })
            .collect();

        let report = ReviewReport::aggregate(target, results, millis(started.elapsed()));

        tracing::info!(
            review = %report.pr_identifier(),
            total_findings = report.total_findings(),
            failed_agents = report.failed_agents().count(),
            duration_ms = report.duration_ms(),
            recommendation = ?report.recommendation(),
            "Review aggregated"
        );

        Ok(report)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
