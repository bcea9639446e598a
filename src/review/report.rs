use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::review::finding::{Finding, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Success,
    Failed,
}

/// The outcome of one agent's analysis within one review.
///
/// Built only through [`AgentResult::success`] and [`AgentResult::failed`]:
/// failed results carry an error and never carry findings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentResult {
    agent_name: String,
    status: AgentStatus,
    findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    elapsed_ms: u64,
}

impl AgentResult {
    pub fn success(
        agent_name: impl Into<String>,
        findings: Vec<Finding>,
        summary: Option<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            status: AgentStatus::Success,
            findings,
            error_message: None,
            summary,
            elapsed_ms,
        }
    }

    pub fn failed(agent_name: impl Into<String>, error: impl Into<String>, elapsed_ms: u64) -> Self {
        Self {
            agent_name: agent_name.into(),
            status: AgentStatus::Failed,
            findings: Vec::new(),
            error_message: Some(error.into()),
            summary: None,
            elapsed_ms,
        }
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status == AgentStatus::Success
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }
}

/// What a review is about: a pull request or an ad-hoc diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrIdentifier {
    PullRequest {
        owner: String,
        repo: String,
        number: u64,
    },
    Adhoc {
        tag: String,
    },
}

impl PrIdentifier {
    pub fn pull_request(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        PrIdentifier::PullRequest {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }

    pub fn adhoc(tag: impl Into<String>) -> Self {
        PrIdentifier::Adhoc { tag: tag.into() }
    }
}

impl fmt::Display for PrIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrIdentifier::PullRequest {
                owner,
                repo,
                number,
            } => write!(f, "{owner}/{repo}#{number}"),
            PrIdentifier::Adhoc { tag } => f.write_str(tag),
        }
    }
}

/// Overall verdict derived from the severity histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Approve,
    Comment,
    RequestChanges,
    Block,
}

impl Recommendation {
    pub fn from_counts(counts: &BTreeMap<Severity, usize>) -> Self {
        let count = |s: Severity| counts.get(&s).copied().unwrap_or(0);

        if count(Severity::Critical) > 0 {
            Recommendation::Block
        } else if count(Severity::Major) > 3 {
            Recommendation::RequestChanges
        } else if count(Severity::Major) > 0 || count(Severity::Minor) > 5 {
            Recommendation::Comment
        } else {
            Recommendation::Approve
        }
    }

    pub fn headline(&self) -> &'static str {
        match self {
            Recommendation::Approve => "APPROVE - Looks good",
            Recommendation::Comment => "COMMENT - Improvements suggested",
            Recommendation::RequestChanges => "REQUEST CHANGES - Multiple major issues found",
            Recommendation::Block => "BLOCK - Critical issues must be resolved",
        }
    }
}

/// The aggregate of every agent's result for one review.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewReport {
    pr_identifier: PrIdentifier,
    agent_results: BTreeMap<String, AgentResult>,
    total_findings: usize,
    findings_by_severity: BTreeMap<Severity, usize>,
    recommendation: Recommendation,
    generated_at: DateTime<Utc>,
    duration_ms: u64,
}

impl ReviewReport {
    /// Merge agent results into a report. Later results for an agent name
    /// already present replace the earlier one.
    pub fn aggregate(
        pr_identifier: PrIdentifier,
        results: impl IntoIterator<Item = AgentResult>,
        duration_ms: u64,
    ) -> Self {
        let agent_results: BTreeMap<String, AgentResult> = results
            .into_iter()
            .map(|r| (r.agent_name.clone(), r))
            .collect();

        let mut findings_by_severity: BTreeMap<Severity, usize> =
            Severity::ALL.iter().map(|s| (*s, 0)).collect();
        let mut total_findings = 0;

        for finding in agent_results
            .values()
            .filter(|r| r.is_success())
            .flat_map(|r| r.findings.iter())
        {
            *findings_by_severity.entry(finding.severity()).or_insert(0) += 1;
            total_findings += 1;
        }

        let recommendation = Recommendation::from_counts(&findings_by_severity);

        Self {
            pr_identifier,
            agent_results,
            total_findings,
            findings_by_severity,
            recommendation,
            generated_at: Utc::now(),
            duration_ms,
        }
    }

    pub fn pr_identifier(&self) -> &PrIdentifier {
        &self.pr_identifier
    }

    pub fn agent_results(&self) -> &BTreeMap<String, AgentResult> {
        &self.agent_results
    }

    pub fn total_findings(&self) -> usize {
        self.total_findings
    }

    pub fn findings_by_severity(&self) -> &BTreeMap<Severity, usize> {
        &self.findings_by_severity
    }

    pub fn recommendation(&self) -> Recommendation {
        self.recommendation
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Every finding from successful agents, most severe first.
    pub fn findings(&self) -> Vec<&Finding> {
        let mut findings: Vec<&Finding> = self
            .agent_results
            .values()
            .filter(|r| r.is_success())
            .flat_map(|r| r.findings.iter())
            .collect();
        findings.sort_by(|a, b| b.severity().cmp(&a.severity()));
        findings
    }

    pub fn failed_agents(&self) -> impl Iterator<Item = &AgentResult> {
        self.agent_results.values().filter(|r| !r.is_success())
    }
}
