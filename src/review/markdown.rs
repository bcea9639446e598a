use std::fmt::Write;

use crate::review::finding::Severity;
use crate::review::report::ReviewReport;

const SIGNATURE: &str = "\n---\n*PR Council*\n";

impl ReviewReport {
    /// Render the report as a GitHub comment body.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "## Code Review: {}\n", self.pr_identifier());
        let _ = writeln!(out, "**Recommendation:** {}\n", self.recommendation().headline());

        out.push_str("| Severity | Count |\n|---|---|\n");
        for severity in Severity::ALL.iter().rev() {
            let count = self.findings_by_severity().get(severity).copied().unwrap_or(0);
            let _ = writeln!(out, "| {severity} | {count} |");
        }
        let _ = writeln!(out, "\n**Total findings:** {}", self.total_findings());

        for (name, result) in self.agent_results() {
            if !result.is_success() || result.findings().is_empty() {
                continue;
            }

            let _ = writeln!(out, "\n### {name}\n");
            if let Some(summary) = result.summary() {
                let _ = writeln!(out, "{summary}\n");
            }

            let mut findings: Vec<_> = result.findings().iter().collect();
            findings.sort_by(|a, b| b.severity().cmp(&a.severity()));

            for finding in findings {
                let _ = writeln!(
                    out,
                    "- **[{}]** `{}`: {}",
                    finding.severity().as_str().to_ascii_uppercase(),
                    finding.location(),
                    finding.message()
                );
                if let Some(fix) = finding.suggested_fix() {
                    let _ = writeln!(out, "  - Suggestion: {fix}");
                }
                if let Some(code) = finding.suggested_code() {
                    let _ = writeln!(out, "\n  ```\n{}\n  ```", indent(code, "  "));
                }
            }
        }

        let failed: Vec<_> = self.failed_agents().collect();
        if !failed.is_empty() {
            out.push_str("\n### Agents that did not complete\n\n");
            for result in failed {
                let _ = writeln!(
                    out,
                    "- {}: {}",
                    result.agent_name(),
                    result.error_message().unwrap_or("unknown error")
                );
            }
        }

        out.push_str(SIGNATURE);
        out
    }
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{prefix}{line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use crate::review::finding::{Category, Finding, Severity};
    use crate::review::report::{AgentResult, PrIdentifier, ReviewReport};

    #[test]
    fn test_markdown_sections() {
        let report = ReviewReport::aggregate(
            PrIdentifier::pull_request("octo", "hello", 3),
            vec![
                AgentResult::success(
                    "security",
                    vec![Finding::new(
                        Category::Security,
                        Severity::Critical,
                        "app/users.py",
                        "SQL injection",
                    )
                    .with_line(Some(11))
                    .with_suggested_fix(Some("Use a parameterized query".to_string()))],
                    Some("One injection found.".to_string()),
                    5,
                ),
                AgentResult::success("logic", Vec::new(), None, 4),
                AgentResult::failed("performance", "API returned 502", 2),
            ],
            6,
        );

        let md = report.to_markdown();

        assert!(md.starts_with("## Code Review: octo/hello#3"));
        assert!(md.contains("BLOCK"));
        assert!(md.contains("| critical | 1 |"));
        assert!(md.contains("### security"));
        assert!(md.contains("- **[CRITICAL]** `app/users.py:11`: SQL injection"));
        assert!(md.contains("Suggestion: Use a parameterized query"));
        assert!(!md.contains("### logic"));
        assert!(md.contains("- performance: API returned 502"));
    }

    #[test]
    fn test_clean_report() {
        let report = ReviewReport::aggregate(
            PrIdentifier::adhoc("manual"),
            vec![AgentResult::success("logic", Vec::new(), None, 1)],
            1,
        );
        let md = report.to_markdown();
        assert!(md.contains("APPROVE"));
        assert!(md.contains("**Total findings:** 0"));
        assert!(!md.contains("did not complete"));
    }
}
