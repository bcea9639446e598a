use std::fmt;

use serde::{Deserialize, Serialize};

/// How serious a finding is. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Minor,
    Major,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Info,
        Severity::Minor,
        Severity::Major,
        Severity::Critical,
    ];

    /// Map a severity word as models tend to write it onto our four levels.
    ///
    /// Returns `None` for words that are not severity labels at all, so callers
    /// can tell "unlabelled" apart from "labelled info".
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label
            .trim()
            .trim_matches(|c: char| !c.is_ascii_alphanumeric())
            .to_ascii_lowercase();

        match normalized.as_str() {
            "critical" | "blocker" => Some(Severity::Critical),
            "high" | "major" | "error" => Some(Severity::Major),
            "medium" | "moderate" | "minor" | "low" | "warning" => Some(Severity::Minor),
            "info" | "informational" | "note" | "nit" => Some(Severity::Info),
            _ => None,
        }
    }

    /// Like [`Severity::from_label`], but anything unrecognised degrades to `Info`.
    pub fn from_label_lossy(label: &str) -> Self {
        Self::from_label(label).unwrap_or(Severity::Info)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Minor => "minor",
            Severity::Major => "major",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The review perspective an agent analyses a diff from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Logic,
    Readability,
    Performance,
    Security,
    TestCoverage,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Security,
        Category::Logic,
        Category::Performance,
        Category::Readability,
        Category::TestCoverage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Logic => "logic",
            Category::Readability => "readability",
            Category::Performance => "performance",
            Category::Security => "security",
            Category::TestCoverage => "test_coverage",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::Logic => "Detects logic errors and runtime bugs",
            Category::Readability => "Reviews code quality and maintainability",
            Category::Performance => "Finds performance issues and inefficiencies",
            Category::Security => "Identifies security vulnerabilities and risks",
            Category::TestCoverage => "Identifies missing tests and edge cases",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One issue reported by an agent.
///
/// Fields are read-only once built; the `with_*` methods are only used while
/// the parser assembles a finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    category: Category,
    severity: Severity,
    file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    line_hint: Option<u32>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggested_fix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggested_code: Option<String>,
}

impl Finding {
    pub fn new(
        category: Category,
        severity: Severity,
        file_path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            severity,
            file_path: file_path.into(),
            line_hint: None,
            message: message.into(),
            suggested_fix: None,
            suggested_code: None,
        }
    }

    pub fn with_line(mut self, line: Option<u32>) -> Self {
        self.line_hint = line.filter(|l| *l > 0);
        self
    }

    pub fn with_suggested_fix(mut self, fix: Option<String>) -> Self {
        self.suggested_fix = fix.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn with_suggested_code(mut self, code: Option<String>) -> Self {
        self.suggested_code = code.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn line_hint(&self) -> Option<u32> {
        self.line_hint
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn suggested_fix(&self) -> Option<&str> {
        self.suggested_fix.as_deref()
    }

    pub fn suggested_code(&self) -> Option<&str> {
        self.suggested_code.as_deref()
    }

    /// `path:line` or just `path` when no line is known.
    pub fn location(&self) -> String {
        match self.line_hint {
            Some(line) => format!("{}:{line}", self.file_path),
            None => self.file_path.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_labels_normalise() {
        assert_eq!(Severity::from_label("CRITICAL"), Some(Severity::Critical));
        assert_eq!(Severity::from_label("[High]"), Some(Severity::Major));
        assert_eq!(Severity::from_label("**medium**"), Some(Severity::Minor));
        assert_eq!(Severity::from_label("low"), Some(Severity::Minor));
        assert_eq!(Severity::from_label("nit"), Some(Severity::Info));
        assert_eq!(Severity::from_label("catastrophic"), None);
        assert_eq!(Severity::from_label_lossy("catastrophic"), Severity::Info);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::Major);
        assert!(Severity::Major > Severity::Minor);
        assert!(Severity::Minor > Severity::Info);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("Security"), Some(Category::Security));
        assert_eq!(Category::parse("test-coverage"), Some(Category::TestCoverage));
        assert_eq!(Category::parse("style"), None);
    }

    #[test]
    fn test_finding_serialization_skips_empty_options() {
        let finding = Finding::new(Category::Logic, Severity::Major, "src/lib.rs", "off by one")
            .with_line(Some(12))
            .with_suggested_fix(Some("   ".to_string()));

        let json = serde_json::to_value(&finding).unwrap();
        assert_eq!(json["category"], "logic");
        assert_eq!(json["severity"], "major");
        assert_eq!(json["line_hint"], 12);
        assert!(json.get("suggested_fix").is_none());
        assert_eq!(finding.location(), "src/lib.rs:12");
    }

    #[test]
    fn test_zero_line_is_dropped() {
        let finding = Finding::new(Category::Logic, Severity::Info, "a.rs", "x").with_line(Some(0));
        assert_eq!(finding.line_hint(), None);
        assert_eq!(finding.location(), "a.rs");
    }
}
