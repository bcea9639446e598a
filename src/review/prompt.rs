use crate::review::finding::Category;

const RESPONSE_FORMAT: &str = r#"Respond with JSON only, using exactly this structure:
{
    "issues": [
        {
            "file": "path/to/file",
            "line": 42,
            "severity": "critical|major|minor|info",
            "title": "brief title",
            "description": "what is wrong and why it matters",
            "suggestion": "how to fix it",
            "suggested_code": "replacement code for the problematic line(s), if applicable"
        }
    ],
    "summary": "one or two sentences summarising your findings"
}

If you find nothing worth reporting, return {"issues": [], "summary": "No issues found."}"#;

pub fn system_prompt(category: Category) -> String {
    let (role, focus, closing) = match category {
        Category::Security => (
            "a senior security engineer reviewing code for vulnerabilities",
            "- SQL, command and template injection
- Cross-site scripting (XSS) and CSRF
- Authentication and authorization flaws
- Hardcoded secrets or credentials
- Insecure data storage or transmission
- Missing input validation and path traversal
- Cryptographic weaknesses
- Information disclosure",
            "Focus on real, exploitable issues rather than theoretical ones.",
        ),
        Category::Logic => (
            "a senior software engineer reviewing code for logic errors and bugs",
            "- Null or undefined references
- Off-by-one errors and wrong boundary conditions
- Infinite loops or unbounded recursion
- Race conditions and concurrency issues
- Resource leaks (memory, file handles, connections)
- Incorrect error handling
- Unhandled edge cases and incorrect assumptions
- State management and data consistency problems",
            "Focus on issues that would cause runtime failures, incorrect behavior or data corruption.",
        ),
        Category::Performance => (
            "a senior performance engineer reviewing code for efficiency issues",
            "- N+1 queries and unindexed or unpaginated queries
- Algorithms with the wrong time or space complexity
- Redundant computation and heavy work inside loops
- Blocking operations on async paths
- Missing caching opportunities
- Excessive allocation, copying or data transfer
- Large file operations without streaming",
            "Focus on issues that would noticeably degrade performance at scale; estimate the complexity where relevant.",
        ),
        Category::Readability => (
            "a senior software engineer reviewing code for readability and maintainability",
            "- Unclear variable or function names
- Overly long or deeply nested functions
- Code duplication
- Magic numbers or strings
- Missing or misleading documentation
- Poor separation of concerns
- Confusing control flow and unhelpful error messages",
            "Readability issues are usually minor or info severity.",
        ),
        Category::TestCoverage => (
            "a senior QA engineer reviewing code for test coverage and quality",
            "- New or changed behavior without tests
- Untested error paths and edge cases
- Boundary conditions that deserve a test
- Brittle or overly coupled tests
- Missing integration coverage for external calls",
            "Name the specific test cases that should be added.",
        ),
    };

    format!(
        r#"You are {role}.

Focus on identifying:
{focus}

For each issue found:
1. Identify the exact location (file and line)
2. Explain the problem and its impact
3. Assign a severity: critical, major, minor or info
4. Provide a concrete fix

{closing}

Only report issues in the lines changed by the diff."#
    )
}

/// The user message carrying the diff and any caller-supplied context.
pub fn user_prompt(diff: &str, context: Option<&str>, truncated: bool) -> String {
    let context_section = match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("## Context\n{context}\n\n"),
        None => String::new(),
    };
    let truncation_note = if truncated {
        "\n[diff truncated]\n"
    } else {
        ""
    };

    format!(
        "Review the following pull request changes.\n\n{context_section}## Diff\n```diff\n{diff}\n```{truncation_note}\n\n{RESPONSE_FORMAT}"
    )
}
