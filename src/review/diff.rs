//! Small helpers over unified-diff text.

use std::borrow::Cow;

/// Placeholder file path for findings that cannot be tied to a single file.
pub const UNLOCATED: &str = "(diff)";

/// Paths of the files a unified diff touches, in order of appearance.
///
/// Reads the `+++ b/<path>` headers and falls back to `--- a/<path>` for
/// deletions (where the new side is `/dev/null`).
pub fn changed_files(diff: &str) -> Vec<String> {
    let mut files: Vec<String> = Vec::new();
    let mut pending_old: Option<String> = None;

    for line in diff.lines() {
        if let Some(old) = line.strip_prefix("--- ") {
            pending_old = header_path(old);
        } else if let Some(new) = line.strip_prefix("+++ ") {
            let path = header_path(new).or_else(|| pending_old.take());
            if let Some(path) = path {
                if !files.contains(&path) {
                    files.push(path);
                }
            }
            pending_old = None;
        }
    }

    files
}

fn header_path(raw: &str) -> Option<String> {
    // Headers may carry a tab-separated timestamp.
    let raw = raw.split('\t').next().unwrap_or(raw).trim();
    if raw.is_empty() || raw == "/dev/null" {
        return None;
    }
    let path = raw
        .strip_prefix("a/")
        .or_else(|| raw.strip_prefix("b/"))
        .unwrap_or(raw);
    Some(path.to_string())
}

/// The file path to attribute unlocated findings to, given the files a diff touches.
pub fn default_location(files: &[String]) -> String {
    match files {
        [only] => only.clone(),
        _ => UNLOCATED.to_string(),
    }
}

/// Give a bare snippet the file headers of `path` so its findings land on that file.
///
/// Diffs that already carry headers, and blank input, are returned unchanged.
pub fn with_file_header<'a>(diff: &'a str, path: &str) -> Cow<'a, str> {
    if diff.trim().is_empty() || !changed_files(diff).is_empty() {
        return Cow::Borrowed(diff);
    }
    Cow::Owned(format!("--- a/{path}\n+++ b/{path}\n{diff}"))
}

const SKIP_EXTENSIONS: [&str; 18] = [
    ".json", ".lock", ".md", ".txt", ".yml", ".yaml", ".gitignore", ".env", ".png", ".jpg", ".gif",
    ".svg", ".ico", ".pdf", ".woff", ".woff2", ".ttf", ".eot",
];

const SKIP_PATTERNS: [&str; 8] = [
    "package-lock.json",
    "yarn.lock",
    "poetry.lock",
    "pipfile.lock",
    "requirements.txt",
    "node_modules/",
    ".min.js",
    ".min.css",
];

/// False for lockfiles, vendored dependencies, minified bundles, docs and binary assets.
pub fn is_reviewable(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    !(SKIP_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        || SKIP_PATTERNS.iter().any(|pattern| lower.contains(pattern)))
}

/// A diff with the sections of non-reviewable files removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredDiff {
    pub text: String,
    pub skipped: Vec<String>,
}

/// Drop every per-file section whose path fails [`is_reviewable`].
///
/// Text that belongs to no file (a preamble, a bare snippet) is kept.
pub fn drop_unreviewable(diff: &str) -> FilteredDiff {
    let mut text = String::with_capacity(diff.len());
    let mut skipped = Vec::new();

    for section in file_sections(diff) {
        match section_path(section) {
            Some(path) if !is_reviewable(&path) => skipped.push(path),
            _ => text.push_str(section),
        }
    }

    FilteredDiff { text, skipped }
}

/// Split a unified diff at each file boundary: a `diff --git` line, or a
/// `---`/`+++` header pair not already introduced by one.
fn file_sections(diff: &str) -> Vec<&str> {
    let lines: Vec<(usize, &str)> = diff
        .split_inclusive('\n')
        .scan(0, |offset, line| {
            let start = *offset;
            *offset += line.len();
            Some((start, line))
        })
        .collect();

    let mut starts = vec![0];
    let mut in_git_header = false;

    for (i, (offset, line)) in lines.iter().enumerate() {
        if line.starts_with("diff --git ") {
            if *offset != 0 {
                starts.push(*offset);
            }
            in_git_header = true;
        } else if line.starts_with("--- ")
            && lines
                .get(i + 1)
                .is_some_and(|(_, next)| next.starts_with("+++ "))
        {
            if !in_git_header && *offset != 0 {
                starts.push(*offset);
            }
            in_git_header = false;
        }
    }

    starts.push(diff.len());
    starts.windows(2).map(|w| &diff[w[0]..w[1]]).collect()
}

fn section_path(section: &str) -> Option<String> {
    if let Some(path) = changed_files(section).into_iter().next() {
        return Some(path);
    }
    // Binary and mode-only changes have no ---/+++ pair.
    let git_line = section.lines().next()?.strip_prefix("diff --git ")?;
    git_line.split_whitespace().last().and_then(header_path)
}

/// Cut `diff` down to at most `max_chars` characters, on a char boundary.
///
/// Returns the (possibly shortened) text and whether anything was dropped.
pub fn truncate(diff: &str, max_chars: usize) -> (&str, bool) {
    match diff.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&diff[..byte_idx], true),
        None => (diff, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FILES: &str = "\
diff --git a/src/db.rs b/src/db.rs
--- a/src/db.rs
+++ b/src/db.rs
@@ -1,3 +1,3 @@
-let q = prepare(\"SELECT * FROM users WHERE id = ?\");
+let q = format!(\"SELECT * FROM users WHERE id = {}\", id);
diff --git a/old.txt b/old.txt
--- a/old.txt
+++ /dev/null
@@ -1 +0,0 @@
-gone
";

    #[test]
    fn test_changed_files_reads_headers() {
        assert_eq!(changed_files(TWO_FILES), vec!["src/db.rs", "old.txt"]);
    }

    #[test]
    fn test_default_location_single_file() {
        let diff = "--- a/main.py\n+++ b/main.py\n@@ -1 +1 @@\n-a\n+b\n";
        assert_eq!(default_location(&changed_files(diff)), "main.py");
        assert_eq!(default_location(&changed_files(TWO_FILES)), UNLOCATED);
        assert_eq!(default_location(&[]), UNLOCATED);
    }

    #[test]
    fn test_snippet_gets_file_header() {
        let snippet = "+result = eval(request.args['expr'])\n";
        let framed = with_file_header(snippet, "app/views.py");
        assert_eq!(changed_files(&framed), vec!["app/views.py"]);
        assert!(framed.ends_with(snippet));

        assert!(matches!(with_file_header(TWO_FILES, "other.rs"), Cow::Borrowed(_)));
        assert_eq!(with_file_header("  ", "a.rs"), "  ");
    }

    #[test]
    fn test_skip_list() {
        for path in [
            "package-lock.json",
            "Cargo.lock",
            "web/node_modules/left-pad/index.js",
            "static/app.min.js",
            "docs/README.md",
            "assets/logo.PNG",
            "fonts/inter.woff2",
            ".github/workflows/ci.yml",
        ] {
            assert!(!is_reviewable(path), "{path} should be skipped");
        }
        for path in ["src/main.rs", "app/views.py", "web/src/index.ts", "Makefile"] {
            assert!(is_reviewable(path), "{path} should be reviewed");
        }
    }

    const WITH_LOCKFILE: &str = "\
diff --git a/Cargo.lock b/Cargo.lock
--- a/Cargo.lock
+++ b/Cargo.lock
@@ -1,3 +1,3 @@
-version = \"1.0.0\"
+version = \"1.0.1\"
diff --git a/src/db.rs b/src/db.rs
--- a/src/db.rs
+++ b/src/db.rs
@@ -1 +1 @@
-let a = 1;
+let a = 2;
diff --git a/assets/logo.png b/assets/logo.png
Binary files a/assets/logo.png and b/assets/logo.png differ
";

    #[test]
    fn test_drop_unreviewable_sections() {
        let filtered = drop_unreviewable(WITH_LOCKFILE);
        assert_eq!(filtered.skipped, vec!["Cargo.lock", "assets/logo.png"]);
        assert_eq!(changed_files(&filtered.text), vec!["src/db.rs"]);
        assert!(filtered.text.starts_with("diff --git a/src/db.rs"));
        assert!(filtered.text.contains("+let a = 2;"));
        assert!(!filtered.text.contains("version"));
    }

    #[test]
    fn test_drop_unreviewable_without_git_lines() {
        let diff = "--- a/yarn.lock\n+++ b/yarn.lock\n@@ -1 +1 @@\n-x\n+y\n--- a/lib.rs\n+++ b/lib.rs\n@@ -1 +1 @@\n-a\n+b\n";
        let filtered = drop_unreviewable(diff);
        assert_eq!(filtered.skipped, vec!["yarn.lock"]);
        assert_eq!(filtered.text, "--- a/lib.rs\n+++ b/lib.rs\n@@ -1 +1 @@\n-a\n+b\n");
    }

    #[test]
    fn test_everything_skipped_leaves_nothing() {
        let diff = "diff --git a/package-lock.json b/package-lock.json\n--- a/package-lock.json\n+++ b/package-lock.json\n@@ -1 +1 @@\n-1\n+2\n";
        let filtered = drop_unreviewable(diff);
        assert!(filtered.text.trim().is_empty());
        assert_eq!(filtered.skipped, vec!["package-lock.json"]);

        let snippet = "+let x = 1;\n";
        assert_eq!(drop_unreviewable(snippet).text, snippet);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo wörld";
        let (cut, truncated) = truncate(text, 4);
        assert_eq!(cut, "héll");
        assert!(truncated);

        let (whole, truncated) = truncate(text, 100);
        assert_eq!(whole, text);
        assert!(!truncated);
    }
}
