use crate::platform::types::PullRequestInfo;

/// Map an octocrab pull request to our platform type.
pub fn map_pull_request(pr: octocrab::models::pulls::PullRequest) -> PullRequestInfo {
    let state = match pr.state {
        Some(octocrab::models::IssueState::Closed) if pr.merged_at.is_some() => "merged",
        Some(octocrab::models::IssueState::Closed) => "closed",
        _ => "open",
    };

    PullRequestInfo {
        number: pr.number,
        title: pr.title.unwrap_or_default(),
        body: pr.body.unwrap_or_default(),
        author: pr.user.map(|u| u.login).unwrap_or_else(|| "unknown".to_string()),
        state: state.to_string(),
        head_sha: pr.head.sha,
        head_branch: pr.head.ref_field,
        base_branch: pr.base.ref_field,
        additions: pr.additions.unwrap_or_default(),
        deletions: pr.deletions.unwrap_or_default(),
        changed_files: pr.changed_files.unwrap_or_default(),
        html_url: pr.html_url.map(|u| u.to_string()),
    }
}
