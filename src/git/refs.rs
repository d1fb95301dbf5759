use std::collections::HashSet;

use chrono::NaiveDate;

use crate::location::RepoLocation;

use super::{CommandError, GitRunner};

/// Sentinel stored in `BranchStatus::unpushed_count` when `origin/<branch>` does not exist.
pub const NO_REMOTE: i64 = -1;

/// Branches whose reflog moved on `date`, in first-seen order.
///
/// A failing reflog query yields an empty list; the caller decides on a fallback.
#[must_use]
pub(crate) fn active_branches(
    repo: &RepoLocation,
    git: &dyn GitRunner,
    date: NaiveDate,
) -> Vec<String> {
    let since = format!("--since={date} 00:00");
    match git.run_git(repo, &["reflog", "--all", &since, "--format=%gD"]) {
        Ok(out) => parse_reflog_branches(&out),
        Err(err) => {
            log::debug!("[{}] reflog unavailable: {err}", repo.name);
            Vec::new()
        }
    }
}

pub(crate) fn current_branch(
    repo: &RepoLocation,
    git: &dyn GitRunner,
) -> Result<Option<String>, CommandError> {
    let out = git.run_git(repo, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    let name = out.trim();
    Ok((!name.is_empty()).then(|| name.to_string()))
}

/// Commits on `branch` missing from `origin/<branch>`, or [`NO_REMOTE`].
#[must_use]
pub(crate) fn unpushed_count(repo: &RepoLocation, git: &dyn GitRunner, branch: &str) -> i64 {
    let range = format!("origin/{branch}..{branch}");
    match git.run_git(repo, &["log", "--oneline", &range]) {
        Ok(out) => i64::try_from(count_lines(&out)).unwrap_or(i64::MAX),
        Err(err) => {
            log::debug!("[{}] no remote counterpart for {branch}: {err}", repo.name);
            NO_REMOTE
        }
    }
}

fn parse_reflog_branches(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut branches = Vec::new();
    for line in text.lines() {
        let Some(rest) = line.trim().strip_prefix("refs/heads/") else {
            continue;
        };
        let name = rest
            .split_once("@{")
            .or_else(|| rest.split_once('@'))
            .map(|(name, _)| name);
        if let Some(name) = name
            && !name.is_empty()
            && seen.insert(name.to_string())
        {
            branches.push(name.to_string());
        }
    }
    branches
}

fn count_lines(s: &str) -> usize {
    s.lines().filter(|l| !l.trim().is_empty()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflog_branches_keep_first_seen_order() {
        let text = "refs/heads/feature/x@{0}\n\
                    refs/heads/main@{1}\n\
                    refs/remotes/origin/main@{0}\n\
                    refs/heads/feature/x@{2}\n\
                    HEAD@{3}\n";
        assert_eq!(parse_reflog_branches(text), vec!["feature/x", "main"]);
    }

    #[test]
    fn reflog_without_braces_still_splits_on_at() {
        assert_eq!(parse_reflog_branches("refs/heads/dev@\n"), vec!["dev"]);
        assert!(parse_reflog_branches("refs/heads/@{0}\n").is_empty());
    }

    #[test]
    fn counts_only_non_blank_lines() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("abc one\ndef two\n\n"), 2);
    }
}
