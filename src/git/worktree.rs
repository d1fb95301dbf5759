use crate::location::RepoLocation;

use super::{CommandError, GitRunner};

pub(crate) const NEW_FILE_SUFFIX: &str = " (new)";

pub(crate) fn staged_files(
    repo: &RepoLocation,
    git: &dyn GitRunner,
) -> Result<Vec<String>, CommandError> {
    git.run_git(repo, &["diff", "--cached", "--name-only"])
        .map(|out| split_paths(&out))
}

pub(crate) fn unstaged_files(
    repo: &RepoLocation,
    git: &dyn GitRunner,
) -> Result<Vec<String>, CommandError> {
    git.run_git(repo, &["diff", "--name-only"])
        .map(|out| split_paths(&out))
}

/// Untracked, non-ignored files, each marked with [`NEW_FILE_SUFFIX`].
pub(crate) fn untracked_files(
    repo: &RepoLocation,
    git: &dyn GitRunner,
) -> Result<Vec<String>, CommandError> {
    let out = git.run_git(repo, &["ls-files", "--others", "--exclude-standard"])?;
    Ok(split_paths(&out)
        .into_iter()
        .map(|f| format!("{f}{NEW_FILE_SUFFIX}"))
        .collect())
}

fn split_paths(s: &str) -> Vec<String> {
    s.lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string)
        .collect()
}
