use std::collections::HashSet;

use chrono::NaiveDate;

use crate::git::{
    CommandError, GitRunner, active_branches, branch_log, current_branch, staged_files,
    unpushed_count, unstaged_files, untracked_files,
};
use crate::location::RepoLocation;
use crate::types::{BranchStatus, CommitRecord, FileChangeRecord, RepoScan};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("no active or current branch could be determined for {repo}")]
    Discovery {
        repo: String,
        #[source]
        source: Option<CommandError>,
    },
}

/// Scan one repository. Failures never escape: whatever was gathered before
/// an error is returned and the error is logged.
pub(crate) fn scan_repository(
    repo: &RepoLocation,
    author: Option<&str>,
    date: NaiveDate,
    git: &dyn GitRunner,
) -> RepoScan {
    let mut scan = RepoScan::default();
    if let Err(err) = process_repo(repo, author, date, git, &mut scan) {
        log::warn!("{err}");
    }
    scan
}

fn process_repo(
    repo: &RepoLocation,
    author: Option<&str>,
    date: NaiveDate,
    git: &dyn GitRunner,
    scan: &mut RepoScan,
) -> Result<(), ScanError> {
    let branches = discover_branches(repo, git, date)?;
    log::debug!("[{}] branches for {date}: {branches:?}", repo.name);

    collect_commits(repo, git, &branches, date, author, scan);
    for branch in &branches {
        let count = unpushed_count(repo, git, branch);
        scan.branches.push(BranchStatus::new(&repo.name, branch, count));
    }
    collect_working_tree(repo, git, scan);
    Ok(())
}

fn discover_branches(
    repo: &RepoLocation,
    git: &dyn GitRunner,
    date: NaiveDate,
) -> Result<Vec<String>, ScanError> {
    let branches = active_branches(repo, git, date);
    if !branches.is_empty() {
        return Ok(branches);
    }
    match current_branch(repo, git) {
        Ok(Some(branch)) => Ok(vec![branch]),
        Ok(None) => Err(ScanError::Discovery {
            repo: repo.raw.clone(),
            source: None,
        }),
        Err(source) => Err(ScanError::Discovery {
            repo: repo.raw.clone(),
            source: Some(source),
        }),
    }
}

fn collect_commits(
    repo: &RepoLocation,
    git: &dyn GitRunner,
    branches: &[String],
    date: NaiveDate,
    author: Option<&str>,
    scan: &mut RepoScan,
) {
    let mut seen = HashSet::<String>::new();
    for branch in branches {
        let entries = match branch_log(repo, git, branch, date, author) {
            Ok(entries) => entries,
            Err(err) => {
                log::warn!("[{}] skipping commits on {branch}: {err}", repo.name);
                continue;
            }
        };
        for entry in entries {
            if !seen.insert(entry.hash) {
                continue;
            }
            scan.commits.push(CommitRecord {
                time: entry.time,
                message: entry.message,
                repo: repo.name.clone(),
                branch: branch.clone(),
            });
        }
    }
}

fn collect_working_tree(repo: &RepoLocation, git: &dyn GitRunner, scan: &mut RepoScan) {
    let record = |file: String| FileChangeRecord {
        repo: repo.name.clone(),
        file,
    };
    match staged_files(repo, git) {
        Ok(files) => scan.staged.extend(files.into_iter().map(record)),
        Err(err) => log::warn!("[{}] staged files unavailable: {err}", repo.name),
    }
    match unstaged_files(repo, git) {
        Ok(files) => scan.unstaged.extend(files.into_iter().map(record)),
        Err(err) => log::warn!("[{}] unstaged files unavailable: {err}", repo.name),
    }
    match untracked_files(repo, git) {
        Ok(files) => scan.unstaged.extend(files.into_iter().map(record)),
        Err(err) => log::warn!("[{}] untracked files unavailable: {err}", repo.name),
    }
}
