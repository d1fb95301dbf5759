use chrono::NaiveDate;
use rayon::{ThreadPoolBuilder, prelude::*};

use crate::git::GitRunner;
use crate::location::{RepoLocation, resolve};
use crate::types::{Options, RepoScan, ReportData, RepositoryView};

use super::repository::scan_repository;

/// Scan every configured directory for `date` and merge the results.
///
/// Blank entries are skipped. Every other entry gets a view in
/// `repositories`, in configuration order, even when it produced nothing.
pub fn collect_report_data(opts: &Options, date: NaiveDate, git: &dyn GitRunner) -> ReportData {
    let locations: Vec<RepoLocation> = opts
        .directories
        .iter()
        .map(|dir| dir.trim())
        .filter(|dir| !dir.is_empty())
        .map(resolve)
        .collect();
    let author = opts.author();

    let scans = scan_all(&locations, opts.jobs, |loc| {
        scan_repository(loc, author, date, git)
    });

    let mut data = ReportData::default();
    for scan in scans {
        data.commits.extend(scan.commits);
        data.staged.extend(scan.staged);
        data.unstaged.extend(scan.unstaged);
        data.branches.extend(scan.branches);
    }
    data.commits.sort_by(|a, b| a.time.cmp(&b.time));

    data.repositories = locations
        .iter()
        .map(|loc| group_by_repo(&data, &loc.name))
        .collect();
    if let Some(notice) = no_commits_notice(&data, date) {
        log::info!("{notice}");
    }
    data
}

/// Message for the `info` record of a day without commits.
pub(crate) fn no_commits_notice(data: &ReportData, date: NaiveDate) -> Option<String> {
    data.commits
        .is_empty()
        .then(|| format!("no commits found for {date}"))
}

/// Results come back in `locations` order whatever the completion order.
fn scan_all<F>(locations: &[RepoLocation], jobs: Option<usize>, scan: F) -> Vec<RepoScan>
where
    F: Fn(&RepoLocation) -> RepoScan + Sync,
{
    let threads = jobs.unwrap_or_else(num_cpus::get).max(1);
    if threads == 1 || locations.len() <= 1 {
        return locations.iter().map(&scan).collect();
    }
    match ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool.install(|| locations.par_iter().map(&scan).collect()),
        Err(err) => {
            log::warn!("parallel scan unavailable, scanning sequentially: {err}");
            locations.iter().map(&scan).collect()
        }
    }
}

fn group_by_repo(data: &ReportData, name: &str) -> RepositoryView {
    RepositoryView {
        name: name.to_string(),
        commits: data
            .commits
            .iter()
            .filter(|c| c.repo == name)
            .cloned()
            .collect(),
        staged: data
            .staged
            .iter()
            .filter(|f| f.repo == name)
            .cloned()
            .collect(),
        unstaged: data
            .unstaged
            .iter()
            .filter(|f| f.repo == name)
            .cloned()
            .collect(),
        branches: data
            .branches
            .iter()
            .filter(|b| b.repo == name)
            .cloned()
            .collect(),
    }
}
