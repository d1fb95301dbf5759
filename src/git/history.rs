use chrono::NaiveDate;

use crate::location::RepoLocation;

use super::{CommandError, GitRunner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LogEntry {
    pub(crate) hash: String,
    pub(crate) time: String,
    pub(crate) message: String,
}

/// Commits reachable from `branch` that were authored on `date`.
pub(crate) fn branch_log(
    repo: &RepoLocation,
    git: &dyn GitRunner,
    branch: &str,
    date: NaiveDate,
    author: Option<&str>,
) -> Result<Vec<LogEntry>, CommandError> {
    let since = format!("--since={date} 00:00");
    let until = format!("--until={date} 23:59");
    let author = author.map(|email| format!("--author={email}"));
    let mut args = vec!["log", branch, since.as_str(), until.as_str()];
    if let Some(author) = &author {
        args.push(author);
    }
    args.extend(["--pretty=format:%H|%ad|%s", "--date=format:%H:%M"]);
    let out = git.run_git(repo, &args)?;
    Ok(out.lines().filter_map(parse_log_line).collect())
}

/// `hash|HH:MM|subject`; the subject itself may contain `|`.
fn parse_log_line(line: &str) -> Option<LogEntry> {
    let line = line.trim_end_matches('\r');
    if line.trim().is_empty() {
        return None;
    }
    let mut parts = line.splitn(3, '|');
    let hash = parts.next()?.trim();
    let time = parts.next()?;
    let message = parts.next().unwrap_or_default();
    if hash.is_empty() {
        return None;
    }
    Some(LogEntry {
        hash: hash.to_string(),
        time: time.to_string(),
        message: message.to_string(),
    })
}
