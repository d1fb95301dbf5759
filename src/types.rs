use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    /// Local author time, `HH:MM`.
    pub time: String,
    pub message: String,
    pub repo: String,
    pub branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChangeRecord {
    pub repo: String,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchStatus {
    pub repo: String,
    pub name: String,
    pub is_pushed: bool,
    /// `-1` when the branch has no `origin` counterpart.
    pub unpushed_count: i64,
}

impl BranchStatus {
    #[must_use]
    pub fn new(repo: &str, name: &str, unpushed_count: i64) -> Self {
        Self {
            repo: repo.to_string(),
            name: name.to_string(),
            is_pushed: unpushed_count == 0,
            unpushed_count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepositoryView {
    pub name: String,
    pub commits: Vec<CommitRecord>,
    pub staged: Vec<FileChangeRecord>,
    pub unstaged: Vec<FileChangeRecord>,
    pub branches: Vec<BranchStatus>,
}

/// What one repository contributed to a report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoScan {
    pub commits: Vec<CommitRecord>,
    pub staged: Vec<FileChangeRecord>,
    pub unstaged: Vec<FileChangeRecord>,
    pub branches: Vec<BranchStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportData {
    pub commits: Vec<CommitRecord>,
    pub staged: Vec<FileChangeRecord>,
    pub unstaged: Vec<FileChangeRecord>,
    pub branches: Vec<BranchStatus>,
    pub repositories: Vec<RepositoryView>,
}

/// Root object handed to the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportContext {
    pub commits: Vec<CommitRecord>,
    pub staged: Vec<FileChangeRecord>,
    pub unstaged: Vec<FileChangeRecord>,
    pub branches: Vec<BranchStatus>,
    pub repositories: Vec<RepositoryView>,
    /// `YYYY-MM-DD HH:MM`, local time of the report.
    pub timestamp: String,
    /// `YYYY-MM-DD`, the day being summarized.
    pub date: String,
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub directories: Vec<String>,
    pub author_email: Option<String>,
    pub template: String,
    /// Day to summarize; defaults to today in local time.
    pub date: Option<NaiveDate>,
    /// Scan workers; `None` uses one per CPU.
    pub jobs: Option<usize>,
}

impl Options {
    /// Author filter with blank values treated as absent.
    #[must_use]
    pub fn author(&self) -> Option<&str> {
        self.author_email
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
