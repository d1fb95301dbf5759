#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

mod git;
mod report;
mod system;
mod types;

pub mod config;
pub mod location;
pub mod output;
pub mod template;

pub use config::{Config, ConfigError, DEFAULT_TEMPLATE, load_config};
pub use git::{CommandError, CommandFailure, DefaultGitRunner, GitRunner, NO_REMOTE};
pub use location::{RepoLocation, RepoTarget};
pub use report::{
    ReportError, ScanError, build_context, collect_report_data, generate_report, render_report,
    report_date,
};
pub use system::{Clock, DefaultClock};
pub use template::{Template, TemplateError};
pub use types::{
    BranchStatus, CommitRecord, FileChangeRecord, Options, ReportContext, ReportData,
    RepositoryView,
};
