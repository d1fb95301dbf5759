mod history;
mod refs;
mod runner;
mod worktree;

pub use refs::NO_REMOTE;
pub use runner::{CommandError, CommandFailure, DefaultGitRunner, GitRunner};

pub(crate) use history::branch_log;
pub(crate) use refs::{active_branches, current_branch, unpushed_count};
pub(crate) use worktree::{staged_files, unstaged_files, untracked_files};
