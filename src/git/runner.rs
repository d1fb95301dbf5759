use std::process::{Command, Output, Stdio};

use crate::location::{RepoLocation, RepoTarget};

#[derive(Debug, thiserror::Error)]
#[error("`{command}` failed in {repo}: {cause}")]
pub struct CommandError {
    pub repo: String,
    pub command: String,
    pub cause: CommandFailure,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandFailure {
    #[error("could not launch process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("exit code {}: {stderr}", describe_code(.code))]
    Exit { code: Option<i32>, stderr: String },
}

#[allow(clippy::ref_option)]
fn describe_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

impl CommandError {
    #[must_use]
    pub fn new(repo: &RepoLocation, args: &[&str], cause: CommandFailure) -> Self {
        Self {
            repo: repo.raw.clone(),
            command: command_line(args),
            cause,
        }
    }
}

pub trait GitRunner: Sync {
    /// Run `git` with `args` against `repo` and return its raw standard output.
    ///
    /// # Errors
    /// Returns a [`CommandError`] when the process cannot be spawned or exits non-zero.
    fn run_git(&self, repo: &RepoLocation, args: &[&str]) -> Result<String, CommandError>;
}

/// Runs the system `git`, routing WSL locations through `wsl.exe`.
pub struct DefaultGitRunner;

impl GitRunner for DefaultGitRunner {
    fn run_git(&self, repo: &RepoLocation, args: &[&str]) -> Result<String, CommandError> {
        let route = if repo.is_remote() { "wsl.exe" } else { "git" };
        log::debug!("[{}] {} ({route})", repo.name, command_line(args));
        let mut command = match &repo.target {
            RepoTarget::Local(path) => {
                let mut c = Command::new("git");
                c.arg("-C").arg(path).args(args);
                c
            }
            RepoTarget::Wsl { distro, path } => {
                let mut c = Command::new("wsl.exe");
                c.args(wsl_args(distro, path, args));
                c
            }
        };
        let output = command
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| {
                CommandError::new(repo, args, CommandFailure::Spawn(source))
            })?;
        into_stdout(repo, args, output)
    }
}

fn into_stdout(repo: &RepoLocation, args: &[&str], out: Output) -> Result<String, CommandError> {
    if out.status.success() {
        return Ok(String::from_utf8_lossy(&out.stdout).into_owned());
    }
    Err(CommandError::new(
        repo,
        args,
        CommandFailure::Exit {
            code: out.status.code(),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        },
    ))
}

/// Argument vector for `wsl.exe`. Only the inner script passes through a shell,
/// and every piece interpolated into it is quoted.
pub(crate) fn wsl_args(distro: &str, path: &str, args: &[&str]) -> Vec<String> {
    let mut script = format!("cd {} && git", shell_quote(path));
    for arg in args {
        script.push(' ');
        script.push_str(&shell_quote(arg));
    }
    vec![
        "-d".to_string(),
        distro.to_string(),
        "--".to_string(),
        "bash".to_string(),
        "-c".to_string(),
        script,
    ]
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn command_line(args: &[&str]) -> String {
    let mut line = String::from("git");
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::resolve;

    #[test]
    fn wsl_args_quote_path_and_arguments() {
        let args = wsl_args(
            "Ubuntu",
            "/home/me/it's here",
            &["log", "--author=a@b.c; rm -rf /"],
        );
        assert_eq!(&args[..5], ["-d", "Ubuntu", "--", "bash", "-c"]);
        assert_eq!(
            args[5],
            r"cd '/home/me/it'\''s here' && git 'log' '--author=a@b.c; rm -rf /'"
        );
    }

    #[test]
    fn error_display_names_repo_and_command() {
        let loc = resolve("/tmp/repo");
        let err = CommandError::new(
            &loc,
            &["diff", "--name-only"],
            CommandFailure::Exit {
                code: Some(128),
                stderr: "not a git repository".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "`git diff --name-only` failed in /tmp/repo: exit code 128: not a git repository"
        );
    }

    #[cfg(unix)]
    #[test]
    fn missing_directory_surfaces_as_command_error() {
        let loc = resolve("/definitely/not/a/real/repo/path");
        let err = DefaultGitRunner
            .run_git(&loc, &["rev-parse", "--abbrev-ref", "HEAD"])
            .expect_err("should fail");
        assert_eq!(err.repo, "/definitely/not/a/real/repo/path");
        assert_eq!(err.command, "git rev-parse --abbrev-ref HEAD");
    }
}
