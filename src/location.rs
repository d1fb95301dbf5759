use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

const WSL_PATTERN: &str = r"(?i)^\\\\wsl(?:\.localhost|\$)\\([^\\]+)(.*)$";

static WSL_PATH: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(WSL_PATTERN).ok());

/// Where git commands for a configured directory are executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoTarget {
    Local(PathBuf),
    /// A path inside a WSL distribution, addressed from the Windows side.
    Wsl { distro: String, path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoLocation {
    pub raw: String,
    pub name: String,
    pub target: RepoTarget,
}

impl RepoLocation {
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self.target, RepoTarget::Wsl { .. })
    }
}

/// Resolve a configured directory string into a runnable location.
#[must_use]
pub fn resolve(path: &str) -> RepoLocation {
    let name = display_name(path);
    let target = match WSL_PATH.as_ref().and_then(|re| re.captures(path)) {
        Some(caps) => {
            let distro = caps.get(1).map_or("", |m| m.as_str()).to_string();
            let rest = caps.get(2).map_or("", |m| m.as_str()).replace('\\', "/");
            let trimmed = rest.trim_start_matches('/');
            RepoTarget::Wsl {
                distro,
                path: format!("/{trimmed}"),
            }
        }
        None => RepoTarget::Local(expand_tilde(path)),
    };
    RepoLocation {
        raw: path.to_string(),
        name,
        target,
    }
}

/// Last non-empty segment of `path`, splitting on both separators.
#[must_use]
pub fn display_name(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .next_back()
        .map_or_else(|| path.to_string(), str::to_string)
}

pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        if path == "~" {
            return home;
        }
        if let Some(rest) = path.strip_prefix("~/") {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_wsl_localhost_paths() {
        let loc = resolve(r"\\wsl.localhost\Ubuntu\home\me\project");
        assert!(loc.is_remote());
        assert_eq!(loc.name, "project");
        assert_eq!(
            loc.target,
            RepoTarget::Wsl {
                distro: "Ubuntu".to_string(),
                path: "/home/me/project".to_string(),
            }
        );
    }

    #[test]
    fn resolves_legacy_wsl_share_case_insensitively() {
        let loc = resolve(r"\\WSL$\Debian\srv\repo\");
        assert_eq!(
            loc.target,
            RepoTarget::Wsl {
                distro: "Debian".to_string(),
                path: "/srv/repo/".to_string(),
            }
        );
        assert_eq!(loc.name, "repo");
    }

    #[test]
    fn distro_root_maps_to_slash() {
        let loc = resolve(r"\\wsl.localhost\Ubuntu");
        assert_eq!(
            loc.target,
            RepoTarget::Wsl {
                distro: "Ubuntu".to_string(),
                path: "/".to_string(),
            }
        );
    }

    #[test]
    fn other_unc_paths_stay_local() {
        let loc = resolve(r"\\server\share\repo");
        assert!(!loc.is_remote());
        assert_eq!(loc.name, "repo");
    }

    #[test]
    fn leading_tilde_expands_to_home() {
        let Some(home) = std::env::var_os("HOME").map(PathBuf::from) else {
            return;
        };
        let loc = resolve("~/src/app");
        assert_eq!(loc.target, RepoTarget::Local(home.join("src/app")));
        assert_eq!(loc.name, "app");
        assert_eq!(loc.raw, "~/src/app");
        assert_eq!(expand_tilde("~"), home);
        assert_eq!(expand_tilde("a/~/b"), PathBuf::from("a/~/b"));
        assert_eq!(expand_tilde("~other/x"), PathBuf::from("~other/x"));
    }

    #[test]
    fn display_name_handles_separators() {
        assert_eq!(display_name("/home/me/app/"), "app");
        assert_eq!(display_name(r"C:\work\tool"), "tool");
        assert_eq!(display_name("plain"), "plain");
        assert_eq!(display_name("///"), "///");
    }
}
