use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::location::expand_tilde;

/// The classic daily-log layout. Empty sections are left out.
pub const DEFAULT_TEMPLATE: &str = "\
{{#if commits}}
### Commits
{{#each commits}}
- {{time}} [{{repo}}] {{message}}
{{/each}}

{{/if}}
{{#if staged}}
### Staged
{{#each staged}}
- [{{repo}}] {{file}}
{{/each}}

{{/if}}
{{#if unstaged}}
### Unstaged
{{#each unstaged}}
- [{{repo}}] {{file}}
{{/each}}

{{/if}}
({{timestamp}})

---

";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {message}")]
    Invalid { message: String },
    #[error("failed to read template file {}: {source}", path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub directories: Vec<String>,
    pub author_email: Option<String>,
    pub template: Option<String>,
    pub template_file: Option<String>,
    pub jobs: Option<usize>,
}

impl Config {
    /// Inline template, else the template file's contents, else [`DEFAULT_TEMPLATE`].
    ///
    /// # Errors
    /// Returns [`ConfigError::TemplateRead`] when `template-file` cannot be read.
    pub fn template_text(&self) -> Result<String, ConfigError> {
        if let Some(inline) = &self.template {
            return Ok(inline.clone());
        }
        match &self.template_file {
            Some(file) => read_template_file(&expand_tilde(file)),
            None => Ok(DEFAULT_TEMPLATE.to_string()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.template.is_some() && self.template_file.is_some() {
            return Err(ConfigError::Invalid {
                message: "`template` and `template-file` cannot both be set".to_string(),
            });
        }
        if self.jobs == Some(0) {
            return Err(ConfigError::Invalid {
                message: "`jobs` must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// # Errors
/// Returns an error when the file cannot be read, is not valid TOML for
/// [`Config`], or sets conflicting options.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

/// `<config dir>/gitlog-summary/config.toml`, if the platform has a config dir.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("gitlog-summary").join("config.toml"))
}

/// # Errors
/// Returns [`ConfigError::TemplateRead`] when the file cannot be read.
pub fn read_template_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::TemplateRead {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::template::Template;

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, body).expect("write config");
        path
    }

    #[test]
    fn loads_kebab_case_keys() {
        let dir = TempDir::new().expect("tempdir");
        let path = write_config(
            &dir,
            r#"
directories = ["~/src/app", '\\wsl.localhost\Ubuntu\home\me\lib']
author-email = "me@example.com"
template = "{{timestamp}}"
jobs = 2
"#,
        );
        let config = load_config(&path).expect("valid config");
        assert_eq!(
            config.directories,
            vec!["~/src/app", r"\\wsl.localhost\Ubuntu\home\me\lib"]
        );
        assert_eq!(config.author_email.as_deref(), Some("me@example.com"));
        assert_eq!(config.jobs, Some(2));
        assert_eq!(config.template_text().expect("inline"), "{{timestamp}}");
    }

    #[test]
    fn empty_file_uses_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let config = load_config(&write_config(&dir, "")).expect("valid config");
        assert_eq!(config, Config::default());
        assert_eq!(config.template_text().expect("default"), DEFAULT_TEMPLATE);
    }

    #[test]
    fn template_file_is_read() {
        let dir = TempDir::new().expect("tempdir");
        let template_path = dir.path().join("log.hbs");
        fs::write(&template_path, "{{date}}\n").expect("write");
        let config = Config {
            template_file: Some(template_path.display().to_string()),
            ..Config::default()
        };
        assert_eq!(config.template_text().expect("file"), "{{date}}\n");

        let missing = Config {
            template_file: Some(dir.path().join("nope.hbs").display().to_string()),
            ..Config::default()
        };
        assert!(matches!(
            missing.template_text(),
            Err(ConfigError::TemplateRead { .. })
        ));
    }

    #[test]
    fn rejects_conflicting_and_unknown_settings() {
        let dir = TempDir::new().expect("tempdir");
        let both = write_config(&dir, "template = \"x\"\ntemplate-file = \"y\"\n");
        let err = load_config(&both).expect_err("conflicting templates");
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let zero_jobs = write_config(&dir, "jobs = 0\n");
        let err = load_config(&zero_jobs).expect_err("zero jobs");
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let unknown = write_config(&dir, "depth = 3\n");
        let err = load_config(&unknown).expect_err("unknown key");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("absent.toml");
        let err = load_config(&path).expect_err("missing");
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().starts_with("failed to read config"));
    }

    #[test]
    fn default_template_renders_classic_layout() {
        let template = Template::compile(DEFAULT_TEMPLATE).expect("compiles");
        let data = json!({
            "timestamp": "2024-05-02 18:00",
            "commits": [
                {"time": "08:30", "message": "first", "repo": "b", "branch": "main"},
                {"time": "09:00", "message": "second", "repo": "a", "branch": "main"},
            ],
            "staged": [{"repo": "a", "file": "src/lib.rs"}],
            "unstaged": [],
        });
        assert_eq!(
            template.render(&data),
            "### Commits\n- 08:30 [b] first\n- 09:00 [a] second\n\n\
             ### Staged\n- [a] src/lib.rs\n\n\
             (2024-05-02 18:00)\n\n---\n\n"
        );
    }

    #[test]
    fn default_template_with_nothing_to_report() {
        let template = Template::compile(DEFAULT_TEMPLATE).expect("compiles");
        let data = json!({"timestamp": "2024-05-02 18:00", "commits": []});
        assert_eq!(template.render(&data), "(2024-05-02 18:00)\n\n---\n\n");
    }
}
