//! Configuration management for md2wiki.
//!
//! Settings come from three layers, highest priority first:
//!
//! 1. command-line flags,
//! 2. environment variables (`CONFLUENCE_USERNAME`, `CONFLUENCE_API_KEY`,
//!    `CONFLUENCE_ORGNAME`),
//! 3. an optional `md2wiki.toml` file, discovered in the current directory
//!    and its parents or passed explicitly.
//!
//! The first two layers are merged by the CLI parser and handed over as
//! [`CliSettings`]; this crate applies them on top of the file.
//!
//! ## Environment Variable Expansion
//!
//! String values in the file support `${VAR}` and `${VAR:-default}`.
//! Expanded fields:
//! - `confluence.username`
//! - `confluence.api_key`
//! - `confluence.org_name`
//! - `publish.markdown_source`
//! - `publish.reference_style`

mod expand;

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "md2wiki.toml";

/// Settings taken from the command line (flag or environment variable).
///
/// Only `Some` values (and non-empty label lists) override the file.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Confluence username.
    pub username: Option<String>,
    /// Confluence API key.
    pub api_key: Option<String>,
    /// Organisation name or fully qualified host.
    pub org_name: Option<String>,
    /// Use plain HTTP.
    pub no_ssl: Option<bool>,
    /// Editor version of the page (1 or 2).
    pub editor_version: Option<u8>,
    /// Markdown source dialect for local references.
    pub markdown_source: Option<String>,
    /// Footnote reference style.
    pub reference_style: Option<String>,
    /// Insert a table of contents.
    pub contents: Option<bool>,
    /// Labels to set on the page.
    pub labels: Vec<String>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Connection and credentials.
    pub confluence: ConfluenceConfig,
    /// Conversion and publishing options.
    pub publish: PublishConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// `[confluence]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfluenceConfig {
    /// Confluence username.
    pub username: Option<String>,
    /// Confluence API key.
    pub api_key: Option<String>,
    /// Organisation name (`acme` for `acme.atlassian.net`) or a host with a dot.
    pub org_name: Option<String>,
    /// Use `http://` instead of `https://`.
    pub no_ssl: bool,
}

/// `[publish]` section.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Editor version stored on created pages.
    pub editor_version: u8,
    /// Markdown processor the document was written for.
    pub markdown_source: Option<String>,
    /// How footnote references are rendered.
    pub reference_style: Option<String>,
    /// Insert a table of contents macro.
    pub contents: bool,
    /// Labels to set on the page.
    pub labels: Vec<String>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            editor_version: 1,
            markdown_source: None,
            reference_style: None,
            contents: false,
            labels: Vec::new(),
        }
    }
}

/// Validated connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfluenceSettings {
    /// Confluence username.
    pub username: String,
    /// Confluence API key.
    pub api_key: String,
    /// Organisation name or host.
    pub org_name: String,
    /// Use plain HTTP.
    pub no_ssl: bool,
}

impl ConfluenceSettings {
    /// Base URL of the Confluence instance.
    ///
    /// An organisation name without a dot is a cloud tenant
    /// (`https://ORG.atlassian.net/wiki`); anything with a dot is taken as a
    /// host (plus optional path) of its own.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.no_ssl { "http" } else { "https" };
        let org = self.org_name.trim_end_matches('/');
        if org.contains('.') {
            format!("{scheme}://{org}")
        } else {
            format!("{scheme}://{org}.atlassian.net/wiki")
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`confluence.api_key`").
        field: String,
        /// Error message (e.g., "${`CONFLUENCE_API_KEY`} not set").
        message: String,
    },
}

/// Require an optional string to be present and non-empty.
fn require(value: Option<&String>, what: &str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.clone()),
        _ => Err(ConfigError::Validation(format!(
            "{what} not specified by option, environment variable or config file"
        ))),
    }
}

impl Config {
    /// Load configuration and apply CLI settings on top.
    ///
    /// With `config_path` the file must exist. Without it, `md2wiki.toml` is
    /// searched in the current directory and its parents; no file at all is
    /// fine and yields defaults.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit path doesn't exist, parsing or env
    /// expansion fails, or the merged values are invalid.
    pub fn load(config_path: Option<&Path>, cli_settings: &CliSettings) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        config.apply_cli_settings(cli_settings);
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text (no discovery, no CLI settings).
    ///
    /// # Errors
    ///
    /// Returns error if parsing or env expansion fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        Ok(config)
    }

    /// Get validated connection settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if username, API key or organisation
    /// name are missing.
    pub fn require_confluence(&self) -> Result<ConfluenceSettings, ConfigError> {
        let conf = &self.confluence;
        Ok(ConfluenceSettings {
            username: require(conf.username.as_ref(), "Username")?,
            api_key: require(conf.api_key.as_ref(), "API key")?,
            org_name: require(conf.org_name.as_ref(), "Org name")?,
            no_ssl: conf.no_ssl,
        })
    }

    /// Validate values that don't depend on the command being run.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the editor version isn't 1 or 2.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.publish.editor_version, 1 | 2) {
            return Err(ConfigError::Validation(format!(
                "publish.editor_version must be 1 or 2, got {}",
                self.publish.editor_version
            )));
        }
        Ok(())
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        let conf = &mut self.confluence;
        if let Some(username) = &settings.username {
            conf.username = Some(username.clone());
        }
        if let Some(api_key) = &settings.api_key {
            conf.api_key = Some(api_key.clone());
        }
        if let Some(org_name) = &settings.org_name {
            conf.org_name = Some(org_name.clone());
        }
        if let Some(no_ssl) = settings.no_ssl {
            conf.no_ssl = no_ssl;
        }

        let publish = &mut self.publish;
        if let Some(version) = settings.editor_version {
            publish.editor_version = version;
        }
        if let Some(source) = &settings.markdown_source {
            publish.markdown_source = Some(source.clone());
        }
        if let Some(style) = &settings.reference_style {
            publish.reference_style = Some(style.clone());
        }
        if let Some(contents) = settings.contents {
            publish.contents = contents;
        }
        if !settings.labels.is_empty() {
            publish.labels.clone_from(&settings.labels);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let conf = &mut self.confluence;
        expand::expand_opt(&mut conf.username, "confluence.username")?;
        expand::expand_opt(&mut conf.api_key, "confluence.api_key")?;
        expand::expand_opt(&mut conf.org_name, "confluence.org_name")?;

        let publish = &mut self.publish;
        expand::expand_opt(&mut publish.markdown_source, "publish.markdown_source")?;
        expand::expand_opt(&mut publish.reference_style, "publish.reference_style")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings(org: &str, no_ssl: bool) -> ConfluenceSettings {
        ConfluenceSettings {
            username: "user".to_owned(),
            api_key: "key".to_owned(),
            org_name: org.to_owned(),
            no_ssl,
        }
    }

    #[test]
    fn test_base_url_cloud_tenant() {
        assert_eq!(
            settings("acme", false).base_url(),
            "https://acme.atlassian.net/wiki"
        );
    }

    #[test]
    fn test_base_url_fqdn() {
        assert_eq!(
            settings("wiki.example.com", false).base_url(),
            "https://wiki.example.com"
        );
    }

    #[test]
    fn test_base_url_no_ssl() {
        assert_eq!(
            settings("acme", true).base_url(),
            "http://acme.atlassian.net/wiki"
        );
        assert_eq!(
            settings("wiki.example.com/", true).base_url(),
            "http://wiki.example.com"
        );
    }

    #[test]
    fn test_from_toml_full() {
        let config = Config::from_toml(
            r#"
[confluence]
username = "jdoe"
api_key = "secret"
org_name = "acme"
no_ssl = true

[publish]
editor_version = 2
markdown_source = "bitbucket"
reference_style = "inline"
contents = true
labels = ["docs", "generated"]
"#,
        )
        .unwrap();

        assert_eq!(config.confluence.username.as_deref(), Some("jdoe"));
        assert!(config.confluence.no_ssl);
        assert_eq!(config.publish.editor_version, 2);
        assert_eq!(config.publish.markdown_source.as_deref(), Some("bitbucket"));
        assert!(config.publish.contents);
        assert_eq!(config.publish.labels, vec!["docs", "generated"]);
    }

    #[test]
    fn test_from_toml_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.publish.editor_version, 1);
        assert!(config.confluence.username.is_none());
        assert!(!config.publish.contents);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = Config::from_toml("[confluence]\npassword = \"x\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_cli_settings_override_file() {
        let mut config = Config::from_toml(
            r#"
[confluence]
username = "file-user"
org_name = "file-org"

[publish]
labels = ["from-file"]
"#,
        )
        .unwrap();

        config.apply_cli_settings(&CliSettings {
            username: Some("cli-user".to_owned()),
            api_key: Some("cli-key".to_owned()),
            labels: vec!["from-cli".to_owned()],
            ..Default::default()
        });

        let conf = config.require_confluence().unwrap();
        assert_eq!(conf.username, "cli-user");
        assert_eq!(conf.api_key, "cli-key");
        assert_eq!(conf.org_name, "file-org");
        assert_eq!(config.publish.labels, vec!["from-cli"]);
    }

    #[test]
    fn test_empty_cli_labels_keep_file_labels() {
        let mut config = Config::from_toml("[publish]\nlabels = [\"a\"]\n").unwrap();
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.publish.labels, vec!["a"]);
    }

    #[test]
    fn test_require_confluence_missing_username() {
        let config = Config::from_toml("[confluence]\napi_key = \"k\"\norg_name = \"o\"\n").unwrap();
        let err = config.require_confluence().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("Username"));
    }

    #[test]
    fn test_require_confluence_blank_api_key() {
        let config = Config::from_toml(
            "[confluence]\nusername = \"u\"\napi_key = \"  \"\norg_name = \"o\"\n",
        )
        .unwrap();
        let err = config.require_confluence().unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn test_invalid_editor_version() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings {
            editor_version: Some(3),
            ..Default::default()
        });
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = Config::load(
            Some(Path::new("/nonexistent/md2wiki.toml")),
            &CliSettings::default(),
        );
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[confluence]\norg_name = \"acme\"\n").unwrap();

        let config = Config::load(Some(&path), &CliSettings::default()).unwrap();
        assert_eq!(config.confluence.org_name.as_deref(), Some("acme"));
        assert_eq!(config.config_path, Some(path));
    }
}
