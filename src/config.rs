//! Credentials and processing options.
//!
//! Credentials come from the environment (a `.env` file in the working
//! directory is loaded first). Processing options come from CLI flags.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

/// Fatal configuration errors. Raised before any network call.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("missing environment variables: {}", .names.join(", "))]
    #[diagnostic(
        code(tagger::config::missing_vars),
        help(
            "Set these variables in the environment or in a `.env` file in the \
             working directory."
        )
    )]
    MissingVars { names: Vec<String> },

    #[error("invalid library type \"{value}\"")]
    #[diagnostic(
        code(tagger::config::library_type),
        help("ZOTERO_LIBRARY_TYPE must be either `user` or `group`.")
    )]
    InvalidLibraryType { value: String },

    #[error("cannot read tags file {path}")]
    #[diagnostic(
        code(tagger::config::tags_file),
        help("Check that the file is readable UTF-8 text, or omit --tags-file.")
    )]
    TagsFileUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

pub const ENV_LIBRARY_ID: &str = "ZOTERO_LIBRARY_ID";
pub const ENV_LIBRARY_TYPE: &str = "ZOTERO_LIBRARY_TYPE";
pub const ENV_ZOTERO_API_KEY: &str = "ZOTERO_API_KEY";
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_ANTHROPIC_MODEL: &str = "ANTHROPIC_MODEL";
pub const ENV_ZOTERO_API_BASE: &str = "ZOTERO_API_BASE";

pub const DEFAULT_ZOTERO_API_BASE: &str = "https://api.zotero.org";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-sonnet-latest";

/// Whether the library belongs to a user or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LibraryType {
    User,
    #[default]
    Group,
}

impl LibraryType {
    /// Path segment used by the library API (`users` / `groups`).
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Group => "groups",
        }
    }
}

impl FromStr for LibraryType {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "group" => Ok(Self::Group),
            _ => Err(ConfigError::InvalidLibraryType { value: s.into() }),
        }
    }
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Group => "group",
        })
    }
}

/// Service credentials and endpoints.
#[derive(Clone)]
pub struct Config {
    pub library_id: String,
    pub library_type: LibraryType,
    pub zotero_api_key: String,
    pub zotero_api_base: String,
    pub anthropic_api_key: String,
    pub anthropic_model: String,
}

impl Config {
    /// Load from the process environment, after reading `.env` if present.
    pub fn from_env() -> ConfigResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// Every missing required variable is reported at once.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let library_id = get(ENV_LIBRARY_ID);
        let zotero_api_key = get(ENV_ZOTERO_API_KEY);
        let anthropic_api_key = get(ENV_ANTHROPIC_API_KEY);

        let missing: Vec<String> = [
            (ENV_LIBRARY_ID, library_id.is_none()),
            (ENV_ZOTERO_API_KEY, zotero_api_key.is_none()),
            (ENV_ANTHROPIC_API_KEY, anthropic_api_key.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| name.to_string())
        .collect();

        let (Some(library_id), Some(zotero_api_key), Some(anthropic_api_key)) =
            (library_id, zotero_api_key, anthropic_api_key)
        else {
            return Err(ConfigError::MissingVars { names: missing });
        };

        let library_type = match get(ENV_LIBRARY_TYPE) {
            Some(value) => value.parse()?,
            None => LibraryType::default(),
        };

        Ok(Self {
            library_id: library_id.trim().to_string(),
            library_type,
            zotero_api_key,
            zotero_api_base: get(ENV_ZOTERO_API_BASE)
                .map(|b| b.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_ZOTERO_API_BASE.into()),
            anthropic_api_key,
            anthropic_model: get(ENV_ANTHROPIC_MODEL)
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.into()),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("library_id", &self.library_id)
            .field("library_type", &self.library_type)
            .field("zotero_api_base", &self.zotero_api_base)
            .field("anthropic_model", &self.anthropic_model)
            .finish_non_exhaustive()
    }
}

/// When to fetch an item's link URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UrlMode {
    #[default]
    Never,
    /// Only when no PDF text was obtained.
    Fallback,
    /// Whenever the item has a URL.
    Always,
}

impl UrlMode {
    /// Resolve the two CLI flags. `always` takes precedence over `fallback`.
    pub fn from_flags(fallback: bool, always: bool) -> Self {
        if always {
            Self::Always
        } else if fallback {
            Self::Fallback
        } else {
            Self::Never
        }
    }
}

/// Per-run behavior selected on the command line.
#[derive(Debug, Clone)]
pub struct ProcessingOptions {
    pub url_mode: UrlMode,
    pub parse_pdf: bool,
    /// Send title-only items with a conservative prompt instead of skipping.
    pub title_only: bool,
    pub tags_file: Option<PathBuf>,
    pub limit: Option<usize>,
    /// Pause between items.
    pub delay: Duration,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            url_mode: UrlMode::Never,
            parse_pdf: false,
            title_only: false,
            tags_file: None,
            limit: None,
            delay: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn all_missing_reported_together() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        match err {
            ConfigError::MissingVars { names } => {
                assert_eq!(
                    names,
                    vec![ENV_LIBRARY_ID, ENV_ZOTERO_API_KEY, ENV_ANTHROPIC_API_KEY]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let err = Config::from_lookup(lookup(&[
            (ENV_LIBRARY_ID, "123"),
            (ENV_ZOTERO_API_KEY, "  "),
            (ENV_ANTHROPIC_API_KEY, "sk"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVars { names } if names == vec![ENV_ZOTERO_API_KEY]));
    }

    #[test]
    fn defaults_applied() {
        let config = Config::from_lookup(lookup(&[
            (ENV_LIBRARY_ID, "123"),
            (ENV_ZOTERO_API_KEY, "zk"),
            (ENV_ANTHROPIC_API_KEY, "ak"),
        ]))
        .unwrap();
        assert_eq!(config.library_type, LibraryType::Group);
        assert_eq!(config.zotero_api_base, DEFAULT_ZOTERO_API_BASE);
        assert_eq!(config.anthropic_model, DEFAULT_ANTHROPIC_MODEL);
    }

    #[test]
    fn library_type_parsed() {
        let config = Config::from_lookup(lookup(&[
            (ENV_LIBRARY_ID, "123"),
            (ENV_LIBRARY_TYPE, "User"),
            (ENV_ZOTERO_API_KEY, "zk"),
            (ENV_ANTHROPIC_API_KEY, "ak"),
            (ENV_ZOTERO_API_BASE, "http://localhost:8080/"),
        ]))
        .unwrap();
        assert_eq!(config.library_type, LibraryType::User);
        assert_eq!(config.zotero_api_base, "http://localhost:8080");
    }

    #[test]
    fn invalid_library_type_rejected() {
        let err = Config::from_lookup(lookup(&[
            (ENV_LIBRARY_ID, "123"),
            (ENV_LIBRARY_TYPE, "team"),
            (ENV_ZOTERO_API_KEY, "zk"),
            (ENV_ANTHROPIC_API_KEY, "ak"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLibraryType { .. }));
    }

    #[test]
    fn debug_hides_keys() {
        let config = Config::from_lookup(lookup(&[
            (ENV_LIBRARY_ID, "123"),
            (ENV_ZOTERO_API_KEY, "secret-zotero"),
            (ENV_ANTHROPIC_API_KEY, "secret-anthropic"),
        ]))
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn url_mode_precedence() {
        assert_eq!(UrlMode::from_flags(false, false), UrlMode::Never);
        assert_eq!(UrlMode::from_flags(true, false), UrlMode::Fallback);
        assert_eq!(UrlMode::from_flags(false, true), UrlMode::Always);
        assert_eq!(UrlMode::from_flags(true, true), UrlMode::Always);
    }
}
