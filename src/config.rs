//! Run configuration.
//!
//! Built once per analysis run - from `phpsniff.toml` plus CLI overrides -
//! and passed read-only into every detector invocation. No detector ever
//! mutates it.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Default config file name looked up in the analyzed project root.
pub const CONFIG_FILE_NAME: &str = "phpsniff.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Target PHP language level; gates version-dependent suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum PhpVersion {
    Php56,
    Php70,
    Php71,
    Php72,
    Php73,
    Php74,
    Php80,
    Php81,
}

impl PhpVersion {
    /// Whether `$callable(...)` is a safe direct-invocation syntax.
    pub fn supports_variable_call(self) -> bool {
        self >= PhpVersion::Php70
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PhpVersion::Php56 => "5.6",
            PhpVersion::Php70 => "7.0",
            PhpVersion::Php71 => "7.1",
            PhpVersion::Php72 => "7.2",
            PhpVersion::Php73 => "7.3",
            PhpVersion::Php74 => "7.4",
            PhpVersion::Php80 => "8.0",
            PhpVersion::Php81 => "8.1",
        }
    }
}

impl fmt::Display for PhpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PhpVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5.6" | "5" => Ok(PhpVersion::Php56),
            "7.0" | "7" => Ok(PhpVersion::Php70),
            "7.1" => Ok(PhpVersion::Php71),
            "7.2" => Ok(PhpVersion::Php72),
            "7.3" => Ok(PhpVersion::Php73),
            "7.4" => Ok(PhpVersion::Php74),
            "8.0" | "8" => Ok(PhpVersion::Php80),
            "8.1" => Ok(PhpVersion::Php81),
            other => Err(format!("unsupported PHP version '{other}'")),
        }
    }
}

impl TryFrom<String> for PhpVersion {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Per-run analysis configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Target PHP version of the analyzed codebase
    pub php_version: PhpVersion,

    /// Keep `$this->assert*()` in the PHPUnit_Framework_* family, as the
    /// PHPUnit documentation prescribes
    pub respect_phpunit_conventions: bool,

    /// Suggest rewriting `$array[$key] = ...` loops to by-reference
    /// iteration (aggressive; off by default)
    pub suggest_loop_by_reference: bool,

    /// Regex patterns for paths to skip during discovery
    pub exclude: Vec<String>,

    /// Detector names to run; `None` runs the full registry
    pub detectors: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            php_version: PhpVersion::Php74,
            respect_phpunit_conventions: true,
            suggest_loop_by_reference: false,
            exclude: Vec::new(),
            detectors: None,
        }
    }
}

impl Config {
    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    /// Load `phpsniff.toml` from the project root if present, defaults
    /// otherwise.
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        let candidate = root.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_conservative() {
        let config = Config::default();
        assert_eq!(config.php_version, PhpVersion::Php74);
        assert!(config.respect_phpunit_conventions);
        assert!(!config.suggest_loop_by_reference);
        assert!(config.detectors.is_none());
    }

    #[test]
    fn variable_call_support_starts_at_php7() {
        assert!(!PhpVersion::Php56.supports_variable_call());
        assert!(PhpVersion::Php70.supports_variable_call());
        assert!(PhpVersion::Php81.supports_variable_call());
    }

    #[test]
    fn parses_full_config() {
        let config: Config = toml::from_str(
            r#"
            php-version = "5.6"
            respect-phpunit-conventions = false
            suggest-loop-by-reference = true
            exclude = ["vendor/", "cache/"]
            detectors = ["nested-not", "assert-count"]
            "#,
        )
        .unwrap();
        assert_eq!(config.php_version, PhpVersion::Php56);
        assert!(!config.respect_phpunit_conventions);
        assert!(config.suggest_loop_by_reference);
        assert_eq!(config.exclude.len(), 2);
        assert_eq!(
            config.detectors,
            Some(vec!["nested-not".to_string(), "assert-count".to_string()])
        );
    }

    #[test]
    fn rejects_unknown_php_versions() {
        let parsed: Result<Config, _> = toml::from_str("php-version = \"4.4\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_file_discovers_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.php_version, PhpVersion::Php74);
    }
}
