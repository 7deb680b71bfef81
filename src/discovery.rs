//! Source file discovery: walks the project root with gitignore rules
//! applied and returns every `.php` file that no exclude pattern hits.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: String,
        #[source]
        source: ignore::Error,
    },
}

/// Finder for PHP source files.
pub struct FileFinder {
    excludes: Vec<Regex>,
}

impl FileFinder {
    pub fn new(config: &Config) -> Result<Self, DiscoveryError> {
        let excludes = config
            .exclude
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| DiscoveryError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { excludes })
    }

    /// All `.php` files under `root`, sorted for deterministic output.
    /// A single-file root is returned as-is when it matches.
    pub fn find_files(&self, root: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
        if root.is_file() {
            return Ok(if is_php(root) && !self.is_excluded(root) {
                vec![root.to_path_buf()]
            } else {
                Vec::new()
            });
        }

        let mut files = Vec::new();
        for entry in WalkBuilder::new(root).build() {
            let entry = entry.map_err(|source| DiscoveryError::Walk {
                path: root.display().to_string(),
                source,
            })?;
            let path = entry.path();
            if entry.file_type().is_some_and(|t| t.is_file())
                && is_php(path)
                && !self.is_excluded(path)
            {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
        debug!(count = files.len(), "discovered PHP files");
        Ok(files)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let text = path.to_string_lossy();
        self.excludes.iter().any(|re| re.is_match(&text))
    }
}

fn is_php(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("php"))
}
