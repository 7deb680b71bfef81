//! Compact reporter: one line per finding, grep-friendly.

use crate::analysis::AnalyzedFile;

/// One-line-per-issue reporter
pub struct CompactReporter;

impl CompactReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report(&self, files: &[AnalyzedFile]) {
        for file in files {
            for finding in &file.findings {
                println!(
                    "{}:{}:{}: [{}] {} ({})",
                    file.path.display(),
                    finding.span.line,
                    finding.span.column,
                    finding.smell.code(),
                    finding.message,
                    finding.severity
                );
            }
        }
    }
}

impl Default for CompactReporter {
    fn default() -> Self {
        Self::new()
    }
}
