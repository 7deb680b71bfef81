mod compact;
mod json;
mod summary;
mod terminal;

pub use compact::CompactReporter;
pub use json::JsonReporter;
pub use summary::SummaryReporter;
pub use terminal::TerminalReporter;

use std::path::PathBuf;

use miette::Result;

use crate::analysis::AnalyzedFile;

/// Output format for reports
#[derive(Debug, Clone, Default)]
pub enum ReportFormat {
    /// Default terminal output, grouped per file
    #[default]
    Terminal,
    /// Compact one-line-per-issue format
    Compact,
    /// JSON machine-readable format
    Json,
}

/// Reporter facade dispatching to the concrete format.
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self {
            format,
            output_path,
        }
    }

    /// Report the findings of every analyzed file.
    pub fn report(&self, files: &[AnalyzedFile]) -> Result<()> {
        match &self.format {
            ReportFormat::Terminal => {
                TerminalReporter::new().report(files)?;
                self.print_final_summary(files);
                Ok(())
            }
            ReportFormat::Compact => {
                CompactReporter::new().report(files);
                self.print_final_summary(files);
                Ok(())
            }
            ReportFormat::Json => JsonReporter::new(self.output_path.clone()).report(files),
        }
    }

    fn print_final_summary(&self, files: &[AnalyzedFile]) {
        SummaryReporter::new().report(files);
    }
}
