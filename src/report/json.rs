//! JSON reporter for machine consumption.

use std::path::PathBuf;

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::analysis::AnalyzedFile;

#[derive(Serialize)]
struct JsonFinding<'a> {
    file: String,
    line: u32,
    column: u32,
    code: &'static str,
    rule: &'static str,
    severity: &'static str,
    message: &'a str,
    fixable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    fix_title: Option<&'a str>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    files_analyzed: usize,
    findings: Vec<JsonFinding<'a>>,
}

/// JSON reporter writing to stdout or a file
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, files: &[AnalyzedFile]) -> Result<()> {
        let findings: Vec<JsonFinding<'_>> = files
            .iter()
            .flat_map(|file| {
                file.findings.iter().map(|finding| JsonFinding {
                    file: file.path.display().to_string(),
                    line: finding.span.line,
                    column: finding.span.column,
                    code: finding.smell.code(),
                    rule: finding.smell.display_name(),
                    severity: finding.severity.as_str(),
                    message: &finding.message,
                    fixable: finding.fix.is_some(),
                    fix_title: finding.fix.as_ref().map(|f| f.title.as_str()),
                })
            })
            .collect();

        let report = JsonReport {
            version: env!("CARGO_PKG_VERSION"),
            files_analyzed: files.len(),
            findings,
        };

        match &self.output_path {
            Some(path) => {
                let writer = std::fs::File::create(path).into_diagnostic()?;
                serde_json::to_writer_pretty(writer, &report).into_diagnostic()?;
            }
            None => {
                let rendered = serde_json::to_string_pretty(&report).into_diagnostic()?;
                println!("{rendered}");
            }
        }
        Ok(())
    }
}
