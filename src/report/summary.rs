//! End-of-run summary: totals per severity and per rule.

use std::collections::BTreeMap;

use colored::Colorize;

use crate::analysis::{AnalyzedFile, Severity};

/// Summary statistics reporter
pub struct SummaryReporter;

impl SummaryReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report(&self, files: &[AnalyzedFile]) {
        let total: usize = files.iter().map(|f| f.findings.len()).sum();
        if total == 0 {
            return;
        }

        let mut errors = 0usize;
        let mut warnings = 0usize;
        let mut weak = 0usize;
        let mut by_rule: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut fixable = 0usize;

        for file in files {
            for finding in &file.findings {
                match finding.severity {
                    Severity::Error => errors += 1,
                    Severity::Warning => warnings += 1,
                    Severity::WeakWarning => weak += 1,
                }
                *by_rule.entry(finding.smell.code()).or_default() += 1;
                if finding.fix.is_some() {
                    fixable += 1;
                }
            }
        }

        println!("{}", "Summary".bold());
        println!(
            "  {} errors, {} warnings, {} weak warnings in {} files",
            errors.to_string().red(),
            warnings.to_string().yellow(),
            weak,
            files.iter().filter(|f| !f.findings.is_empty()).count()
        );
        for (code, count) in by_rule {
            println!("  {} {}", code.dimmed(), count);
        }
        if fixable > 0 {
            println!(
                "  {} finding(s) can be fixed automatically with {}",
                fixable.to_string().green(),
                "--fix".bold()
            );
        }
    }
}

impl Default for SummaryReporter {
    fn default() -> Self {
        Self::new()
    }
}
