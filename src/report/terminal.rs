//! Terminal reporter with colored per-file output.

use colored::Colorize;
use miette::Result;

use crate::analysis::{AnalyzedFile, Finding, Severity};

/// Terminal reporter with colored output
pub struct TerminalReporter {
    /// Show a hint on findings that carry an automatic fix
    show_fix_hints: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self {
            show_fix_hints: true,
        }
    }

    pub fn with_fix_hints(mut self, show: bool) -> Self {
        self.show_fix_hints = show;
        self
    }

    pub fn report(&self, files: &[AnalyzedFile]) -> Result<()> {
        let total: usize = files.iter().map(|f| f.findings.len()).sum();
        if total == 0 {
            println!("{}", "No code smells found!".green().bold());
            return Ok(());
        }

        println!();
        println!("Found {} code smells:", total.to_string().cyan().bold());
        println!();

        for file in files {
            if file.findings.is_empty() {
                continue;
            }
            println!("{}", file.path.display().to_string().underline());
            for finding in &file.findings {
                self.print_finding(finding);
            }
            println!();
        }

        Ok(())
    }

    fn print_finding(&self, finding: &Finding) {
        let symbol = match finding.severity {
            Severity::Error => "✗".red().bold(),
            Severity::Warning => "!".yellow().bold(),
            Severity::WeakWarning => "~".dimmed(),
        };
        let location = format!("{}:{}", finding.span.line, finding.span.column);
        let fix_hint = if self.show_fix_hints && finding.fix.is_some() {
            " [fixable]".green().to_string()
        } else {
            String::new()
        };
        println!(
            "  {} {} {} {}{}",
            symbol,
            location.dimmed(),
            finding.message,
            finding.smell.code().dimmed(),
            fix_hint
        );
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}
