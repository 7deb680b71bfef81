use std::path::PathBuf;
use std::time::Instant;

use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use colored::Colorize;
use indicatif::ProgressBar;
use miette::{miette, IntoDiagnostic, Result};
use rayon::prelude::*;
use tracing::{info, warn};

use phpsniff::analysis::{AnalyzedFile, Analyzer};
use phpsniff::config::{Config, PhpVersion};
use phpsniff::discovery::FileFinder;
use phpsniff::fix::{Fix, FixApplier};
use phpsniff::parser::PhpParser;
use phpsniff::report::{ReportFormat, Reporter};
use phpsniff::watch::FileWatcher;

/// phpsniff - fast PHP code smell detection with mechanical fixes
#[derive(Parser, Debug)]
#[command(name = "phpsniff")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the project directory (or single file) to analyze
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file (default: <path>/phpsniff.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Patterns to exclude (can be specified multiple times)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Detectors to run (comma-separated names, e.g. "nested-not,assert-count")
    #[arg(long)]
    detect: Option<String>,

    /// Target PHP version (e.g. "5.6", "7.4", "8.1")
    #[arg(long)]
    php_version: Option<PhpVersion>,

    /// Suggest rewriting array-index writes to by-reference iteration
    #[arg(long)]
    suggest_ref_loops: bool,

    /// Do not exempt the PHPUnit_Framework_* family from the static-call check
    #[arg(long)]
    no_phpunit_convention: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    format: OutputFormat,

    /// Output file (for json format)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Apply available fixes to the source files
    #[arg(long)]
    fix: bool,

    /// With --fix: show what would change without writing files
    #[arg(long)]
    dry_run: bool,

    /// With --fix: apply every fix without asking
    #[arg(short = 'y', long)]
    yes: bool,

    /// Watch mode - continuously monitor for changes
    #[arg(long)]
    watch: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,

    /// Generate shell completions
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[derive(clap::ValueEnum, Clone, Debug, Default)]
enum OutputFormat {
    #[default]
    Terminal,
    Compact,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle shell completions
    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }

    init_logging(cli.verbose, cli.quiet);

    info!("phpsniff v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;

    if cli.watch {
        run_watch_mode(&config, &cli)?;
        return Ok(());
    }

    let remaining = run_analysis(&config, &cli)?;
    if remaining > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path).into_diagnostic()?,
        None => Config::discover(&cli.path).into_diagnostic()?,
    };

    // CLI flags override the file
    if let Some(version) = cli.php_version {
        config.php_version = version;
    }
    if cli.suggest_ref_loops {
        config.suggest_loop_by_reference = true;
    }
    if cli.no_phpunit_convention {
        config.respect_phpunit_conventions = false;
    }
    config.exclude.extend(cli.exclude.iter().cloned());
    if let Some(detect) = &cli.detect {
        config.detectors = Some(
            detect
                .split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
        );
    }
    Ok(config)
}

fn run_watch_mode(config: &Config, cli: &Cli) -> Result<()> {
    // initial run, then re-run on every change batch
    let _ = run_analysis(config, cli);
    println!();
    println!("{}", "Watching for changes... (ctrl-c to stop)".cyan());

    let watcher = FileWatcher::new();
    watcher
        .watch(&cli.path, || {
            match run_analysis(config, cli) {
                Ok(_) => {
                    println!();
                    println!("{}", "✓ Analysis complete. Waiting for changes...".green());
                }
                Err(error) => {
                    eprintln!("{}: {}", "Analysis error".red(), error);
                }
            }
            true
        })
        .map_err(|e| miette!("watch error: {e}"))?;
    Ok(())
}

/// Runs one full discovery + analysis pass; returns the number of
/// findings left unfixed.
fn run_analysis(config: &Config, cli: &Cli) -> Result<usize> {
    let start_time = Instant::now();

    let finder = FileFinder::new(config).into_diagnostic()?;
    let files = finder.find_files(&cli.path).into_diagnostic()?;

    if files.is_empty() {
        if !cli.quiet {
            println!("{}", "No PHP files found.".yellow());
        }
        return Ok(0);
    }

    let analyzer = Analyzer::new(config);
    let progress = if cli.quiet || !matches!(cli.format, OutputFormat::Terminal) {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(files.len() as u64)
    };

    let mut analyzed: Vec<AnalyzedFile> = files
        .par_iter()
        .filter_map(|path| {
            let result = analyze_one(path, &analyzer, config);
            progress.inc(1);
            match result {
                Ok(file) => Some(file),
                Err(error) => {
                    warn!("skipping {}: {}", path.display(), error);
                    None
                }
            }
        })
        .collect();
    progress.finish_and_clear();

    // parallel collection order is nondeterministic; reports are per-path
    analyzed.sort_by(|a, b| a.path.cmp(&b.path));

    let mut fixed = 0usize;
    if cli.fix {
        fixed = apply_fixes(&mut analyzed, cli)?;
    }

    let reporter = Reporter::new(report_format(cli), cli.output.clone());
    reporter.report(&analyzed)?;

    let total: usize = analyzed.iter().map(|f| f.findings.len()).sum();
    if !cli.quiet {
        info!(
            "analyzed {} files in {:.2?}, {} findings, {} fixed",
            analyzed.len(),
            start_time.elapsed(),
            total,
            fixed
        );
    }
    Ok(total)
}

fn analyze_one(
    path: &PathBuf,
    analyzer: &Analyzer,
    config: &Config,
) -> std::result::Result<AnalyzedFile, phpsniff::parser::ParseError> {
    let mut parser = PhpParser::new()?;
    let ast = parser.parse_file(path)?;
    let findings = analyzer.analyze(&ast, config);
    Ok(AnalyzedFile {
        path: path.clone(),
        source: ast.source().to_string(),
        ast,
        findings,
    })
}

/// Applies fixes file by file. Interactive unless --yes; --dry-run only
/// prints the previews. Returns the number of fixes written.
fn apply_fixes(files: &mut Vec<AnalyzedFile>, cli: &Cli) -> Result<usize> {
    let mut total_applied = 0usize;

    for file in files.iter_mut() {
        let applier = FixApplier::new(&file.ast);

        let mut chosen: Vec<&Fix> = Vec::new();
        let mut chosen_indices = Vec::new();
        for (index, finding) in file.findings.iter().enumerate() {
            let Some(fix) = &finding.fix else {
                continue;
            };

            if cli.dry_run {
                if let Some((before, after)) =
                    applier.preview(&file.source, fix, finding.anchor)
                {
                    println!(
                        "{}:{}: {}\n  {} {}\n  {} {}",
                        file.path.display(),
                        finding.span.line,
                        fix.title.bold(),
                        "-".red(),
                        before,
                        "+".green(),
                        after
                    );
                }
                continue;
            }

            let accepted = if cli.yes {
                true
            } else {
                let prompt = format!(
                    "{}:{}: {} - {}?",
                    file.path.display(),
                    finding.span.line,
                    finding.message,
                    fix.title
                );
                dialoguer::Confirm::new()
                    .with_prompt(prompt)
                    .default(true)
                    .interact()
                    .into_diagnostic()?
            };
            if accepted {
                chosen.push(fix);
                chosen_indices.push(index);
            }
        }

        if chosen.is_empty() {
            continue;
        }

        let outcome = applier.apply_all(&file.source, &chosen);
        if outcome.skipped > 0 {
            warn!(
                "{}: {} conflicting fix(es) skipped",
                file.path.display(),
                outcome.skipped
            );
        }
        std::fs::write(&file.path, &outcome.source).into_diagnostic()?;
        total_applied += outcome.applied;

        // drop the findings that were just fixed from the report
        let fixed_indices: Vec<usize> = chosen_indices
            .iter()
            .take(outcome.applied)
            .copied()
            .collect();
        let mut index = 0usize;
        file.findings.retain(|_| {
            let keep = !fixed_indices.contains(&index);
            index += 1;
            keep
        });
    }

    Ok(total_applied)
}

fn report_format(cli: &Cli) -> ReportFormat {
    match cli.format {
        OutputFormat::Terminal => ReportFormat::Terminal,
        OutputFormat::Compact => ReportFormat::Compact,
        OutputFormat::Json => ReportFormat::Json,
    }
}
