//! Analysis core: the finding model, the detector registry and the
//! per-file analyzer loop.

pub mod detectors;
pub mod resolver;
pub mod semantics;
pub mod values;

use std::path::PathBuf;

use crate::ast::{Ast, NodeId, Span};
use crate::config::Config;
use crate::fix::Fix;

pub use detectors::Detector;
pub use resolver::{FileSymbols, ResolvedMethod, SymbolResolver};

/// Everything a detector may consult while inspecting a node.
///
/// Detectors never mutate any of this; the configuration is fixed for the
/// whole run and the resolver is an injected service, so detectors stay
/// decoupled from the concrete tree/resolution implementation.
pub struct AnalysisContext<'a> {
    pub ast: &'a Ast,
    pub resolver: &'a dyn SymbolResolver,
    pub config: &'a Config,
}

/// The rule that produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Smell {
    /// `!!$x` chains that reduce to a cast or a single negation
    NestedNotOperators,

    /// `foreach ($a as &$k => $v)` - key cannot be a reference
    ForeachKeyByReference,

    /// by-reference value variable not unset right after the loop
    ForeachUnsafeReference,

    /// unset of a plain (non-reference) loop value variable
    ForeachUnnecessaryUnset,

    /// `$array[$key] = ...` inside the loop iterating `$array`
    ForeachByReferenceCandidate,

    /// static method invoked through `$this` or an instance expression
    StaticCallViaInstance,

    /// `call_user_func`/`call_user_func_array` where a direct call works
    IndirectCallUsage,

    /// `assertEquals(count($x), $n)` instead of `assertCount`
    AssertCountMissed,
}

impl Smell {
    pub fn code(&self) -> &'static str {
        match self {
            Smell::NestedNotOperators => "PS001",
            Smell::ForeachKeyByReference => "PS002",
            Smell::ForeachUnsafeReference => "PS003",
            Smell::ForeachUnnecessaryUnset => "PS004",
            Smell::ForeachByReferenceCandidate => "PS005",
            Smell::StaticCallViaInstance => "PS006",
            Smell::IndirectCallUsage => "PS007",
            Smell::AssertCountMissed => "PS008",
        }
    }

    pub fn default_severity(&self) -> Severity {
        match self {
            Smell::NestedNotOperators => Severity::WeakWarning,
            Smell::ForeachKeyByReference => Severity::Error,
            Smell::ForeachUnsafeReference => Severity::Warning,
            Smell::ForeachUnnecessaryUnset => Severity::WeakWarning,
            Smell::ForeachByReferenceCandidate => Severity::WeakWarning,
            Smell::StaticCallViaInstance => Severity::Warning,
            Smell::IndirectCallUsage => Severity::WeakWarning,
            Smell::AssertCountMissed => Severity::WeakWarning,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Smell::NestedNotOperators => "nested not operators",
            Smell::ForeachKeyByReference => "foreach key by reference",
            Smell::ForeachUnsafeReference => "unsafe foreach reference",
            Smell::ForeachUnnecessaryUnset => "unnecessary unset",
            Smell::ForeachByReferenceCandidate => "foreach by-reference candidate",
            Smell::StaticCallViaInstance => "static call via instance",
            Smell::IndirectCallUsage => "indirect call usage",
            Smell::AssertCountMissed => "assertCount not used",
        }
    }
}

/// Severity levels for findings, ordered weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    WeakWarning,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::WeakWarning => "weak-warning",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reported issue, anchored at one tree node.
#[derive(Debug, Clone)]
pub struct Finding {
    /// Node whose span is reported
    pub anchor: NodeId,

    /// Source span of the anchor
    pub span: Span,

    /// The rule that fired
    pub smell: Smell,

    /// Severity level
    pub severity: Severity,

    /// Fully rendered message - no placeholders left
    pub message: String,

    /// Mechanical rewrite, when one can be generated unambiguously
    pub fix: Option<Fix>,
}

impl Finding {
    pub fn new(ast: &Ast, anchor: NodeId, smell: Smell, message: impl Into<String>) -> Self {
        Self {
            anchor,
            span: ast.span(anchor),
            smell,
            severity: smell.default_severity(),
            message: message.into(),
            fix: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }
}

/// One analyzed source file, with everything needed to report and to
/// apply fixes afterwards.
#[derive(Debug)]
pub struct AnalyzedFile {
    pub path: PathBuf,
    pub source: String,
    pub ast: Ast,
    pub findings: Vec<Finding>,
}

/// Runs every registered detector over every node of a tree.
///
/// Findings come back in discovery order: preorder node position first,
/// registration order second - deterministic across runs.
pub struct Analyzer {
    detectors: Vec<Box<dyn Detector>>,
}

impl Analyzer {
    /// Registry honoring the configured detector subset.
    pub fn new(config: &Config) -> Self {
        let all = detectors::default_registry();
        let detectors = match &config.detectors {
            Some(enabled) => all
                .into_iter()
                .filter(|d| enabled.iter().any(|name| name == d.name()))
                .collect(),
            None => all,
        };
        Self { detectors }
    }

    /// Custom registry, mostly for tests.
    pub fn with_detectors(detectors: Vec<Box<dyn Detector>>) -> Self {
        Self { detectors }
    }

    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    pub fn analyze(&self, ast: &Ast, config: &Config) -> Vec<Finding> {
        let symbols = FileSymbols::build(ast);
        let ctx = AnalysisContext {
            ast,
            resolver: &symbols,
            config,
        };

        let mut findings = Vec::new();
        for node in ast.preorder() {
            for detector in &self.detectors {
                findings.extend(detector.check(node, &ctx));
            }
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::PhpParser;

    fn parse(code: &str) -> Ast {
        PhpParser::new().unwrap().parse_source(code).unwrap()
    }

    #[test]
    fn clean_code_produces_no_findings() {
        let ast = parse("<?php function f($a) { return $a + 1; }");
        let config = Config::default();
        let findings = Analyzer::new(&config).analyze(&ast, &config);
        assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    }

    #[test]
    fn findings_are_ordered_by_discovery() {
        let code = "<?php $a = !!$b; $c = !!!$d;";
        let ast = parse(code);
        let config = Config::default();
        let findings = Analyzer::new(&config).analyze(&ast, &config);
        assert_eq!(findings.len(), 2);
        assert!(findings[0].span.start < findings[1].span.start);
    }

    #[test]
    fn detector_subset_is_honored() {
        let config = Config {
            detectors: Some(vec!["nested-not".to_string()]),
            ..Config::default()
        };
        let analyzer = Analyzer::new(&config);
        assert_eq!(analyzer.detector_names(), vec!["nested-not"]);
    }

    #[test]
    fn severity_ordering_is_weakest_first() {
        assert!(Severity::WeakWarning < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }
}
