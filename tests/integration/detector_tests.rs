//! Integration tests for each detector type over the PHP fixtures.

use std::path::PathBuf;

use phpsniff::analysis::{Analyzer, Finding, Severity, Smell};
use phpsniff::config::Config;
use phpsniff::parser::PhpParser;

/// Get the path to the test fixtures directory
fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/php")
}

/// Parse a fixture and run the default analyzer over it
fn analyze_fixture(filename: &str) -> Vec<Finding> {
    analyze_fixture_with(filename, &Config::default())
}

fn analyze_fixture_with(filename: &str, config: &Config) -> Vec<Finding> {
    let path = fixtures_path().join(filename);
    if !path.exists() {
        panic!("Fixture not found: {path:?}");
    }
    let mut parser = PhpParser::new().expect("grammar loads");
    let ast = parser.parse_file(&path).expect("fixture parses");
    Analyzer::new(config).analyze(&ast, config)
}

fn count_smell(findings: &[Finding], smell: Smell) -> usize {
    findings.iter().filter(|f| f.smell == smell).count()
}

// ============================================================================
// Nested Not Tests
// ============================================================================

mod nested_not_tests {
    use super::*;

    #[test]
    fn reports_both_redundant_chains() {
        let findings = analyze_fixture("nested_not.php");
        assert_eq!(count_smell(&findings, Smell::NestedNotOperators), 2);
    }

    #[test]
    fn single_negation_is_not_reported() {
        let findings = analyze_fixture("nested_not.php");
        for finding in findings {
            assert_ne!(finding.message, "Can be replaced with (bool)$flag!");
        }
    }

    #[test]
    fn both_parities_are_suggested() {
        let findings = analyze_fixture("nested_not.php");
        let messages: Vec<&str> = findings
            .iter()
            .filter(|f| f.smell == Smell::NestedNotOperators)
            .map(|f| f.message.as_str())
            .collect();
        assert!(messages.contains(&"Can be replaced with (bool)$flag"));
        assert!(messages.contains(&"Can be replaced with !$flag"));
    }
}

// ============================================================================
// Foreach Reference Tests
// ============================================================================

mod foreach_reference_tests {
    use super::*;

    #[test]
    fn only_the_leaky_loop_reports_a_dangling_reference() {
        let findings = analyze_fixture("foreach_reference.php");
        assert_eq!(count_smell(&findings, Smell::ForeachUnsafeReference), 1);
    }

    #[test]
    fn unnecessary_unset_is_reported_once() {
        let findings = analyze_fixture("foreach_reference.php");
        assert_eq!(count_smell(&findings, Smell::ForeachUnnecessaryUnset), 1);
    }

    #[test]
    fn dangling_reference_is_a_warning() {
        let findings = analyze_fixture("foreach_reference.php");
        let finding = findings
            .iter()
            .find(|f| f.smell == Smell::ForeachUnsafeReference)
            .expect("dangling reference finding");
        assert_eq!(finding.severity, Severity::Warning);
    }
}

// ============================================================================
// Static Call Tests
// ============================================================================

mod static_call_tests {
    use super::*;

    #[test]
    fn both_invocation_patterns_are_reported() {
        let findings = analyze_fixture("static_call.php");
        assert_eq!(count_smell(&findings, Smell::StaticCallViaInstance), 2);
    }

    #[test]
    fn only_the_this_pattern_carries_a_fix() {
        let findings = analyze_fixture("static_call.php");
        let fixable: Vec<&Finding> = findings
            .iter()
            .filter(|f| f.smell == Smell::StaticCallViaInstance && f.fix.is_some())
            .collect();
        assert_eq!(fixable.len(), 1);
        assert_eq!(
            fixable[0].message,
            "'static::trim(...)' should be used instead"
        );
    }
}

// ============================================================================
// Indirect Call Tests
// ============================================================================

mod indirect_call_tests {
    use super::*;
    use phpsniff::config::PhpVersion;

    #[test]
    fn all_four_idioms_are_reported_on_php7() {
        let findings = analyze_fixture("indirect_call.php");
        assert_eq!(count_smell(&findings, Smell::IndirectCallUsage), 4);
    }

    #[test]
    fn scalar_variant_disappears_on_php5() {
        let config = Config {
            php_version: PhpVersion::Php56,
            ..Config::default()
        };
        let findings = analyze_fixture_with("indirect_call.php", &config);
        assert_eq!(count_smell(&findings, Smell::IndirectCallUsage), 3);
    }

    #[test]
    fn suggestions_render_direct_calls() {
        let findings = analyze_fixture("indirect_call.php");
        let messages: Vec<&str> = findings
            .iter()
            .filter(|f| f.smell == Smell::IndirectCallUsage)
            .map(|f| f.message.as_str())
            .collect();
        assert!(messages.contains(&"'$worker->run($job)' should be used instead"));
        assert!(messages.contains(&"'Mailer::send($message)' should be used instead"));
        assert!(messages.contains(&"'$handler($payload)' should be used instead"));
    }
}

// ============================================================================
// Assert Count Tests
// ============================================================================

mod assert_count_tests {
    use super::*;

    #[test]
    fn both_unambiguous_assertions_are_reported() {
        let findings = analyze_fixture("assert_count.php");
        assert_eq!(count_smell(&findings, Smell::AssertCountMissed), 2);
    }

    #[test]
    fn every_assert_count_finding_is_fixable() {
        let findings = analyze_fixture("assert_count.php");
        assert!(findings
            .iter()
            .filter(|f| f.smell == Smell::AssertCountMissed)
            .all(|f| f.fix.is_some()));
    }
}

// ============================================================================
// Cross-Cutting Tests
// ============================================================================

mod cross_cutting_tests {
    use super::*;

    #[test]
    fn clean_fixture_has_no_findings() {
        let findings = analyze_fixture("clean.php");
        assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    }

    #[test]
    fn findings_carry_stable_codes() {
        let findings = analyze_fixture("assert_count.php");
        assert!(findings.iter().all(|f| f.smell.code().starts_with("PS")));
    }

    #[test]
    fn detector_subset_limits_findings() {
        let config = Config {
            detectors: Some(vec!["nested-not".to_string()]),
            ..Config::default()
        };
        let findings = analyze_fixture_with("indirect_call.php", &config);
        assert!(findings.is_empty());
    }

    #[test]
    fn analysis_is_deterministic() {
        let first = analyze_fixture("foreach_reference.php");
        let second = analyze_fixture("foreach_reference.php");
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.smell, b.smell);
            assert_eq!(a.span, b.span);
            assert_eq!(a.message, b.message);
        }
    }
}
