//! Fix application round-trips: analyze, apply every produced fix, and
//! verify the rewritten source (including that it still parses and is
//! clean on re-analysis).

use phpsniff::analysis::{Analyzer, Finding};
use phpsniff::ast::Ast;
use phpsniff::config::Config;
use phpsniff::fix::{Fix, FixApplier};
use phpsniff::parser::PhpParser;

fn analyze(code: &str) -> (Ast, Vec<Finding>) {
    let mut parser = PhpParser::new().expect("grammar loads");
    let ast = parser.parse_source(code).expect("code parses");
    let config = Config::default();
    let findings = Analyzer::new(&config).analyze(&ast, &config);
    (ast, findings)
}

fn apply_all_fixes(code: &str) -> String {
    let (ast, findings) = analyze(code);
    let fixes: Vec<&Fix> = findings.iter().filter_map(|f| f.fix.as_ref()).collect();
    assert!(!fixes.is_empty(), "expected at least one fix for: {code}");
    let outcome = FixApplier::new(&ast).apply_all(code, &fixes);
    assert_eq!(outcome.skipped, 0, "no fix should conflict");
    outcome.source
}

#[test]
fn double_negation_becomes_bool_cast() {
    let fixed = apply_all_fixes("<?php $visible = !!$flag;");
    assert_eq!(fixed, "<?php $visible = (bool) $flag;");
}

#[test]
fn triple_negation_becomes_single_not() {
    let fixed = apply_all_fixes("<?php $hidden = !!!$flag;");
    assert_eq!(fixed, "<?php $hidden = !$flag;");
}

#[test]
fn static_call_via_this_becomes_scope_call() {
    let fixed = apply_all_fixes(
        "<?php class A { static function util() {} function go() { $this->util(); } }",
    );
    assert!(fixed.contains("static::util();"), "got: {fixed}");
}

#[test]
fn assert_equals_count_becomes_assert_count() {
    let fixed = apply_all_fixes("<?php $this->assertEquals(count($items), 3);");
    assert_eq!(fixed, "<?php $this->assertCount(3, $items);");
}

#[test]
fn assert_same_count_in_second_position_swaps_arguments() {
    let fixed = apply_all_fixes("<?php $this->assertSame(3, count($items));");
    assert_eq!(fixed, "<?php $this->assertCount(3, $items);");
}

#[test]
fn static_assertion_keeps_scope_form() {
    let fixed = apply_all_fixes("<?php self::assertEquals(count($items), 3);");
    assert_eq!(fixed, "<?php self::assertCount(3, $items);");
}

#[test]
fn fixed_source_parses_and_is_clean() {
    let fixed = apply_all_fixes(
        "<?php $a = !!$b; $this->assertEquals(count($c), 2); $d = !!!$e;",
    );
    let (_, findings) = analyze(&fixed);
    assert!(
        findings.iter().all(|f| f.fix.is_none()),
        "re-analysis still offers fixes: {findings:?}"
    );
}

#[test]
fn fixes_apply_at_correct_offsets_across_lines() {
    let code = "<?php\n$a = !!$b;\n$c = 1;\n$this->assertEquals(count($d), 5);\n";
    let fixed = apply_all_fixes(code);
    assert_eq!(
        fixed,
        "<?php\n$a = (bool) $b;\n$c = 1;\n$this->assertCount(5, $d);\n"
    );
}
