//! Static Call Via Instance Detector
//!
//! Detects static methods invoked through an instance reference.
//!
//! ## Detection Algorithm
//!
//! 1. Resolve the method call; skip unresolved calls, interface members,
//!    non-static and abstract methods
//! 2. Receiver exactly `$this` - report with a fix rewriting the receiver
//!    and access operator to `static::`
//! 3. Any other non-call receiver using `->` - report without a fix (the
//!    right class name cannot be derived mechanically)
//!
//! The `respect-phpunit-conventions` toggle exempts the old
//! `PHPUnit_Framework_*` class family, whose documentation prescribes
//! `$this->assert*()`.

use crate::analysis::{AnalysisContext, Finding, Smell};
use crate::ast::{NodeId, NodeKind};
use crate::fix::{Fix, FixOp};

use super::Detector;

/// Detector for scope-incorrect static invocations
pub struct StaticCallDetector;

impl Detector for StaticCallDetector {
    fn name(&self) -> &'static str {
        "static-call"
    }

    fn check(&self, node: NodeId, ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let ast = ctx.ast;
        let NodeKind::MethodCall {
            receiver,
            name: Some(method_name),
            ..
        } = ast.kind(node)
        else {
            return Vec::new();
        };

        let Some(resolved) = ctx.resolver.resolve_method(node) else {
            return Vec::new();
        };
        // contract interfaces and non-static/abstract methods are fine
        if resolved.class_is_interface || !resolved.is_static || resolved.is_abstract {
            return Vec::new();
        }

        if ctx.config.respect_phpunit_conventions
            && resolved
                .class_fqn
                .trim_start_matches('\\')
                .starts_with("PHPUnit_Framework_")
        {
            return Vec::new();
        }

        // first pattern: $this->staticMethod()
        if matches!(ast.kind(*receiver), NodeKind::Variable { name } if name == "this") {
            let message = format!("'static::{method_name}(...)' should be used instead");
            let fix = Fix::new(
                "Use static::",
                FixOp::ReplaceWithText {
                    target: *receiver,
                    text: "static".to_string(),
                },
            )
            .with_op(FixOp::ReplaceAccessOperator {
                call: node,
                receiver: *receiver,
                text: "::".to_string(),
            });
            return vec![
                Finding::new(ast, *receiver, Smell::StaticCallViaInstance, message).with_fix(fix),
            ];
        }

        // second pattern: <expression>->staticMethod(); a call result as
        // receiver is left alone and there is no mechanical rewrite
        if !ast.kind(*receiver).is_call() {
            let message = format!("'...::{method_name}(...)' should be used instead");
            return vec![Finding::new(
                ast,
                node,
                Smell::StaticCallViaInstance,
                message,
            )];
        }

        Vec::new()
    }
}
