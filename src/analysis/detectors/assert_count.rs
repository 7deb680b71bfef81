//! Assert Count Detector
//!
//! Detects `assertEquals`/`assertSame` comparisons against `count(...)`
//! that should be `assertCount(expected, collection)`.
//!
//! Exactly one of the first two arguments must be a `count()` call; when
//! both are, there is no way to tell which side is the expectation, so
//! nothing is reported.

use crate::analysis::{AnalysisContext, Finding, Smell};
use crate::ast::{Ast, NodeId, NodeKind};
use crate::fix::{Fix, FixOp};

use super::Detector;

const MESSAGE: &str = "assertCount should be used instead";

/// Detector for count-comparison assertions
pub struct AssertCountDetector;

impl Detector for AssertCountDetector {
    fn name(&self) -> &'static str {
        "assert-count"
    }

    fn check(&self, node: NodeId, ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let ast = ctx.ast;
        let (name, args) = match ast.kind(node) {
            NodeKind::MethodCall {
                name: Some(name),
                args,
                ..
            } => (name.as_str(), args),
            NodeKind::StaticCall { name, args, .. } => (name.as_str(), args),
            _ => return Vec::new(),
        };
        if args.len() < 2 || !matches!(name, "assertEquals" | "assertSame") {
            return Vec::new();
        }

        let first_is_count = is_count_call(ast, args[0]);
        let second_is_count = is_count_call(ast, args[1]);
        if first_is_count == second_is_count {
            return Vec::new();
        }

        let (count_call, expected) = if first_is_count {
            (args[0], args[1])
        } else {
            (args[1], args[0])
        };
        let NodeKind::FunctionCall {
            args: count_args, ..
        } = ast.kind(count_call)
        else {
            return Vec::new();
        };
        // a count() without arguments is malformed; nothing to rebuild
        let Some(&collection) = count_args.first() else {
            return Vec::new();
        };

        let mut new_args = vec![expected, collection];
        if args.len() == 3 {
            new_args.push(args[2]);
        }
        let fix = Fix::new(
            "Use ::assertCount",
            FixOp::SynthesizeCall {
                call: node,
                name: "assertCount".to_string(),
                args: new_args,
            },
        );

        vec![Finding::new(ast, node, Smell::AssertCountMissed, MESSAGE).with_fix(fix)]
    }
}

fn is_count_call(ast: &Ast, node: NodeId) -> bool {
    matches!(ast.kind(node), NodeKind::FunctionCall { name, .. } if name == "count")
}
