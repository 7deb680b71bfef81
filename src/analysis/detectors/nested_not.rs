//! Nested Not Operators Detector
//!
//! Detects `!!$x` / `!!!$x` chains that reduce to a boolean cast or a
//! single negation.
//!
//! ## Detection Algorithm
//!
//! 1. Trigger on a `!` whose immediate operand is not itself a `!` - only
//!    the innermost negation starts a walk, so one chain reports once
//! 2. Walk up through enclosing unary wrappers, counting consecutive `!`
//!    levels and remembering the outermost one as the report anchor
//! 3. Depth 1 is ordinary negation - no finding
//! 4. Even depth suggests `(bool) $x`, odd depth a single `!$x`; the fix
//!    replaces the whole outer chain, never one level
//!
//! ## Examples Detected
//!
//! ```php
//! if (!!$visible) { }   // (bool) $visible
//! if (!!!$hidden) { }   // !$hidden
//! ```

use crate::analysis::{AnalysisContext, Finding, Smell};
use crate::ast::{NodeId, NodeKind, UnaryOp};
use crate::fix::{Fix, FixOp};

use super::Detector;

/// Detector for redundant negation chains
pub struct NestedNotDetector;

impl Detector for NestedNotDetector {
    fn name(&self) -> &'static str {
        "nested-not"
    }

    fn check(&self, node: NodeId, ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let ast = ctx.ast;
        let NodeKind::Unary {
            op: UnaryOp::Not,
            operand,
        } = ast.kind(node)
        else {
            return Vec::new();
        };

        // only the deepest not-operator starts a walk
        let value = *operand;
        if matches!(
            ast.kind(value),
            NodeKind::Unary {
                op: UnaryOp::Not,
                ..
            }
        ) {
            return Vec::new();
        }

        // count nesting towards the outermost wrapper
        let mut nesting = 1usize;
        let mut target = None;
        let mut current = node;
        while let Some(parent) = ast.parent(current) {
            let NodeKind::Unary { op, .. } = ast.kind(parent) else {
                break;
            };
            if *op == UnaryOp::Not {
                nesting += 1;
                target = Some(parent);
            }
            current = parent;
        }
        let Some(target) = target else {
            return Vec::new();
        };

        let value_text = ast.text(value);
        let (message, fix) = if nesting % 2 == 0 {
            (
                format!("Can be replaced with (bool){value_text}"),
                Fix::new(
                    "Use boolean casting",
                    FixOp::ReplaceWithText {
                        target,
                        text: format!("(bool) {value_text}"),
                    },
                ),
            )
        } else {
            let NodeKind::Unary {
                operand: outer_operand,
                ..
            } = ast.kind(target)
            else {
                return Vec::new();
            };
            (
                format!("Can be replaced with !{value_text}"),
                Fix::new(
                    "Use single not operator",
                    FixOp::ReplaceWithNode {
                        target: *outer_operand,
                        source: value,
                    },
                ),
            )
        };

        vec![Finding::new(ast, target, Smell::NestedNotOperators, message).with_fix(fix)]
    }
}
