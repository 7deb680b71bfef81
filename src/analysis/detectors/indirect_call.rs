//! Indirect Call Detector
//!
//! Normalizes `call_user_func` / `call_user_func_array` statements that
//! have a direct-call equivalent.
//!
//! ## Detection Algorithm
//!
//! Only call statements are considered (`call(...);`), never calls whose
//! result feeds an expression:
//!
//! - `call_user_func_array($c, array(...))` with an inline array literal
//!   suggests `call_user_func(...)`
//! - `call_user_func([$obj, 'method'], ...)` renders the equivalent
//!   direct call; string elements render as `Type::` / bare member,
//!   expressions as `$expr->` / `{member}` dynamic syntax; members
//!   containing `::` cannot be expressed and are skipped
//! - `call_user_func($callable, ...)` with a scalar callee is only worth
//!   rewriting when the configured PHP version can invoke variables
//!   directly
//!
//! ## Examples Detected
//!
//! ```php
//! call_user_func_array($cb, array($x));   // call_user_func(...)
//! call_user_func([$obj, 'run'], $x);      // $obj->run($x)
//! call_user_func($fn, $x);                // $fn($x) on PHP 7+
//! ```

use crate::analysis::{AnalysisContext, Finding, Smell};
use crate::ast::{Ast, NodeId, NodeKind};

use super::Detector;

/// Detector for variable-function call idioms
pub struct IndirectCallDetector;

impl Detector for IndirectCallDetector {
    fn name(&self) -> &'static str {
        "indirect-call"
    }

    fn check(&self, node: NodeId, ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let ast = ctx.ast;
        let NodeKind::FunctionCall { name, args } = ast.kind(node) else {
            return Vec::new();
        };

        // statement position only
        let Some(parent) = ast.parent(node) else {
            return Vec::new();
        };
        if !matches!(ast.kind(parent), NodeKind::ExprStatement { .. }) {
            return Vec::new();
        }
        if args.is_empty() || !name.starts_with("call_user_func") {
            return Vec::new();
        }

        if name == "call_user_func_array" && args.len() == 2 {
            if matches!(ast.kind(args[1]), NodeKind::ArrayLiteral { .. }) {
                return vec![Finding::new(
                    ast,
                    node,
                    Smell::IndirectCallUsage,
                    "'call_user_func(...)' should be used instead",
                )];
            }
            return Vec::new();
        }

        if name != "call_user_func" {
            return Vec::new();
        }

        // `callReturningCallable()(...)` is a syntax error below PHP 7,
        // so a call expression as the callable is left alone
        if ast.kind(args[0]).is_call() {
            return Vec::new();
        }

        if let NodeKind::ArrayLiteral { elements } = ast.kind(args[0]) {
            return self.check_array_callable(node, args, elements, ctx);
        }

        // scalar callee: safe to invoke directly on PHP 7+
        if ctx.config.php_version.supports_variable_call() {
            let rendered_args = join_args(ast, &args[1..]);
            let message = format!(
                "'{}({})' should be used instead",
                ast.text(args[0]),
                rendered_args
            );
            return vec![Finding::new(ast, node, Smell::IndirectCallUsage, message)];
        }

        Vec::new()
    }
}

impl IndirectCallDetector {
    fn check_array_callable(
        &self,
        node: NodeId,
        args: &[NodeId],
        elements: &[NodeId],
        ctx: &AnalysisContext<'_>,
    ) -> Vec<Finding> {
        let ast = ctx.ast;

        let values: Vec<NodeId> = elements
            .iter()
            .filter_map(|&element| match ast.kind(element) {
                NodeKind::ArrayElement { key: Some(key), .. } => Some(*key),
                NodeKind::ArrayElement { key: None, value } => Some(*value),
                _ => None,
            })
            .collect();

        // exactly an [object-or-class, member] pair, and the first element
        // must not itself be a call
        if values.len() != 2 || ast.kind(values[0]).is_call() {
            return Vec::new();
        }
        let (object, member) = (values[0], values[1]);

        // `parent::method` style members have no arrow-call rendering
        if let NodeKind::StringLiteral { value } = ast.kind(member) {
            if value.contains("::") {
                return Vec::new();
            }
        }

        let rendered_object = match ast.kind(object) {
            NodeKind::StringLiteral { value } => format!("{value}::"),
            _ => format!("{}->", ast.text(object)),
        };
        let rendered_member = match ast.kind(member) {
            NodeKind::StringLiteral { value } => value.clone(),
            _ => format!("{{{}}}", ast.text(member)),
        };
        let message = format!(
            "'{}{}({})' should be used instead",
            rendered_object,
            rendered_member,
            join_args(ast, &args[1..])
        );
        vec![Finding::new(ast, node, Smell::IndirectCallUsage, message)]
    }
}

fn join_args(ast: &Ast, args: &[NodeId]) -> String {
    args.iter()
        .map(|&a| ast.text(a))
        .collect::<Vec<_>>()
        .join(", ")
}
