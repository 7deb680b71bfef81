//! Foreach Reference Detector
//!
//! Three checks around `foreach` iteration variables plus an opt-in
//! optimization hint:
//!
//! - a `&` before the key variable is a PHP fatal error - always reported
//! - a `&` before the value variable aliases the iterated array; unless
//!   the loop is followed by nothing, a `return`, or an `unset` of that
//!   variable, later code can clobber the array through the dangling
//!   reference
//! - an `unset` of a plain (non-reference) value variable right after the
//!   loop does nothing and is reported as unnecessary
//! - (config: suggest-loop-by-reference) `$array[$key] = ...` inside the
//!   loop iterating `$array` by `$key` can become a by-reference value
//!   write
//!
//! ## Examples Detected
//!
//! ```php
//! foreach ($rows as &$row) { $row *= 2; }
//! $rows[] = 1;                    // reference still alive - warning
//!
//! foreach ($rows as $row) { }
//! unset($row);                    // not a reference - unnecessary
//! ```

use crate::analysis::{AnalysisContext, Finding, Smell};
use crate::ast::{Ast, NodeId, NodeKind};

use super::Detector;

const MESSAGE_KEY_REFERENCE: &str =
    "Provokes PHP Fatal error (key element cannot be a reference)";
const MESSAGE_UNSAFE_REFERENCE: &str =
    "This variable must be unset just after foreach to prevent possible side-effects";

/// Detector for foreach reference hazards
pub struct ForeachReferenceDetector;

impl Detector for ForeachReferenceDetector {
    fn name(&self) -> &'static str {
        "foreach-reference"
    }

    fn check(&self, node: NodeId, ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        match ctx.ast.kind(node) {
            NodeKind::Foreach { .. } => self.check_loop(node, ctx),
            NodeKind::Assignment { .. } => self.check_index_write(node, ctx),
            _ => Vec::new(),
        }
    }
}

impl ForeachReferenceDetector {
    fn check_loop(&self, node: NodeId, ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        let ast = ctx.ast;
        let NodeKind::Foreach {
            key,
            key_by_ref,
            value,
            value_by_ref,
            ..
        } = ast.kind(node)
        else {
            return Vec::new();
        };

        let mut findings = Vec::new();

        if *key_by_ref {
            if let Some(key) = key {
                findings.push(Finding::new(
                    ast,
                    *key,
                    Smell::ForeachKeyByReference,
                    MESSAGE_KEY_REFERENCE,
                ));
            }
        }

        let Some(value) = value else {
            return findings;
        };

        if *value_by_ref {
            self.check_reference_left_dangling(node, *value, ctx, &mut findings);
        } else {
            self.check_unnecessary_unset(node, *value, ctx, &mut findings);
        }

        findings
    }

    /// A by-reference value variable must be neutralized right after the
    /// loop: next meaningful statement absent, a `return`, or an `unset`
    /// naming it.
    fn check_reference_left_dangling(
        &self,
        foreach: NodeId,
        value: NodeId,
        ctx: &AnalysisContext<'_>,
        findings: &mut Vec<Finding>,
    ) {
        let ast = ctx.ast;

        let mut next = ast.next_sibling(foreach);

        // when the loop closes its enclosing blocks, the statement that
        // follows those parents is what runs next; stop at function or
        // file boundaries
        let mut parent = ast.parent(foreach);
        while next.is_none() {
            let Some(p) = parent else {
                break;
            };
            if !matches!(ast.kind(p), NodeKind::Block) {
                next = ast.next_sibling(p);
            }
            parent = ast.parent(p);
            match parent.map(|id| ast.kind(id)) {
                None | Some(NodeKind::Function { .. }) | Some(NodeKind::File) => break,
                _ => {}
            }
        }

        next = skip_doc_comments(ast, next);

        let mut fulfilled = match next.map(|n| ast.kind(n)) {
            None | Some(NodeKind::Return { .. }) => true,
            _ => false,
        };

        if let (Some(next), Some(value_name)) = (next, variable_name(ast, value)) {
            if let NodeKind::Unset { args } = ast.kind(next) {
                for &arg in args {
                    if matches!(ast.kind(arg), NodeKind::Variable { name } if name == value_name)
                    {
                        fulfilled = true;
                        break;
                    }
                }
            }
        }

        if !fulfilled {
            findings.push(Finding::new(
                ast,
                value,
                Smell::ForeachUnsafeReference,
                MESSAGE_UNSAFE_REFERENCE,
            ));
        }
    }

    /// A non-reference value variable needs no `unset`; tolerate the
    /// `foreach { foreach } unset` layout by walking up one nested loop
    /// at a time.
    fn check_unnecessary_unset(
        &self,
        foreach: NodeId,
        value: NodeId,
        ctx: &AnalysisContext<'_>,
        findings: &mut Vec<Finding>,
    ) {
        let ast = ctx.ast;
        let Some(value_name) = variable_name(ast, value) else {
            return;
        };

        let mut current = foreach;
        let mut next = ast.next_sibling(current);
        loop {
            if matches!(next.map(|n| ast.kind(n)), Some(NodeKind::Unset { .. })) {
                break;
            }
            let Some(block) = ast.parent(current) else {
                break;
            };
            if !matches!(ast.kind(block), NodeKind::Block) {
                break;
            }
            let Some(outer) = ast.parent(block) else {
                break;
            };
            if !matches!(ast.kind(outer), NodeKind::Foreach { .. }) {
                break;
            }
            current = outer;
            next = ast.next_sibling(outer);
        }

        next = skip_doc_comments(ast, next);

        let Some(next) = next else {
            return;
        };
        let NodeKind::Unset { args } = ast.kind(next) else {
            return;
        };
        if args.is_empty() {
            return;
        }
        // only the first argument's shape gates the scan - an observed
        // gap in the check, kept as is
        if !matches!(ast.kind(args[0]), NodeKind::Variable { .. }) {
            return;
        }

        for &arg in args {
            if matches!(ast.kind(arg), NodeKind::Variable { name } if name == value_name) {
                findings.push(Finding::new(
                    ast,
                    arg,
                    Smell::ForeachUnnecessaryUnset,
                    format!(
                        "Unsetting ${value_name} is not needed because it's not a reference"
                    ),
                ));
            }
        }
    }

    /// Opt-in: `$array[$key] = ...` where `$array`/`$key` match an
    /// enclosing foreach suggests binding the value by reference instead.
    /// The walk never crosses a function boundary and only the nearest
    /// qualifying loop reports.
    fn check_index_write(&self, node: NodeId, ctx: &AnalysisContext<'_>) -> Vec<Finding> {
        if !ctx.config.suggest_loop_by_reference {
            return Vec::new();
        }
        let ast = ctx.ast;
        let NodeKind::Assignment { target, .. } = ast.kind(node) else {
            return Vec::new();
        };
        let NodeKind::Subscript {
            container,
            index: Some(index),
        } = ast.kind(*target)
        else {
            return Vec::new();
        };
        if !matches!(ast.kind(*index), NodeKind::Variable { .. }) {
            return Vec::new();
        }

        let mut parent = ast.parent(node);
        while let Some(p) = parent {
            match ast.kind(p) {
                NodeKind::Function { .. } => return Vec::new(),
                NodeKind::File => break,
                NodeKind::Foreach {
                    collection: Some(collection),
                    key: Some(key),
                    value: Some(value),
                    ..
                } => {
                    if ast.are_equivalent(*key, *index)
                        && ast.are_equivalent(*collection, *container)
                    {
                        if let Some(name) = variable_name(ast, *value) {
                            let message = format!(
                                "Can be refactored as '${name} = ...' if ${name} is defined as \
                                 reference (ensure that array supplied). Suppress if causes \
                                 memory mismatches."
                            );
                            return vec![Finding::new(
                                ast,
                                *target,
                                Smell::ForeachByReferenceCandidate,
                                message,
                            )];
                        }
                        return Vec::new();
                    }
                }
                _ => {}
            }
            parent = ast.parent(p);
        }
        Vec::new()
    }
}

fn variable_name(ast: &Ast, node: NodeId) -> Option<&str> {
    match ast.kind(node) {
        NodeKind::Variable { name } if !name.is_empty() => Some(name),
        _ => None,
    }
}

fn skip_doc_comments(ast: &Ast, mut next: Option<NodeId>) -> Option<NodeId> {
    while let Some(n) = next {
        if matches!(ast.kind(n), NodeKind::DocComment) {
            next = ast.next_sibling(n);
        } else {
            break;
        }
    }
    next
}
