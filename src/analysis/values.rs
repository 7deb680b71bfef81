//! Possible-value discovery: given an expression, collect the set of
//! literal/constant expressions it could evaluate to.
//!
//! The walk is intraprocedural and syntax-shaped, not flow-sensitive:
//! ternaries contribute both branches, variables contribute parameter
//! defaults plus every plain assignment in the enclosing function, and
//! field/constant references contribute declared defaults plus
//! assignments to structurally equivalent targets. The `visited` set is
//! owned by the top-level caller and threaded through every recursive
//! call; a node is inserted *before* recursing into it, which is what
//! guarantees termination on cyclic assignment graphs like `$a = $a;`.

use std::collections::HashSet;

use crate::ast::{Ast, NodeId, NodeKind};

use super::semantics;
use super::SymbolResolver;

/// Discovers the candidate value nodes for `expression`.
///
/// Candidates use node identity for set membership; callers comparing
/// literals must compare the textual content of the returned nodes, not
/// their identities.
pub fn discover(
    ast: &Ast,
    resolver: &dyn SymbolResolver,
    expression: NodeId,
    visited: &mut HashSet<NodeId>,
) -> HashSet<NodeId> {
    let expression = semantics::unwrap_parentheses(ast, expression);

    let mut result = HashSet::new();
    if !visited.insert(expression) {
        return result;
    }

    match ast.kind(expression) {
        NodeKind::Ternary {
            then_branch: Some(then_branch),
            else_branch,
            ..
        } => {
            result.extend(discover(ast, resolver, *then_branch, visited));
            result.extend(discover(ast, resolver, *else_branch, visited));
        }

        // short ternary without a then-branch contributes nothing
        NodeKind::Ternary { then_branch: None, .. } => {}

        NodeKind::Variable { name } => {
            discover_variable(ast, resolver, expression, name, &mut result, visited);
        }

        NodeKind::PropertyAccess {
            name: Some(field_name),
            ..
        } => {
            discover_field(ast, resolver, expression, field_name, &mut result, visited);
        }

        NodeKind::ClassConstAccess { name, .. } if !name.is_empty() => {
            if let Some(declaration) = resolver.resolve_member(expression) {
                if let NodeKind::ClassConst { value: Some(value), .. } = ast.kind(declaration) {
                    result.insert(*value);
                }
            }
        }

        _ => {
            result.insert(expression);
        }
    }

    result
}

fn discover_variable(
    ast: &Ast,
    resolver: &dyn SymbolResolver,
    variable: NodeId,
    name: &str,
    result: &mut HashSet<NodeId>,
    visited: &mut HashSet<NodeId>,
) {
    if name.is_empty() {
        return;
    }
    let Some(function) = semantics::enclosing_function(ast, variable) else {
        return;
    };

    if let NodeKind::Function { params, .. } = ast.kind(function) {
        for &param in params {
            if let NodeKind::Parameter {
                name: param_name,
                default: Some(default),
            } = ast.kind(param)
            {
                if param_name == name {
                    result.insert(*default);
                    break;
                }
            }
        }
    }

    let Some(body) = semantics::function_body(ast, function) else {
        return;
    };
    for candidate in ast.descendants(body) {
        let NodeKind::Assignment {
            target,
            value,
            compound,
        } = ast.kind(candidate)
        else {
            continue;
        };
        // compound self-assignment does not override the tracked value
        if *compound {
            continue;
        }
        let NodeKind::Variable { name: target_name } = ast.kind(*target) else {
            continue;
        };
        if target_name == name {
            result.extend(discover(ast, resolver, *value, visited));
        }
    }
}

fn discover_field(
    ast: &Ast,
    resolver: &dyn SymbolResolver,
    reference: NodeId,
    field_name: &str,
    result: &mut HashSet<NodeId>,
    visited: &mut HashSet<NodeId>,
) {
    if field_name.is_empty() {
        return;
    }

    if let Some(declaration) = resolver.resolve_member(reference) {
        if let NodeKind::Field {
            default: Some(default),
            ..
        } = ast.kind(declaration)
        {
            // a default whose text ends with the field name is a
            // self-reference, not a usable value
            if !ast.text(*default).ends_with(field_name) {
                result.insert(*default);
            }
        }
    }

    let Some(function) = semantics::enclosing_function(ast, reference) else {
        return;
    };
    let Some(body) = semantics::function_body(ast, function) else {
        return;
    };
    for candidate in ast.descendants(body) {
        let NodeKind::Assignment {
            target,
            value,
            compound,
        } = ast.kind(candidate)
        else {
            continue;
        };
        if *compound {
            continue;
        }
        let NodeKind::PropertyAccess {
            name: Some(target_name),
            ..
        } = ast.kind(*target)
        else {
            continue;
        };
        if target_name == field_name && ast.are_equivalent(*target, reference) {
            result.extend(discover(ast, resolver, *value, visited));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FileSymbols;
    use crate::parser::PhpParser;

    fn parse(code: &str) -> Ast {
        PhpParser::new().unwrap().parse_source(code).unwrap()
    }

    fn last_variable(ast: &Ast, name: &str) -> NodeId {
        ast.preorder()
            .filter(|&id| matches!(ast.kind(id), NodeKind::Variable { name: n } if n == name))
            .last()
            .expect("variable not found")
    }

    fn discovered_strings(ast: &Ast, expression: NodeId) -> Vec<String> {
        let symbols = FileSymbols::build(ast);
        let mut visited = HashSet::new();
        let mut values: Vec<String> = discover(ast, &symbols, expression, &mut visited)
            .into_iter()
            .filter_map(|id| match ast.kind(id) {
                NodeKind::StringLiteral { value } => Some(value.clone()),
                _ => None,
            })
            .collect();
        values.sort();
        values
    }

    #[test]
    fn ternary_discovers_both_branches() {
        let ast = parse("<?php function f($cond) { $x = $cond ? 'foo' : 'bar'; return $x; }");
        let usage = last_variable(&ast, "x");
        assert_eq!(discovered_strings(&ast, usage), vec!["bar", "foo"]);
    }

    #[test]
    fn parameter_default_is_discovered() {
        let ast = parse("<?php function f($mode = 'fast') { return $mode; }");
        let usage = last_variable(&ast, "mode");
        assert_eq!(discovered_strings(&ast, usage), vec!["fast"]);
    }

    #[test]
    fn self_assignment_terminates_with_empty_result() {
        let ast = parse("<?php function f() { $a = $a; return $a; }");
        let usage = last_variable(&ast, "a");
        let symbols = FileSymbols::build(&ast);
        let mut visited = HashSet::new();
        let result = discover(&ast, &symbols, usage, &mut visited);
        assert!(result.is_empty());
    }

    #[test]
    fn mutual_cycle_terminates() {
        let ast = parse("<?php function f() { $a = $b; $b = $a; return $a; }");
        let usage = last_variable(&ast, "a");
        let symbols = FileSymbols::build(&ast);
        let mut visited = HashSet::new();
        // termination is the property under test; the result itself is
        // allowed to be empty
        let _ = discover(&ast, &symbols, usage, &mut visited);
    }

    #[test]
    fn compound_assignment_does_not_contribute() {
        let ast = parse("<?php function f() { $a = 'base'; $a .= 'tail'; return $a; }");
        let usage = last_variable(&ast, "a");
        assert_eq!(discovered_strings(&ast, usage), vec!["base"]);
    }

    #[test]
    fn plain_literal_is_its_own_candidate() {
        let ast = parse("<?php function f() { return 'lone'; }");
        let literal = ast
            .preorder()
            .find(|&id| matches!(ast.kind(id), NodeKind::StringLiteral { .. }))
            .unwrap();
        assert_eq!(discovered_strings(&ast, literal), vec!["lone"]);
    }

    #[test]
    fn field_default_and_reassignment_are_discovered() {
        let ast = parse(
            "<?php class C { private $mode = 'default'; \
             function f() { $this->mode = 'changed'; return $this->mode; } }",
        );
        let reference = ast
            .preorder()
            .filter(|&id| matches!(ast.kind(id), NodeKind::PropertyAccess { .. }))
            .last()
            .unwrap();
        assert_eq!(
            discovered_strings(&ast, reference),
            vec!["changed", "default"]
        );
    }

    #[test]
    fn constant_value_is_discovered() {
        let ast = parse(
            "<?php class C { const LEVEL = 'high'; function f() { return self::LEVEL; } }",
        );
        let access = ast
            .preorder()
            .find(|&id| matches!(ast.kind(id), NodeKind::ClassConstAccess { .. }))
            .unwrap();
        assert_eq!(discovered_strings(&ast, access), vec!["high"]);
    }

    #[test]
    fn chained_variables_resolve_through_assignments() {
        let ast = parse("<?php function f() { $a = 'deep'; $b = $a; return $b; }");
        let usage = last_variable(&ast, "b");
        assert_eq!(discovered_strings(&ast, usage), vec!["deep"]);
    }
}
