//! Shared expression helpers used across detectors and value discovery:
//! wrapper unwrapping, boolean-chain flattening, scope lookup and a
//! conservative string-literal resolution heuristic.

use crate::ast::{Ast, BinaryOp, NodeId, NodeKind, UnaryOp};

use super::SymbolResolver;

/// Descends through nested grouping parentheses to the innermost
/// non-paren expression; identity for anything else.
pub fn unwrap_parentheses(ast: &Ast, mut id: NodeId) -> NodeId {
    while let NodeKind::Paren { inner } = ast.kind(id) {
        id = *inner;
    }
    id
}

/// Unwraps one logical-not wrapper so boolean-chain analysis can treat
/// `!(a)` as `a`; identity for anything else.
pub fn strip_negation(ast: &Ast, id: NodeId) -> NodeId {
    match ast.kind(id) {
        NodeKind::Unary {
            op: UnaryOp::Not,
            operand,
        } => unwrap_parentheses(ast, *operand),
        _ => id,
    }
}

/// Flattens a uniform `&&`/`||` chain into its leaf operands in source
/// order, reporting the chain operator. Non-chain roots (including mixed
/// operators) come back as a single-element list with no operator.
///
/// The left spine is expanded one level at a time, taking each step's
/// right operand before recursing left and finally prepending the
/// leftmost leaf - natural order without reversing a collected list.
pub fn boolean_chain(ast: &Ast, condition: NodeId) -> (Vec<NodeId>, Option<BinaryOp>) {
    let mut condition = unwrap_parentheses(ast, condition);
    if let NodeKind::Unary { operand, .. } = ast.kind(condition) {
        condition = unwrap_parentheses(ast, *operand);
    }

    let NodeKind::Binary { op, lhs, rhs } = ast.kind(condition) else {
        return (vec![condition], None);
    };
    let operator = *op;
    if operator != BinaryOp::And && operator != BinaryOp::Or {
        return (vec![condition], None);
    }

    let mut parts = std::collections::VecDeque::new();
    parts.push_back(unwrap_parentheses(ast, *rhs));

    let mut to_expand = unwrap_parentheses(ast, *lhs);
    loop {
        match ast.kind(to_expand) {
            NodeKind::Binary { op, lhs, rhs } if *op == operator => {
                parts.push_front(unwrap_parentheses(ast, *rhs));
                to_expand = unwrap_parentheses(ast, *lhs);
            }
            _ => break,
        }
    }
    parts.push_front(to_expand);

    (parts.into_iter().collect(), Some(operator))
}

/// Nearest enclosing function/method/closure, if any.
pub fn enclosing_function(ast: &Ast, id: NodeId) -> Option<NodeId> {
    let mut parent = ast.parent(id);
    while let Some(p) = parent {
        match ast.kind(p) {
            NodeKind::File => return None,
            NodeKind::Function { .. } => return Some(p),
            _ => {}
        }
        parent = ast.parent(p);
    }
    None
}

/// Like [`enclosing_function`] but also stops at class and doc-comment
/// boundaries, for callers that need a coarser enclosing scope.
pub fn enclosing_block_scope(ast: &Ast, id: NodeId) -> Option<NodeId> {
    let mut parent = ast.parent(id);
    while let Some(p) = parent {
        match ast.kind(p) {
            NodeKind::File => return None,
            NodeKind::Function { .. } | NodeKind::Class { .. } | NodeKind::DocComment => {
                return Some(p)
            }
            _ => {}
        }
        parent = ast.parent(p);
    }
    None
}

/// Statement block of a function-like node.
pub fn function_body(ast: &Ast, function: NodeId) -> Option<NodeId> {
    match ast.kind(function) {
        NodeKind::Function { body: Some(body), .. }
            if matches!(ast.kind(*body), NodeKind::Block) =>
        {
            Some(*body)
        }
        _ => None,
    }
}

/// Resolves an expression to a string-literal node where that can be done
/// conservatively: literals directly, field/constant references through
/// their declared default, and plain variables through the enclosing
/// function's assignments - but only when exactly one non-compound
/// assignment stores a string literal into that variable. Ambiguity
/// yields `None`; this is a syntax-shape heuristic, not real
/// single-assignment analysis.
pub fn resolve_string_literal(
    ast: &Ast,
    resolver: &dyn SymbolResolver,
    id: NodeId,
) -> Option<NodeId> {
    let obj = unwrap_parentheses(ast, id);

    match ast.kind(obj) {
        NodeKind::StringLiteral { .. } => Some(obj),

        NodeKind::PropertyAccess { .. } | NodeKind::ClassConstAccess { .. } => {
            let declaration = resolver.resolve_member(obj)?;
            let default = match ast.kind(declaration) {
                NodeKind::Field {
                    default: Some(default),
                    ..
                } => *default,
                NodeKind::ClassConst { value: Some(value), .. } => *value,
                _ => return None,
            };
            matches!(ast.kind(default), NodeKind::StringLiteral { .. }).then_some(default)
        }

        NodeKind::Variable { name } if !name.is_empty() => {
            let scope = enclosing_function(ast, obj)?;
            let mut matched = Vec::new();
            for candidate in ast.descendants(scope) {
                let NodeKind::Assignment {
                    target,
                    value,
                    compound: false,
                } = ast.kind(candidate)
                else {
                    continue;
                };
                let NodeKind::Variable { name: target_name } = ast.kind(*target) else {
                    continue;
                };
                if target_name == name
                    && matches!(ast.kind(*value), NodeKind::StringLiteral { .. })
                {
                    matched.push(*value);
                }
            }
            if matched.len() == 1 {
                Some(matched[0])
            } else {
                None
            }
        }

        _ => None,
    }
}
