//! Arena-backed PHP syntax tree.
//!
//! The tree is immutable once built: nodes live in a flat arena, are
//! addressed by [`NodeId`], and carry a parent back-reference plus their
//! ordered children. Detectors navigate the tree through the accessors
//! here and never mutate it; rewrites are expressed as edit scripts in
//! the `fix` module instead.

use std::fmt;

/// Index of a node inside an [`Ast`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Byte span plus the 1-based line/column of its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Kind of class-like declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Trait,
}

/// Unary operators the analysis distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
    BitNot,
    ErrorSuppress,
}

/// Binary operators. `Other` covers operators no detector inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `&&`
    And,
    /// `||`
    Or,
    /// `and` (low precedence)
    AndKeyword,
    /// `or` (low precedence)
    OrKeyword,
    Xor,
    Concat,
    Eq,
    NotEq,
    Identical,
    NotIdentical,
    Lt,
    Gt,
    Le,
    Ge,
    Spaceship,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Coalesce,
    InstanceOf,
    Other,
}

/// Closed tagged union of everything the analyzer can encounter.
///
/// Role references (`NodeId` fields) always point at nodes that are also
/// present in the owning node's ordered `children`, so sibling navigation
/// and role-based access agree with each other.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    File,
    /// `{ ... }` statement group.
    Block,
    /// `/** ... */` comment kept in the statement stream.
    DocComment,
    ExprStatement {
        expr: NodeId,
    },
    Return {
        value: Option<NodeId>,
    },
    Unset {
        args: Vec<NodeId>,
    },
    If,
    While,
    DoWhile,
    For,
    Switch,
    Foreach {
        collection: Option<NodeId>,
        key: Option<NodeId>,
        key_by_ref: bool,
        value: Option<NodeId>,
        value_by_ref: bool,
        body: Option<NodeId>,
    },
    /// Function, method or closure. `is_static`/`is_abstract` only carry
    /// meaning for methods; closures have no name.
    Function {
        name: Option<String>,
        params: Vec<NodeId>,
        body: Option<NodeId>,
        is_static: bool,
        is_abstract: bool,
    },
    Class {
        name: String,
        kind: ClassKind,
        is_abstract: bool,
    },
    Parameter {
        name: String,
        default: Option<NodeId>,
    },
    Field {
        name: String,
        default: Option<NodeId>,
        is_static: bool,
    },
    ClassConst {
        name: String,
        value: Option<NodeId>,
    },
    Paren {
        inner: NodeId,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Cast {
        ty: String,
        operand: NodeId,
    },
    Binary {
        op: BinaryOp,
        lhs: NodeId,
        rhs: NodeId,
    },
    Ternary {
        condition: NodeId,
        then_branch: Option<NodeId>,
        else_branch: NodeId,
    },
    Assignment {
        target: NodeId,
        value: NodeId,
        compound: bool,
    },
    Variable {
        name: String,
    },
    /// `$obj->name`; `name` is `None` for dynamic members.
    PropertyAccess {
        receiver: NodeId,
        name: Option<String>,
    },
    /// `Foo::NAME`, `self::NAME`.
    ClassConstAccess {
        class: String,
        name: String,
    },
    FunctionCall {
        name: String,
        args: Vec<NodeId>,
    },
    MethodCall {
        receiver: NodeId,
        name: Option<String>,
        args: Vec<NodeId>,
    },
    StaticCall {
        class: String,
        name: String,
        args: Vec<NodeId>,
    },
    /// `$callable(...)` or any call through a computed callee.
    DynamicCall {
        callee: NodeId,
        args: Vec<NodeId>,
    },
    ArrayLiteral {
        elements: Vec<NodeId>,
    },
    ArrayElement {
        key: Option<NodeId>,
        value: NodeId,
    },
    Subscript {
        container: NodeId,
        index: Option<NodeId>,
    },
    StringLiteral {
        value: String,
    },
    IntLiteral {
        value: i64,
    },
    FloatLiteral {
        value: f64,
    },
    BoolLiteral {
        value: bool,
    },
    NullLiteral,
    /// Any construct the detectors never inspect structurally.
    Other,
}

impl NodeKind {
    /// True for every call-expression form.
    pub fn is_call(&self) -> bool {
        matches!(
            self,
            NodeKind::FunctionCall { .. }
                | NodeKind::MethodCall { .. }
                | NodeKind::StaticCall { .. }
                | NodeKind::DynamicCall { .. }
        )
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    span: Span,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An immutable syntax tree plus the source text it was built from.
#[derive(Debug, Clone)]
pub struct Ast {
    nodes: Vec<NodeData>,
    root: NodeId,
    source: String,
}

impl Ast {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes[id.index()].span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Source text covered by the node's span.
    pub fn text(&self, id: NodeId) -> &str {
        let span = self.span(id);
        self.source.get(span.start..span.end).unwrap_or_default()
    }

    /// Next node in the parent's child list, in source order.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == id)?;
        pos.checked_sub(1).map(|p| siblings[p])
    }

    /// Preorder traversal of the whole tree.
    pub fn preorder(&self) -> Preorder<'_> {
        self.descendants(self.root)
    }

    /// Preorder traversal of the subtree rooted at `id` (inclusive).
    pub fn descendants(&self, id: NodeId) -> Preorder<'_> {
        Preorder {
            ast: self,
            stack: vec![id],
        }
    }

    /// Structural equivalence: same shape, names, operators and literal
    /// content; spans and arena identities are ignored.
    pub fn are_equivalent(&self, a: NodeId, b: NodeId) -> bool {
        if a == b {
            return true;
        }
        if !shallow_eq(self.kind(a), self.kind(b)) {
            return false;
        }
        let ca = self.children(a);
        let cb = self.children(b);
        ca.len() == cb.len()
            && ca
                .iter()
                .zip(cb.iter())
                .all(|(&x, &y)| self.are_equivalent(x, y))
    }
}

fn shallow_eq(a: &NodeKind, b: &NodeKind) -> bool {
    use NodeKind::*;
    match (a, b) {
        (Variable { name: x }, Variable { name: y }) => x == y,
        (PropertyAccess { name: x, .. }, PropertyAccess { name: y, .. }) => x == y,
        (ClassConstAccess { class: cx, name: nx }, ClassConstAccess { class: cy, name: ny }) => {
            cx == cy && nx == ny
        }
        (FunctionCall { name: x, .. }, FunctionCall { name: y, .. }) => x == y,
        (MethodCall { name: x, .. }, MethodCall { name: y, .. }) => x == y,
        (StaticCall { class: cx, name: nx, .. }, StaticCall { class: cy, name: ny, .. }) => {
            cx == cy && nx == ny
        }
        (Unary { op: x, .. }, Unary { op: y, .. }) => x == y,
        (Binary { op: x, .. }, Binary { op: y, .. }) => x == y,
        (Cast { ty: x, .. }, Cast { ty: y, .. }) => x == y,
        (Assignment { compound: x, .. }, Assignment { compound: y, .. }) => x == y,
        (StringLiteral { value: x }, StringLiteral { value: y }) => x == y,
        (IntLiteral { value: x }, IntLiteral { value: y }) => x == y,
        (FloatLiteral { value: x }, FloatLiteral { value: y }) => x == y,
        (BoolLiteral { value: x }, BoolLiteral { value: y }) => x == y,
        (Parameter { name: x, .. }, Parameter { name: y, .. }) => x == y,
        (
            Field {
                name: x,
                is_static: sx,
                ..
            },
            Field {
                name: y,
                is_static: sy,
                ..
            },
        ) => x == y && sx == sy,
        (ClassConst { name: x, .. }, ClassConst { name: y, .. }) => x == y,
        (
            Function {
                name: nx,
                is_static: sx,
                is_abstract: ax,
                ..
            },
            Function {
                name: ny,
                is_static: sy,
                is_abstract: ay,
                ..
            },
        ) => nx == ny && sx == sy && ax == ay,
        (
            Class {
                name: nx,
                kind: kx,
                is_abstract: ax,
            },
            Class {
                name: ny,
                kind: ky,
                is_abstract: ay,
            },
        ) => nx == ny && kx == ky && ax == ay,
        (
            Foreach {
                key_by_ref: kx,
                value_by_ref: vx,
                ..
            },
            Foreach {
                key_by_ref: ky,
                value_by_ref: vy,
                ..
            },
        ) => kx == ky && vx == vy,
        (ArrayElement { key: kx, .. }, ArrayElement { key: ky, .. }) => {
            kx.is_some() == ky.is_some()
        }
        _ => std::mem::discriminant(a) == std::mem::discriminant(b),
    }
}

/// Preorder iterator over a subtree.
pub struct Preorder<'a> {
    ast: &'a Ast,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let children = self.ast.children(id);
        self.stack.extend(children.iter().rev().copied());
        Some(id)
    }
}

/// Incremental arena construction used by the parser frontend.
pub struct AstBuilder {
    nodes: Vec<NodeData>,
    source: String,
}

impl AstBuilder {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            nodes: Vec::new(),
            source: source.into(),
        }
    }

    /// Add a node whose children were already built; wires their parent
    /// links back to the new node.
    pub fn push(&mut self, kind: NodeKind, span: Span, children: Vec<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        for &child in &children {
            self.nodes[child.index()].parent = Some(id);
        }
        self.nodes.push(NodeData {
            kind,
            span,
            parent: None,
            children,
        });
        id
    }

    pub fn finish(self, root: NodeId) -> Ast {
        Ast {
            nodes: self.nodes,
            root,
            source: self.source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variable(builder: &mut AstBuilder, name: &str, start: usize) -> NodeId {
        let span = Span::new(start, start + name.len() + 1, 1, start as u32 + 1);
        builder.push(
            NodeKind::Variable {
                name: name.to_string(),
            },
            span,
            vec![],
        )
    }

    #[test]
    fn sibling_navigation_follows_child_order() {
        let mut builder = AstBuilder::new("$a $b");
        let a = variable(&mut builder, "a", 0);
        let b = variable(&mut builder, "b", 3);
        let root = builder.push(NodeKind::File, Span::new(0, 5, 1, 1), vec![a, b]);
        let ast = builder.finish(root);

        assert_eq!(ast.next_sibling(a), Some(b));
        assert_eq!(ast.next_sibling(b), None);
        assert_eq!(ast.prev_sibling(b), Some(a));
        assert_eq!(ast.parent(a), Some(root));
    }

    #[test]
    fn equivalence_ignores_identity_but_not_names() {
        let mut builder = AstBuilder::new("$a $a $b");
        let a1 = variable(&mut builder, "a", 0);
        let a2 = variable(&mut builder, "a", 3);
        let b = variable(&mut builder, "b", 6);
        let root = builder.push(NodeKind::File, Span::new(0, 8, 1, 1), vec![a1, a2, b]);
        let ast = builder.finish(root);

        assert!(ast.are_equivalent(a1, a2));
        assert!(!ast.are_equivalent(a1, b));
    }

    #[test]
    fn preorder_visits_parent_before_children() {
        let mut builder = AstBuilder::new("$a");
        let a = variable(&mut builder, "a", 0);
        let stmt = builder.push(
            NodeKind::ExprStatement { expr: a },
            Span::new(0, 2, 1, 1),
            vec![a],
        );
        let root = builder.push(NodeKind::File, Span::new(0, 2, 1, 1), vec![stmt]);
        let ast = builder.finish(root);

        let order: Vec<NodeId> = ast.preorder().collect();
        assert_eq!(order, vec![root, stmt, a]);
    }
}
