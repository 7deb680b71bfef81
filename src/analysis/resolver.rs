//! Symbol resolution behind an injected trait, so detectors never depend
//! on a concrete tree or index implementation.
//!
//! `FileSymbols` is the default single-file resolver: `$this`, `self` and
//! `static` resolve inside the enclosing class; any other receiver only
//! resolves when exactly one indexed declaration carries the name.
//! Everything else is "unresolved" and detectors are required to skip.

use std::collections::HashMap;

use crate::ast::{Ast, ClassKind, NodeId, NodeKind};

use super::semantics;

/// A successfully resolved method declaration with the class facts the
/// detectors need.
#[derive(Debug, Clone)]
pub struct ResolvedMethod {
    pub declaration: NodeId,
    pub is_static: bool,
    pub is_abstract: bool,
    pub class_name: String,
    pub class_fqn: String,
    pub class_is_interface: bool,
}

/// Resolution service injected into the analysis context.
pub trait SymbolResolver {
    /// Resolve a `MethodCall` node to its declaration.
    fn resolve_method(&self, call: NodeId) -> Option<ResolvedMethod>;

    /// Resolve a `PropertyAccess` or `ClassConstAccess` node to the
    /// `Field`/`ClassConst` declaration node.
    fn resolve_member(&self, reference: NodeId) -> Option<NodeId>;
}

#[derive(Debug)]
struct ClassEntry {
    node: NodeId,
    name: String,
    kind: ClassKind,
    methods: HashMap<String, NodeId>,
    fields: HashMap<String, NodeId>,
    consts: HashMap<String, NodeId>,
}

/// Index of every declaration in one parsed file.
pub struct FileSymbols<'a> {
    ast: &'a Ast,
    classes: Vec<ClassEntry>,
}

impl<'a> FileSymbols<'a> {
    pub fn build(ast: &'a Ast) -> Self {
        let mut classes = Vec::new();

        for node in ast.preorder() {
            let NodeKind::Class { name, kind, .. } = ast.kind(node) else {
                continue;
            };
            let mut entry = ClassEntry {
                node,
                name: name.clone(),
                kind: *kind,
                methods: HashMap::new(),
                fields: HashMap::new(),
                consts: HashMap::new(),
            };
            for member in ast.descendants(node).skip(1) {
                // skip members of nested classes and functions declared
                // inside method bodies
                if owning_class(ast, member) != Some(node) {
                    continue;
                }
                match ast.kind(member) {
                    NodeKind::Function {
                        name: Some(method_name),
                        ..
                    } => {
                        entry
                            .methods
                            .entry(method_name.clone())
                            .or_insert(member);
                    }
                    NodeKind::Field { name, .. } => {
                        entry.fields.entry(name.clone()).or_insert(member);
                    }
                    NodeKind::ClassConst { name, .. } => {
                        entry.consts.entry(name.clone()).or_insert(member);
                    }
                    _ => {}
                }
            }
            classes.push(entry);
        }

        Self { ast, classes }
    }

    fn class_of(&self, node: NodeId) -> Option<&ClassEntry> {
        let class_node = enclosing_class(self.ast, node)?;
        self.classes.iter().find(|c| c.node == class_node)
    }

    fn class_named(&self, name: &str) -> Option<&ClassEntry> {
        let trimmed = name.trim_start_matches('\\');
        self.classes.iter().find(|c| c.name == trimmed)
    }

    fn resolved(&self, entry: &ClassEntry, declaration: NodeId) -> Option<ResolvedMethod> {
        let NodeKind::Function {
            is_static,
            is_abstract,
            ..
        } = self.ast.kind(declaration)
        else {
            return None;
        };
        Some(ResolvedMethod {
            declaration,
            is_static: *is_static,
            is_abstract: *is_abstract,
            class_name: entry.name.clone(),
            class_fqn: format!("\\{}", entry.name),
            class_is_interface: entry.kind == ClassKind::Interface,
        })
    }
}

impl SymbolResolver for FileSymbols<'_> {
    fn resolve_method(&self, call: NodeId) -> Option<ResolvedMethod> {
        let NodeKind::MethodCall {
            receiver,
            name: Some(method_name),
            ..
        } = self.ast.kind(call)
        else {
            return None;
        };

        if is_this(self.ast, *receiver) {
            let entry = self.class_of(call)?;
            let declaration = *entry.methods.get(method_name)?;
            return self.resolved(entry, declaration);
        }

        // any other receiver: only an unambiguous name match resolves
        let mut candidates = self
            .classes
            .iter()
            .filter_map(|entry| entry.methods.get(method_name).map(|&decl| (entry, decl)));
        let (entry, declaration) = candidates.next()?;
        if candidates.next().is_some() {
            return None;
        }
        self.resolved(entry, declaration)
    }

    fn resolve_member(&self, reference: NodeId) -> Option<NodeId> {
        match self.ast.kind(reference) {
            NodeKind::PropertyAccess {
                receiver,
                name: Some(field_name),
            } => {
                if is_this(self.ast, *receiver) {
                    return self.class_of(reference)?.fields.get(field_name).copied();
                }
                let mut candidates = self
                    .classes
                    .iter()
                    .filter_map(|entry| entry.fields.get(field_name).copied());
                let declaration = candidates.next()?;
                candidates.next().is_none().then_some(declaration)
            }

            NodeKind::ClassConstAccess { class, name } => {
                if matches!(class.as_str(), "self" | "static" | "parent") {
                    return self.class_of(reference)?.consts.get(name).copied();
                }
                if let Some(entry) = self.class_named(class) {
                    return entry.consts.get(name).copied();
                }
                None
            }

            _ => None,
        }
    }
}

fn is_this(ast: &Ast, node: NodeId) -> bool {
    let unwrapped = semantics::unwrap_parentheses(ast, node);
    matches!(ast.kind(unwrapped), NodeKind::Variable { name } if name == "this")
}

fn enclosing_class(ast: &Ast, node: NodeId) -> Option<NodeId> {
    let mut parent = ast.parent(node);
    while let Some(p) = parent {
        match ast.kind(p) {
            NodeKind::Class { .. } => return Some(p),
            NodeKind::File => return None,
            _ => {}
        }
        parent = ast.parent(p);
    }
    None
}

/// Class a declaration belongs to directly: the walk stops at any
/// function boundary so helpers declared inside method bodies are not
/// indexed as members.
fn owning_class(ast: &Ast, node: NodeId) -> Option<NodeId> {
    let mut parent = ast.parent(node);
    while let Some(p) = parent {
        match ast.kind(p) {
            NodeKind::Class { .. } => return Some(p),
            NodeKind::Function { .. } | NodeKind::File => return None,
            _ => {}
        }
        parent = ast.parent(p);
    }
    None
}
