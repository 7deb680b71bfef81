//! PHP frontend: parses source with tree-sitter and lowers the concrete
//! tree into the arena model from `crate::ast`.
//!
//! The lowering is deliberately tolerant. Constructs the analysis never
//! inspects become `NodeKind::Other` with their children attached, and a
//! tree containing ERROR nodes still yields a best-effort `Ast`: the
//! detectors skip shapes they cannot recognize, so a partial tree
//! degrades to fewer findings, never to a failed run.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tree_sitter::Node as TsNode;

use crate::ast::{Ast, AstBuilder, BinaryOp, ClassKind, NodeId, NodeKind, Span, UnaryOp};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to load the PHP grammar: {0}")]
    Language(#[from] tree_sitter::LanguageError),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("tree-sitter produced no syntax tree")]
    NoTree,
}

/// Parser for PHP source files.
pub struct PhpParser {
    parser: tree_sitter::Parser,
}

impl PhpParser {
    pub fn new() -> Result<Self, ParseError> {
        let mut parser = tree_sitter::Parser::new();
        parser.set_language(&tree_sitter_php::language_php())?;
        Ok(Self { parser })
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<Ast, ParseError> {
        let source = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_source(&source)
    }

    pub fn parse_source(&mut self, source: &str) -> Result<Ast, ParseError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(ParseError::NoTree)?;
        let mut lowering = Lowering {
            source,
            builder: AstBuilder::new(source),
        };
        let root = lowering.lower_program(tree.root_node());
        Ok(lowering.builder.finish(root))
    }
}

struct Lowering<'a> {
    source: &'a str,
    builder: AstBuilder,
}

impl<'a> Lowering<'a> {
    fn text(&self, node: TsNode<'_>) -> &'a str {
        &self.source[node.byte_range()]
    }

    fn span(&self, node: TsNode<'_>) -> Span {
        let start = node.start_position();
        Span::new(
            node.start_byte(),
            node.end_byte(),
            start.row as u32 + 1,
            start.column as u32 + 1,
        )
    }

    fn named_children<'t>(&self, node: TsNode<'t>) -> Vec<TsNode<'t>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor).collect()
    }

    fn has_child_of_kind(&self, node: TsNode<'_>, kind: &str) -> bool {
        self.named_children(node).iter().any(|c| c.kind() == kind)
    }

    fn lower_program(&mut self, node: TsNode<'_>) -> NodeId {
        let children = self.lower_all(node);
        self.builder.push(NodeKind::File, self.span(node), children)
    }

    fn lower_all(&mut self, node: TsNode<'_>) -> Vec<NodeId> {
        self.named_children(node)
            .into_iter()
            .filter_map(|child| self.lower(child))
            .collect()
    }

    fn generic(&mut self, node: TsNode<'_>, kind: NodeKind) -> Option<NodeId> {
        let children = self.lower_all(node);
        Some(self.builder.push(kind, self.span(node), children))
    }

    fn lower(&mut self, node: TsNode<'_>) -> Option<NodeId> {
        match node.kind() {
            "php_tag" | "text" | "text_interpolation" => None,
            "comment" => {
                if self.text(node).starts_with("/**") {
                    let span = self.span(node);
                    Some(self.builder.push(NodeKind::DocComment, span, vec![]))
                } else {
                    None
                }
            }
            "compound_statement" | "declaration_list" | "colon_block" => {
                self.generic(node, NodeKind::Block)
            }
            "expression_statement" => {
                let expr = self
                    .named_children(node)
                    .into_iter()
                    .find_map(|c| self.lower(c))?;
                Some(self.builder.push(
                    NodeKind::ExprStatement { expr },
                    self.span(node),
                    vec![expr],
                ))
            }
            "return_statement" => {
                let value = self
                    .named_children(node)
                    .into_iter()
                    .find_map(|c| self.lower(c));
                let children = value.into_iter().collect();
                Some(
                    self.builder
                        .push(NodeKind::Return { value }, self.span(node), children),
                )
            }
            "unset_statement" => {
                let args = self.lower_all(node);
                Some(self.builder.push(
                    NodeKind::Unset { args: args.clone() },
                    self.span(node),
                    args,
                ))
            }
            "if_statement" => self.generic(node, NodeKind::If),
            "else_clause" | "else_if_clause" => self.generic(node, NodeKind::Other),
            "while_statement" => self.generic(node, NodeKind::While),
            "do_statement" => self.generic(node, NodeKind::DoWhile),
            "for_statement" => self.generic(node, NodeKind::For),
            "switch_statement" => self.generic(node, NodeKind::Switch),
            "foreach_statement" => self.lower_foreach(node),
            "ERROR" => {
                // an illegal binding list can demote the whole loop to an
                // ERROR node; recover it when the foreach keyword is there
                let is_foreach = (0..node.child_count())
                    .filter_map(|i| node.child(i))
                    .any(|c| c.kind() == "foreach");
                if is_foreach {
                    self.lower_foreach(node)
                } else {
                    self.generic(node, NodeKind::Other)
                }
            }
            "function_definition"
            | "method_declaration"
            | "anonymous_function_creation_expression"
            | "anonymous_function"
            | "arrow_function" => self.lower_function(node),
            "class_declaration" => self.lower_class(node, ClassKind::Class),
            "interface_declaration" => self.lower_class(node, ClassKind::Interface),
            "trait_declaration" => self.lower_class(node, ClassKind::Trait),
            "property_declaration" => self.lower_property_declaration(node),
            "const_declaration" => self.lower_const_declaration(node),
            "parenthesized_expression" => {
                let inner = self
                    .named_children(node)
                    .into_iter()
                    .find_map(|c| self.lower(c))?;
                Some(self.builder.push(
                    NodeKind::Paren { inner },
                    self.span(node),
                    vec![inner],
                ))
            }
            "unary_op_expression" => self.lower_unary(node),
            "error_suppression_expression" => {
                let operand = self
                    .named_children(node)
                    .into_iter()
                    .find_map(|c| self.lower(c))?;
                Some(self.builder.push(
                    NodeKind::Unary {
                        op: UnaryOp::ErrorSuppress,
                        operand,
                    },
                    self.span(node),
                    vec![operand],
                ))
            }
            "cast_expression" => self.lower_cast(node),
            "binary_expression" => self.lower_binary(node),
            "conditional_expression" => self.lower_ternary(node),
            "assignment_expression" | "reference_assignment_expression" => {
                self.lower_assignment(node, false)
            }
            "augmented_assignment_expression" => self.lower_assignment(node, true),
            "variable_name" => {
                let name = self.text(node).trim_start_matches('$').to_string();
                Some(
                    self.builder
                        .push(NodeKind::Variable { name }, self.span(node), vec![]),
                )
            }
            "member_access_expression" | "nullsafe_member_access_expression" => {
                self.lower_member_access(node)
            }
            "member_call_expression" | "nullsafe_member_call_expression" => {
                self.lower_member_call(node)
            }
            "scoped_call_expression" => self.lower_scoped_call(node),
            "class_constant_access_expression" => {
                let named = self.named_children(node);
                let class = named.first().map(|n| self.text(*n).to_string())?;
                let name = named.get(1).map(|n| self.text(*n).to_string())?;
                Some(self.builder.push(
                    NodeKind::ClassConstAccess { class, name },
                    self.span(node),
                    vec![],
                ))
            }
            "function_call_expression" => self.lower_function_call(node),
            "subscript_expression" => {
                let named = self.named_children(node);
                let container = named.first().copied().and_then(|c| self.lower(c))?;
                let index = named.get(1).copied().and_then(|c| self.lower(c));
                let mut children = vec![container];
                children.extend(index);
                Some(self.builder.push(
                    NodeKind::Subscript { container, index },
                    self.span(node),
                    children,
                ))
            }
            "array_creation_expression" => self.lower_array(node),
            "string" | "encapsed_string" | "heredoc" => {
                let value = strip_quotes(self.text(node));
                Some(self.builder.push(
                    NodeKind::StringLiteral { value },
                    self.span(node),
                    vec![],
                ))
            }
            "integer" => {
                let value = parse_int(self.text(node));
                Some(
                    self.builder
                        .push(NodeKind::IntLiteral { value }, self.span(node), vec![]),
                )
            }
            "float" => {
                let value = self
                    .text(node)
                    .replace('_', "")
                    .parse::<f64>()
                    .unwrap_or(0.0);
                Some(
                    self.builder
                        .push(NodeKind::FloatLiteral { value }, self.span(node), vec![]),
                )
            }
            "boolean" => {
                let value = self.text(node).eq_ignore_ascii_case("true");
                Some(
                    self.builder
                        .push(NodeKind::BoolLiteral { value }, self.span(node), vec![]),
                )
            }
            "null" => Some(
                self.builder
                    .push(NodeKind::NullLiteral, self.span(node), vec![]),
            ),
            _ => self.generic(node, NodeKind::Other),
        }
    }

    fn lower_unary(&mut self, node: TsNode<'_>) -> Option<NodeId> {
        let operand = self
            .named_children(node)
            .into_iter()
            .find_map(|c| self.lower(c))?;
        let op = match node.child(0).map(|c| self.text(c)) {
            Some("!") => UnaryOp::Not,
            Some("-") => UnaryOp::Minus,
            Some("+") => UnaryOp::Plus,
            Some("~") => UnaryOp::BitNot,
            Some("@") => UnaryOp::ErrorSuppress,
            _ => UnaryOp::Not,
        };
        Some(self.builder.push(
            NodeKind::Unary { op, operand },
            self.span(node),
            vec![operand],
        ))
    }

    fn lower_cast(&mut self, node: TsNode<'_>) -> Option<NodeId> {
        let named = self.named_children(node);
        let ty = named
            .iter()
            .find(|n| n.kind() == "cast_type")
            .map(|n| self.text(*n).to_string())
            .unwrap_or_default();
        let operand = named
            .into_iter()
            .filter(|n| n.kind() != "cast_type")
            .find_map(|c| self.lower(c))?;
        Some(self.builder.push(
            NodeKind::Cast { ty, operand },
            self.span(node),
            vec![operand],
        ))
    }

    fn lower_binary(&mut self, node: TsNode<'_>) -> Option<NodeId> {
        let (Some(left), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) else {
            return self.generic(node, NodeKind::Other);
        };
        let op = node
            .child_by_field_name("operator")
            .map(|o| binary_op(self.text(o)))
            .unwrap_or(BinaryOp::Other);
        let lhs = self.lower(left)?;
        let rhs = self.lower(right)?;
        Some(self.builder.push(
            NodeKind::Binary { op, lhs, rhs },
            self.span(node),
            vec![lhs, rhs],
        ))
    }

    fn lower_ternary(&mut self, node: TsNode<'_>) -> Option<NodeId> {
        let condition = node
            .child_by_field_name("condition")
            .and_then(|c| self.lower(c))?;
        let then_branch = node
            .child_by_field_name("body")
            .and_then(|c| self.lower(c));
        let else_branch = node
            .child_by_field_name("alternative")
            .and_then(|c| self.lower(c))?;
        let mut children = vec![condition];
        children.extend(then_branch);
        children.push(else_branch);
        Some(self.builder.push(
            NodeKind::Ternary {
                condition,
                then_branch,
                else_branch,
            },
            self.span(node),
            children,
        ))
    }

    fn lower_assignment(&mut self, node: TsNode<'_>, compound: bool) -> Option<NodeId> {
        let (Some(left), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) else {
            return self.generic(node, NodeKind::Other);
        };
        let target = self.lower(left)?;
        let value = self.lower(right)?;
        Some(self.builder.push(
            NodeKind::Assignment {
                target,
                value,
                compound,
            },
            self.span(node),
            vec![target, value],
        ))
    }

    fn lower_member_access(&mut self, node: TsNode<'_>) -> Option<NodeId> {
        let object = node.child_by_field_name("object")?;
        let receiver = self.lower(object)?;
        let name = node
            .child_by_field_name("name")
            .filter(|n| n.kind() == "name")
            .map(|n| self.text(n).to_string());
        Some(self.builder.push(
            NodeKind::PropertyAccess { receiver, name },
            self.span(node),
            vec![receiver],
        ))
    }

    fn lower_member_call(&mut self, node: TsNode<'_>) -> Option<NodeId> {
        let object = node.child_by_field_name("object")?;
        let receiver = self.lower(object)?;
        let name = node
            .child_by_field_name("name")
            .filter(|n| n.kind() == "name")
            .map(|n| self.text(n).to_string());
        let args = self.lower_arguments(node.child_by_field_name("arguments"));
        let mut children = vec![receiver];
        children.extend(args.iter().copied());
        Some(self.builder.push(
            NodeKind::MethodCall {
                receiver,
                name,
                args,
            },
            self.span(node),
            children,
        ))
    }

    fn lower_scoped_call(&mut self, node: TsNode<'_>) -> Option<NodeId> {
        let class = node
            .child_by_field_name("scope")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let args = self.lower_arguments(node.child_by_field_name("arguments"));
        Some(self.builder.push(
            NodeKind::StaticCall {
                class,
                name,
                args: args.clone(),
            },
            self.span(node),
            args,
        ))
    }

    fn lower_function_call(&mut self, node: TsNode<'_>) -> Option<NodeId> {
        let callee = node.child_by_field_name("function")?;
        let args = self.lower_arguments(node.child_by_field_name("arguments"));
        if callee.kind() == "name" {
            let name = self.text(callee).to_string();
            Some(self.builder.push(
                NodeKind::FunctionCall {
                    name,
                    args: args.clone(),
                },
                self.span(node),
                args,
            ))
        } else {
            let callee = self.lower(callee)?;
            let mut children = vec![callee];
            children.extend(args.iter().copied());
            Some(self.builder.push(
                NodeKind::DynamicCall { callee, args },
                self.span(node),
                children,
            ))
        }
    }

    fn lower_arguments(&mut self, node: Option<TsNode<'_>>) -> Vec<NodeId> {
        let Some(node) = node else {
            return Vec::new();
        };
        let mut args = Vec::new();
        for child in self.named_children(node) {
            let lowered = if child.kind() == "argument" {
                // named arguments keep only the value expression
                let label = child.child_by_field_name("name").map(|n| n.id());
                self.named_children(child)
                    .into_iter()
                    .filter(|n| Some(n.id()) != label)
                    .last()
                    .and_then(|n| self.lower(n))
            } else {
                self.lower(child)
            };
            args.extend(lowered);
        }
        args
    }

    fn lower_array(&mut self, node: TsNode<'_>) -> Option<NodeId> {
        let mut elements = Vec::new();
        for child in self.named_children(node) {
            if child.kind() != "array_element_initializer" {
                if let Some(other) = self.lower(child) {
                    elements.push(other);
                }
                continue;
            }
            let named = self.named_children(child);
            let element = match named.len() {
                0 => None,
                1 => self.lower(named[0]).map(|value| (None, value)),
                _ => {
                    let key = self.lower(named[0]);
                    let value = self.lower(named[named.len() - 1]);
                    value.map(|v| (key, v))
                }
            };
            if let Some((key, value)) = element {
                let mut children: Vec<NodeId> = key.into_iter().collect();
                children.push(value);
                elements.push(self.builder.push(
                    NodeKind::ArrayElement { key, value },
                    self.span(child),
                    children,
                ));
            }
        }
        Some(self.builder.push(
            NodeKind::ArrayLiteral {
                elements: elements.clone(),
            },
            self.span(node),
            elements,
        ))
    }

    fn lower_function(&mut self, node: TsNode<'_>) -> Option<NodeId> {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string());
        let is_static = self.has_child_of_kind(node, "static_modifier");
        let is_abstract = self.has_child_of_kind(node, "abstract_modifier");

        let mut params = Vec::new();
        if let Some(param_list) = node.child_by_field_name("parameters") {
            for param in self.named_children(param_list) {
                match param.kind() {
                    "simple_parameter" | "variadic_parameter" | "property_promotion_parameter" => {
                        let Some(pname) = param
                            .child_by_field_name("name")
                            .map(|n| self.text(n).trim_start_matches('$').to_string())
                        else {
                            continue;
                        };
                        let default = param
                            .child_by_field_name("default_value")
                            .and_then(|d| self.lower(d));
                        let children = default.into_iter().collect();
                        params.push(self.builder.push(
                            NodeKind::Parameter {
                                name: pname,
                                default,
                            },
                            self.span(param),
                            children,
                        ));
                    }
                    _ => {}
                }
            }
        }

        let body = node.child_by_field_name("body").and_then(|b| self.lower(b));
        let mut children = params.clone();
        children.extend(body);
        Some(self.builder.push(
            NodeKind::Function {
                name,
                params,
                body,
                is_static,
                is_abstract,
            },
            self.span(node),
            children,
        ))
    }

    fn lower_class(&mut self, node: TsNode<'_>, kind: ClassKind) -> Option<NodeId> {
        let name = node
            .child_by_field_name("name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let is_abstract = self.has_child_of_kind(node, "abstract_modifier");
        let body = node.child_by_field_name("body").and_then(|b| self.lower(b));
        let children = body.into_iter().collect();
        Some(self.builder.push(
            NodeKind::Class {
                name,
                kind,
                is_abstract,
            },
            self.span(node),
            children,
        ))
    }

    fn lower_property_declaration(&mut self, node: TsNode<'_>) -> Option<NodeId> {
        let is_static = self.has_child_of_kind(node, "static_modifier");
        let mut fields = Vec::new();
        for element in self.named_children(node) {
            if element.kind() != "property_element" {
                continue;
            }
            let named = self.named_children(element);
            let Some(name_node) = named.iter().find(|n| n.kind() == "variable_name") else {
                continue;
            };
            let name = self.text(*name_node).trim_start_matches('$').to_string();
            let default = named
                .iter()
                .filter(|n| n.kind() != "variable_name")
                .find_map(|n| {
                    if n.kind() == "property_initializer" {
                        self.named_children(*n)
                            .into_iter()
                            .find_map(|v| self.lower(v))
                    } else {
                        self.lower(*n)
                    }
                });
            let children = default.into_iter().collect();
            fields.push(self.builder.push(
                NodeKind::Field {
                    name,
                    default,
                    is_static,
                },
                self.span(element),
                children,
            ));
        }
        Some(self.builder.push(NodeKind::Other, self.span(node), fields))
    }

    fn lower_const_declaration(&mut self, node: TsNode<'_>) -> Option<NodeId> {
        let mut consts = Vec::new();
        for element in self.named_children(node) {
            if element.kind() != "const_element" {
                continue;
            }
            let named = self.named_children(element);
            let Some(name_node) = named.first() else {
                continue;
            };
            let name = self.text(*name_node).to_string();
            let value = named.get(1).copied().and_then(|v| self.lower(v));
            let children = value.into_iter().collect();
            consts.push(self.builder.push(
                NodeKind::ClassConst { name, value },
                self.span(element),
                children,
            ));
        }
        Some(self.builder.push(NodeKind::Other, self.span(node), consts))
    }

    fn lower_foreach(&mut self, node: TsNode<'_>) -> Option<NodeId> {
        let span = self.span(node);
        let body_ts = node.child_by_field_name("body");
        let body_id = body_ts.map(|n| n.id());

        let mut collection = None;
        let mut key = None;
        let mut key_by_ref = false;
        let mut value = None;
        let mut value_by_ref = false;

        if node.has_error() {
            // `foreach ($a as &$k => $v)` is illegal PHP and comes back from
            // tree-sitter wrapped in ERROR nodes; recover the binding list
            // from the raw token stream so the key-reference check still sees
            // it.
            let (k, kr, v, vr) = self.recover_foreach_bindings(node);
            key = k;
            key_by_ref = kr;
            value = v;
            value_by_ref = vr;
        } else {
            let named: Vec<TsNode<'_>> = self
                .named_children(node)
                .into_iter()
                .filter(|n| Some(n.id()) != body_id && n.kind() != "comment")
                .collect();
            let mut iter = named.into_iter();
            collection = iter.next().and_then(|c| self.lower(c));
            if let Some(binding) = iter.next() {
                match binding.kind() {
                    "pair" => {
                        let pnamed = self.named_children(binding);
                        key = pnamed.first().copied().and_then(|k| self.lower(k));
                        if let Some(v) = pnamed.get(1) {
                            if v.kind() == "by_ref" {
                                value_by_ref = true;
                                value = self
                                    .named_children(*v)
                                    .into_iter()
                                    .find_map(|inner| self.lower(inner));
                            } else {
                                value = self.lower(*v);
                            }
                        }
                    }
                    "by_ref" => {
                        value_by_ref = true;
                        value = self
                            .named_children(binding)
                            .into_iter()
                            .find_map(|inner| self.lower(inner));
                    }
                    _ => {
                        value = self.lower(binding);
                    }
                }
            }
        }

        let body = body_ts
            .and_then(|b| self.lower(b))
            .or_else(|| self.trailing_statement(node, body_id));

        let mut children = Vec::new();
        children.extend(collection);
        children.extend(key);
        children.extend(value);
        children.extend(body);
        Some(self.builder.push(
            NodeKind::Foreach {
                collection,
                key,
                key_by_ref,
                value,
                value_by_ref,
                body,
            },
            span,
            children,
        ))
    }

    /// Body fallback when the `body` field is unavailable on a recovered
    /// foreach: take the last named child that looks like a statement.
    fn trailing_statement(&mut self, node: TsNode<'_>, body_id: Option<usize>) -> Option<NodeId> {
        self.named_children(node)
            .into_iter()
            .filter(|n| Some(n.id()) != body_id)
            .filter(|n| n.kind() == "compound_statement" || n.kind().ends_with("_statement"))
            .last()
            .and_then(|n| self.lower(n))
    }

    fn recover_foreach_bindings(
        &mut self,
        node: TsNode<'_>,
    ) -> (Option<NodeId>, bool, Option<NodeId>, bool) {
        let mut tokens = Vec::new();
        collect_tokens(node, &mut tokens);

        let Some(as_pos) = tokens
            .iter()
            .position(|t| t.kind() == "as" || self.text(*t) == "as")
        else {
            return (None, false, None, false);
        };

        let mut bindings: Vec<(bool, TsNode<'_>)> = Vec::new();
        let mut pending_ref = false;
        for token in tokens.iter().skip(as_pos + 1) {
            match token.kind() {
                ")" => break,
                "&" => pending_ref = true,
                "variable_name" => {
                    bindings.push((pending_ref, *token));
                    pending_ref = false;
                }
                "=>" => {}
                _ => {}
            }
        }

        let mut make_variable = |ts: TsNode<'_>| {
            let name = self.text(ts).trim_start_matches('$').to_string();
            self.builder
                .push(NodeKind::Variable { name }, self.span(ts), vec![])
        };

        match bindings.len() {
            0 => (None, false, None, false),
            1 => {
                let (by_ref, var) = bindings[0];
                (None, false, Some(make_variable(var)), by_ref)
            }
            _ => {
                let (key_ref, key_var) = bindings[0];
                let (value_ref, value_var) = bindings[1];
                let key = make_variable(key_var);
                let value = make_variable(value_var);
                (Some(key), key_ref, Some(value), value_ref)
            }
        }
    }
}

/// Flattens a subtree into its leaf tokens; `variable_name` nodes are kept
/// whole so the foreach recovery can treat them as single bindings.
fn collect_tokens<'t>(node: TsNode<'t>, out: &mut Vec<TsNode<'t>>) {
    if node.kind() == "variable_name" || node.child_count() == 0 {
        out.push(node);
        return;
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            collect_tokens(child, out);
        }
    }
}

fn strip_quotes(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.len() >= 2 {
        let bytes = trimmed.as_bytes();
        if (bytes[0] == b'\'' && bytes[trimmed.len() - 1] == b'\'')
            || (bytes[0] == b'"' && bytes[trimmed.len() - 1] == b'"')
        {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}

fn parse_int(text: &str) -> i64 {
    let cleaned = text.replace('_', "");
    let parsed = if let Some(hex) = cleaned.strip_prefix("0x").or(cleaned.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = cleaned.strip_prefix("0b").or(cleaned.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2)
    } else if let Some(oct) = cleaned.strip_prefix("0o").or(cleaned.strip_prefix("0O")) {
        i64::from_str_radix(oct, 8)
    } else {
        cleaned.parse::<i64>()
    };
    parsed.unwrap_or(0)
}

fn binary_op(text: &str) -> BinaryOp {
    match text {
        "&&" => BinaryOp::And,
        "||" => BinaryOp::Or,
        "and" => BinaryOp::AndKeyword,
        "or" => BinaryOp::OrKeyword,
        "xor" => BinaryOp::Xor,
        "." => BinaryOp::Concat,
        "==" => BinaryOp::Eq,
        "!=" | "<>" => BinaryOp::NotEq,
        "===" => BinaryOp::Identical,
        "!==" => BinaryOp::NotIdentical,
        "<" => BinaryOp::Lt,
        ">" => BinaryOp::Gt,
        "<=" => BinaryOp::Le,
        ">=" => BinaryOp::Ge,
        "<=>" => BinaryOp::Spaceship,
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Mod,
        "**" => BinaryOp::Pow,
        "&" => BinaryOp::BitAnd,
        "|" => BinaryOp::BitOr,
        "^" => BinaryOp::BitXor,
        "<<" => BinaryOp::Shl,
        ">>" => BinaryOp::Shr,
        "??" => BinaryOp::Coalesce,
        "instanceof" => BinaryOp::InstanceOf,
        _ => BinaryOp::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;

    fn parse(code: &str) -> Ast {
        PhpParser::new().unwrap().parse_source(code).unwrap()
    }

    fn find_kind<'a>(ast: &'a Ast, pred: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        ast.preorder().filter(|&id| pred(ast.kind(id))).collect()
    }

    #[test]
    fn lowers_simple_assignment() {
        let ast = parse("<?php $a = 'hello';");
        let assignments = find_kind(&ast, |k| matches!(k, NodeKind::Assignment { .. }));
        assert_eq!(assignments.len(), 1);

        let NodeKind::Assignment { target, value, compound } = ast.kind(assignments[0]) else {
            unreachable!();
        };
        assert!(!compound);
        assert!(matches!(ast.kind(*target), NodeKind::Variable { name } if name == "a"));
        assert!(
            matches!(ast.kind(*value), NodeKind::StringLiteral { value } if value == "hello")
        );
    }

    #[test]
    fn lowers_compound_assignment_as_compound() {
        let ast = parse("<?php $a += 1;");
        let assignments = find_kind(&ast, |k| matches!(k, NodeKind::Assignment { .. }));
        assert_eq!(assignments.len(), 1);
        assert!(matches!(
            ast.kind(assignments[0]),
            NodeKind::Assignment { compound: true, .. }
        ));
    }

    #[test]
    fn lowers_not_chain() {
        let ast = parse("<?php $b = !!$a;");
        let nots = find_kind(
            &ast,
            |k| matches!(k, NodeKind::Unary { op: UnaryOp::Not, .. }),
        );
        assert_eq!(nots.len(), 2);
    }

    #[test]
    fn lowers_foreach_value_by_ref() {
        let ast = parse("<?php foreach ($items as &$item) { $item = 1; }");
        let loops = find_kind(&ast, |k| matches!(k, NodeKind::Foreach { .. }));
        assert_eq!(loops.len(), 1);
        let NodeKind::Foreach {
            value, value_by_ref, key, body, ..
        } = ast.kind(loops[0])
        else {
            unreachable!();
        };
        assert!(value_by_ref);
        assert!(key.is_none());
        assert!(body.is_some());
        let value = value.expect("value variable");
        assert!(matches!(ast.kind(value), NodeKind::Variable { name } if name == "item"));
    }

    #[test]
    fn lowers_foreach_key_value() {
        let ast = parse("<?php foreach ($map as $k => $v) {}");
        let loops = find_kind(&ast, |k| matches!(k, NodeKind::Foreach { .. }));
        let NodeKind::Foreach {
            key,
            key_by_ref,
            value,
            value_by_ref,
            collection,
            ..
        } = ast.kind(loops[0])
        else {
            unreachable!();
        };
        assert!(!key_by_ref);
        assert!(!value_by_ref);
        assert!(collection.is_some());
        assert!(matches!(
            ast.kind(key.expect("key")),
            NodeKind::Variable { name } if name == "k"
        ));
        assert!(matches!(
            ast.kind(value.expect("value")),
            NodeKind::Variable { name } if name == "v"
        ));
    }

    #[test]
    fn recovers_illegal_key_by_reference() {
        let ast = parse("<?php foreach ($map as &$k => $v) {}");
        let loops = find_kind(&ast, |k| matches!(k, NodeKind::Foreach { .. }));
        assert_eq!(loops.len(), 1);
        let NodeKind::Foreach { key_by_ref, key, .. } = ast.kind(loops[0]) else {
            unreachable!();
        };
        assert!(key_by_ref, "reference marker on the key must survive");
        assert!(key.is_some());
    }

    #[test]
    fn lowers_method_and_static_calls() {
        let ast = parse("<?php class A { function f() { $this->g(1); self::h(); } }");
        let methods = find_kind(&ast, |k| matches!(k, NodeKind::MethodCall { .. }));
        assert_eq!(methods.len(), 1);
        let NodeKind::MethodCall { receiver, name, args } = ast.kind(methods[0]) else {
            unreachable!();
        };
        assert_eq!(name.as_deref(), Some("g"));
        assert_eq!(args.len(), 1);
        assert!(matches!(ast.kind(*receiver), NodeKind::Variable { name } if name == "this"));

        let statics = find_kind(&ast, |k| matches!(k, NodeKind::StaticCall { .. }));
        assert_eq!(statics.len(), 1);
        let NodeKind::StaticCall { class, name, .. } = ast.kind(statics[0]) else {
            unreachable!();
        };
        assert_eq!(class, "self");
        assert_eq!(name, "h");
    }

    #[test]
    fn lowers_class_members() {
        let ast = parse(
            "<?php class A { const GREETING = 'hi'; private $name = 'anon'; static function s() {} }",
        );
        let consts = find_kind(&ast, |k| matches!(k, NodeKind::ClassConst { .. }));
        assert_eq!(consts.len(), 1);
        let fields = find_kind(&ast, |k| matches!(k, NodeKind::Field { .. }));
        assert_eq!(fields.len(), 1);
        let NodeKind::Field { name, default, .. } = ast.kind(fields[0]) else {
            unreachable!();
        };
        assert_eq!(name, "name");
        assert!(default.is_some());

        let functions = find_kind(
            &ast,
            |k| matches!(k, NodeKind::Function { is_static: true, .. }),
        );
        assert_eq!(functions.len(), 1);
    }

    #[test]
    fn lowers_ternary_and_parens() {
        let ast = parse("<?php $x = ($cond ? 'foo' : 'bar');");
        let parens = find_kind(&ast, |k| matches!(k, NodeKind::Paren { .. }));
        assert_eq!(parens.len(), 1);
        let ternaries = find_kind(&ast, |k| matches!(k, NodeKind::Ternary { .. }));
        assert_eq!(ternaries.len(), 1);
        let NodeKind::Ternary { then_branch, .. } = ast.kind(ternaries[0]) else {
            unreachable!();
        };
        assert!(then_branch.is_some());
    }

    #[test]
    fn lowers_call_user_func_statement() {
        let ast = parse("<?php call_user_func(array($obj, 'method'), 1, 2);");
        let calls = find_kind(&ast, |k| matches!(k, NodeKind::FunctionCall { .. }));
        assert_eq!(calls.len(), 1);
        let NodeKind::FunctionCall { name, args } = ast.kind(calls[0]) else {
            unreachable!();
        };
        assert_eq!(name, "call_user_func");
        assert_eq!(args.len(), 3);
        assert!(matches!(ast.kind(args[0]), NodeKind::ArrayLiteral { .. }));

        let parent = ast.parent(calls[0]).unwrap();
        assert!(matches!(ast.kind(parent), NodeKind::ExprStatement { .. }));
    }

    #[test]
    fn lowers_unset_statement() {
        let ast = parse("<?php unset($a, $b);");
        let unsets = find_kind(&ast, |k| matches!(k, NodeKind::Unset { .. }));
        assert_eq!(unsets.len(), 1);
        let NodeKind::Unset { args } = ast.kind(unsets[0]) else {
            unreachable!();
        };
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn doc_comments_survive_line_comments_do_not() {
        let ast = parse("<?php /** @var int $a */ $a = 1; // trailing\n$b = 2;");
        let docs = find_kind(&ast, |k| matches!(k, NodeKind::DocComment));
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn unparsed_constructs_become_other_nodes() {
        let ast = parse("<?php try { $a = 1; } catch (Exception $e) { }");
        assert!(ast.len() > 1);
        let assignments = find_kind(&ast, |k| matches!(k, NodeKind::Assignment { .. }));
        assert_eq!(assignments.len(), 1);
    }
}
