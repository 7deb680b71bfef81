//! Turns edit scripts into byte-range text edits and applies them
//! transactionally: either every edit of a fix lands or none does.

use thiserror::Error;

use crate::ast::{Ast, NodeId, NodeKind};

use super::{Fix, FixOp};

#[derive(Debug, Error)]
pub enum FixError {
    #[error("no access operator found after the receiver")]
    MissingAccessOperator,

    #[error("fix target is not a call expression")]
    NotACall,

    #[error("edits overlap; fix cannot be applied")]
    OverlappingEdits,
}

/// One byte-range replacement in the original source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

/// Result of applying a batch of fixes to one file.
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    pub source: String,
    pub applied: usize,
    pub skipped: usize,
}

/// Renders and applies fixes against the tree they were produced from.
pub struct FixApplier<'a> {
    ast: &'a Ast,
}

impl<'a> FixApplier<'a> {
    pub fn new(ast: &'a Ast) -> Self {
        Self { ast }
    }

    /// Lower a fix into concrete text edits, sorted by start offset.
    pub fn render(&self, fix: &Fix) -> Result<Vec<TextEdit>, FixError> {
        let mut edits = Vec::new();
        for op in &fix.ops {
            edits.push(self.render_op(op)?);
        }
        edits.sort_by_key(|e| e.start);
        for pair in edits.windows(2) {
            if pair[1].start < pair[0].end {
                return Err(FixError::OverlappingEdits);
            }
        }
        Ok(edits)
    }

    /// Apply a single fix to the source text.
    pub fn apply(&self, source: &str, fix: &Fix) -> Result<String, FixError> {
        let edits = self.render(fix)?;
        Ok(splice(source, &edits))
    }

    /// Apply every fix that does not conflict with an earlier one.
    /// Later fixes whose edits overlap already-claimed ranges are
    /// skipped and counted, never half-applied.
    pub fn apply_all(&self, source: &str, fixes: &[&Fix]) -> ApplyOutcome {
        let mut accepted: Vec<TextEdit> = Vec::new();
        let mut applied = 0usize;
        let mut skipped = 0usize;

        for fix in fixes {
            let Ok(edits) = self.render(fix) else {
                skipped += 1;
                continue;
            };
            let conflicts = edits.iter().any(|e| {
                accepted
                    .iter()
                    .any(|a| e.start < a.end && a.start < e.end)
            });
            if conflicts {
                skipped += 1;
                continue;
            }
            accepted.extend(edits);
            applied += 1;
        }

        accepted.sort_by_key(|e| e.start);
        ApplyOutcome {
            source: splice(source, &accepted),
            applied,
            skipped,
        }
    }

    fn render_op(&self, op: &FixOp) -> Result<TextEdit, FixError> {
        match op {
            FixOp::ReplaceWithNode { target, source } => {
                let span = self.ast.span(*target);
                Ok(TextEdit {
                    start: span.start,
                    end: span.end,
                    replacement: self.ast.text(*source).to_string(),
                })
            }

            FixOp::ReplaceWithText { target, text } => {
                let span = self.ast.span(*target);
                Ok(TextEdit {
                    start: span.start,
                    end: span.end,
                    replacement: text.clone(),
                })
            }

            FixOp::ReplaceAccessOperator {
                call,
                receiver,
                text,
            } => {
                let call_span = self.ast.span(*call);
                let receiver_span = self.ast.span(*receiver);
                let window = self
                    .ast
                    .source()
                    .get(receiver_span.end..call_span.end)
                    .ok_or(FixError::MissingAccessOperator)?;
                let offset = window
                    .find("->")
                    .ok_or(FixError::MissingAccessOperator)?;
                let start = receiver_span.end + offset;
                Ok(TextEdit {
                    start,
                    end: start + 2,
                    replacement: text.clone(),
                })
            }

            FixOp::SynthesizeCall { call, name, args } => {
                let rendered_args = args
                    .iter()
                    .map(|&a| self.ast.text(a))
                    .collect::<Vec<_>>()
                    .join(", ");
                let replacement = match self.ast.kind(*call) {
                    NodeKind::MethodCall { receiver, .. } => {
                        format!("{}->{}({})", self.ast.text(*receiver), name, rendered_args)
                    }
                    NodeKind::StaticCall { class, .. } => {
                        format!("{class}::{name}({rendered_args})")
                    }
                    NodeKind::FunctionCall { .. } | NodeKind::DynamicCall { .. } => {
                        format!("{name}({rendered_args})")
                    }
                    _ => return Err(FixError::NotACall),
                };
                let span = self.ast.span(*call);
                Ok(TextEdit {
                    start: span.start,
                    end: span.end,
                    replacement,
                })
            }
        }
    }

    /// One-line before/after preview used by interactive mode.
    pub fn preview(&self, source: &str, fix: &Fix, anchor: NodeId) -> Option<(String, String)> {
        let span = self.ast.span(anchor);
        let line_start = source[..span.start].rfind('\n').map_or(0, |p| p + 1);
        let line_end = source[span.start..]
            .find('\n')
            .map_or(source.len(), |p| span.start + p);

        let patched = self.apply(source, fix).ok()?;
        // the edited line starts at the same offset; edits never reach
        // backwards past the fix anchor's line start
        let patched_end = patched[line_start.min(patched.len())..]
            .find('\n')
            .map_or(patched.len(), |p| line_start + p);

        let before = source.get(line_start..line_end)?.trim().to_string();
        let after = patched.get(line_start..patched_end)?.trim().to_string();
        Some((before, after))
    }
}

fn splice(source: &str, edits: &[TextEdit]) -> String {
    let mut result = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for edit in edits {
        if edit.start < cursor {
            continue;
        }
        result.push_str(&source[cursor..edit.start]);
        result.push_str(&edit.replacement);
        cursor = edit.end;
    }
    result.push_str(&source[cursor..]);
    result
}
