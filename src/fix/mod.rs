//! Declarative fixes.
//!
//! A [`Fix`] is a node-id-keyed edit script attached to a finding. It is
//! never executed during detection: the host decides when (and whether)
//! to turn it into text edits via [`FixApplier`], which keeps detection
//! free of tree mutation and makes dry-run previews and user approval
//! possible.

mod applier;

pub use applier::{ApplyOutcome, FixApplier, FixError, TextEdit};

use crate::ast::NodeId;

/// One structural rewrite operation.
#[derive(Debug, Clone)]
pub enum FixOp {
    /// Replace `target` with a copy of `source`'s text.
    ReplaceWithNode { target: NodeId, source: NodeId },

    /// Replace `target` with literal text.
    ReplaceWithText { target: NodeId, text: String },

    /// Replace the `->` access operator that follows `receiver` inside
    /// `call` with the given text.
    ReplaceAccessOperator {
        call: NodeId,
        receiver: NodeId,
        text: String,
    },

    /// Replace `call` with a freshly rendered call: same receiver, new
    /// name, the given argument nodes in order.
    SynthesizeCall {
        call: NodeId,
        name: String,
        args: Vec<NodeId>,
    },
}

/// A named, ordered edit script.
#[derive(Debug, Clone)]
pub struct Fix {
    pub title: String,
    pub ops: Vec<FixOp>,
}

impl Fix {
    pub fn new(title: impl Into<String>, op: FixOp) -> Self {
        Self {
            title: title.into(),
            ops: vec![op],
        }
    }

    pub fn with_op(mut self, op: FixOp) -> Self {
        self.ops.push(op);
        self
    }
}
