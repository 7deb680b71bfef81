//! Pattern detectors. Each one is a stateless rule: it inspects a single
//! node (plus its read-only neighborhood) and emits zero or more
//! findings. Detectors are independent - no shared mutable state - and a
//! shape one of them cannot recognize is simply skipped, never an error.

mod assert_count;
mod foreach_reference;
mod indirect_call;
mod nested_not;
mod static_call;

pub use assert_count::AssertCountDetector;
pub use foreach_reference::ForeachReferenceDetector;
pub use indirect_call::IndirectCallDetector;
pub use nested_not::NestedNotDetector;
pub use static_call::StaticCallDetector;

use crate::ast::NodeId;

use super::{AnalysisContext, Finding};

/// A code-smell rule.
pub trait Detector: Send + Sync {
    /// Stable name used for `--detect` filtering.
    fn name(&self) -> &'static str;

    /// Inspect one node; return every finding anchored in it.
    fn check(&self, node: NodeId, ctx: &AnalysisContext<'_>) -> Vec<Finding>;
}

/// All detectors in their fixed registration order.
pub fn default_registry() -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(NestedNotDetector),
        Box::new(ForeachReferenceDetector),
        Box::new(StaticCallDetector),
        Box::new(IndirectCallDetector),
        Box::new(AssertCountDetector),
    ]
}
