//! Selection ranges.
//!
//! The expand-selection chain for a cursor: node ranges along the context
//! path from outermost to innermost, with the leaf's name range appended
//! when it differs from its full range. Each element links to its parent;
//! the leaf is returned.

use cryls_common::position::Range;
use serde::Serialize;

use crate::analysis::Analysis;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SelectionRange {
    pub range: Range,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<SelectionRange>>,
}

/// The innermost selection range at the cursor, parent-linked outward.
#[must_use]
pub fn selection_range(analysis: &Analysis<'_>) -> Option<SelectionRange> {
    let mut chain: Vec<Range> = Vec::new();
    for node in analysis.ctx.full_path() {
        if let Some(range) = node.range() {
            if chain.last() != Some(&range) {
                chain.push(range);
            }
        }
    }
    let leaf = analysis.ctx.node?;
    if let (Some(name_range), Some(full_range)) = (leaf.name_range(), leaf.range()) {
        if name_range != full_range {
            chain.push(name_range);
        }
    }

    let mut current: Option<SelectionRange> = None;
    for range in chain {
        current = Some(SelectionRange {
            range,
            parent: current.map(Box::new),
        });
    }
    current
}
