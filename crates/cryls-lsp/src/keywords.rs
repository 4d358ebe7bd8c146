//! Context-sensitive keyword completion.
//!
//! The keyword set depends on where the cursor sits: top level, a type
//! body, a method body (with loop/branch extras from the enclosing control
//! structures), or inside a condition expression, which only offers value
//! keywords.

use cryls_ast::node::{Node, NodeKind};

use crate::analysis::Analysis;
use crate::completion::{CompletionItem, CompletionItemKind};

const VALUE_KEYWORDS: &[&str] = &["true", "false", "nil", "self", "super"];

const TOP_LEVEL_KEYWORDS: &[&str] = &[
    "class", "module", "enum", "struct", "def", "macro", "alias", "require", "private",
];

const TYPE_BODY_KEYWORDS: &[&str] = &[
    "def", "macro", "include", "alias", "getter", "setter", "property", "abstract", "private",
    "protected", "class", "module", "enum", "struct",
];

const STATEMENT_KEYWORDS: &[&str] = &[
    "if", "unless", "while", "until", "case", "begin", "return", "yield", "raise", "true",
    "false", "nil", "self",
];

/// Keywords that apply at the cursor.
#[must_use]
pub fn keyword_items(analysis: &Analysis<'_>) -> Vec<CompletionItem> {
    let words: Vec<&str> = if in_condition(analysis) {
        VALUE_KEYWORDS.to_vec()
    } else if analysis.ctx.enclosing_def.is_some() {
        let mut words = STATEMENT_KEYWORDS.to_vec();
        for ancestor in analysis.ctx.full_path().into_iter().rev() {
            match &ancestor.kind {
                NodeKind::While { .. } | NodeKind::Until { .. } => {
                    push_unique(&mut words, &["break", "next"]);
                }
                NodeKind::If { .. } => push_unique(&mut words, &["elsif", "else"]),
                NodeKind::Unless { .. } => push_unique(&mut words, &["else"]),
                NodeKind::Case { .. } | NodeKind::When { .. } => {
                    push_unique(&mut words, &["when", "else"]);
                }
                NodeKind::ExceptionHandler { .. } | NodeKind::Rescue { .. } => {
                    push_unique(&mut words, &["rescue", "ensure"]);
                }
                NodeKind::Def { .. } => break,
                _ => {}
            }
        }
        words
    } else if analysis.context().is_some() {
        TYPE_BODY_KEYWORDS.to_vec()
    } else {
        TOP_LEVEL_KEYWORDS.to_vec()
    };

    words
        .into_iter()
        .map(|word| CompletionItem::new(word, CompletionItemKind::Keyword))
        .collect()
}

fn push_unique<'a>(words: &mut Vec<&'a str>, extra: &[&'a str]) {
    for word in extra {
        if !words.contains(word) {
            words.push(word);
        }
    }
}

/// Whether the cursor is inside the condition sub-node of an enclosing
/// `if`/`unless`/`while`/`until`/`case`/`when`.
fn in_condition(analysis: &Analysis<'_>) -> bool {
    let position = analysis.position;
    for ancestor in analysis.ctx.full_path() {
        let cond: Option<&Node> = match &ancestor.kind {
            NodeKind::If { cond, .. }
            | NodeKind::Unless { cond, .. }
            | NodeKind::While { cond, .. }
            | NodeKind::Until { cond, .. } => Some(cond),
            NodeKind::Case { cond, .. } => cond.as_deref(),
            NodeKind::When { conds, .. } => conds
                .iter()
                .find(|cond| cond.range().is_some_and(|range| range.contains(position))),
            _ => None,
        };
        if cond
            .and_then(Node::range)
            .is_some_and(|range| range.contains(position))
        {
            return true;
        }
    }
    false
}
