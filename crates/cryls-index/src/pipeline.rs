//! The indexing pipeline.
//!
//! Three passes over the same tree, each a walk that stays out of method
//! and macro bodies:
//!
//! 1. skeletons - type shells, so every name exists before resolution
//! 2. macros - collect definitions, then pre-expand receiverless calls
//!    (expansions recursively index as virtual files)
//! 3. main - methods, enum members, includes, aliases, dependency edges
//!
//! Re-indexing a file first removes its previous contribution, which is
//! what makes `index` idempotent and the remove round-trip exact.

use cryls_ast::node::Node;
use cryls_ast::parse::{SourceParser, StubParser};
use tracing::debug;

use crate::index::SemanticIndex;
use crate::{macro_expander, main_pass, skeleton};

/// Index `tree` as the contents of `uri`, replacing any prior contribution
/// of that file.
pub fn index_tree(index: &mut SemanticIndex, uri: &str, tree: &Node, parser: &dyn SourceParser) {
    if index.has_file(uri) {
        index.remove_file(uri);
    }
    debug!(uri, "indexing file");
    index.enter(uri);
    run_passes(index, parser, tree, None);
}

/// Run the three passes with an optional enclosing owner (virtual files
/// expand in the scope of the type containing the macro call).
pub(crate) fn run_passes(
    index: &mut SemanticIndex,
    parser: &dyn SourceParser,
    tree: &Node,
    root_owner: Option<&str>,
) {
    skeleton::run(index, tree, root_owner);
    macro_expander::collect(index, tree, root_owner);
    macro_expander::pre_expand(index, parser, tree, root_owner);
    main_pass::run(index, tree, root_owner);
}

/// Qualify a spelled type name against the enclosing owner: a name already
/// containing `::` is absolute, everything else nests under the owner.
#[must_use]
pub fn qualify(owner: Option<&str>, spelled: &str) -> String {
    if let Some(stripped) = spelled.strip_prefix("::") {
        return stripped.to_string();
    }
    if spelled.contains("::") {
        return spelled.to_string();
    }
    match owner {
        Some(owner) if !owner.is_empty() => format!("{owner}::{spelled}"),
        _ => spelled.to_string(),
    }
}

impl SemanticIndex {
    /// Index a parsed tree under `uri` using the default stub reparser for
    /// macro expansions.
    pub fn index_tree(&mut self, uri: &str, tree: &Node) {
        index_tree(self, uri, tree, &StubParser::new());
    }

    /// Index a parsed tree under `uri`, handing macro-expansion output to
    /// `parser`.
    pub fn index_tree_with(&mut self, uri: &str, tree: &Node, parser: &dyn SourceParser) {
        index_tree(self, uri, tree, parser);
    }
}
