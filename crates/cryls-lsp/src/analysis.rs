//! Shared per-query state.
//!
//! One `Analysis` bundles everything a provider needs for a single cursor
//! position: the located node context and the lexical type environment.
//! Building it is cheap enough to do per request.

use cryls_ast::node::{Node, NodeKind};
use cryls_common::position::Position;
use cryls_index::SemanticIndex;

use crate::node_finder::{NodeContext, find_node_at};
use crate::type_env::{TypeEnv, build_type_env};

pub struct Analysis<'a> {
    pub index: &'a SemanticIndex,
    pub root: &'a Node,
    /// URI of the document being queried
    pub uri: &'a str,
    pub position: Position,
    pub ctx: NodeContext<'a>,
    pub env: TypeEnv,
}

impl<'a> Analysis<'a> {
    #[must_use]
    pub fn new(index: &'a SemanticIndex, root: &'a Node, position: Position) -> Self {
        Self::for_document(index, root, "", position)
    }

    #[must_use]
    pub fn for_document(
        index: &'a SemanticIndex,
        root: &'a Node,
        uri: &'a str,
        position: Position,
    ) -> Self {
        let ctx = find_node_at(root, position);
        let type_node = ctx.enclosing_class.or_else(|| {
            ctx.full_path()
                .into_iter()
                .rev()
                .find(|node| node.is_type_definition())
        });
        let env = build_type_env(type_node, ctx.enclosing_def, position);
        Self {
            index,
            root,
            uri,
            position,
            ctx,
            env,
        }
    }

    /// The enclosing type context, `None` at file level.
    #[must_use]
    pub fn context(&self) -> Option<&str> {
        self.ctx
            .context_path
            .as_deref()
            .filter(|context| !context.is_empty())
    }

    /// Whether the cursor's enclosing method is a class method
    /// (`def self.x`).
    #[must_use]
    pub fn in_class_method(&self) -> bool {
        matches!(
            self.ctx.enclosing_def.map(|def| &def.kind),
            Some(NodeKind::Def {
                receiver: Some(_),
                ..
            })
        )
    }
}
