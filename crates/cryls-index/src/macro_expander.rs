//! Pass 2: macro collection and pre-expansion.
//!
//! First walk collects macro definitions under their lexically enclosing
//! type name. Second walk dispatches every receiverless call through the
//! macro resolver: user macros are interpreted to text, built-ins come from
//! the fixed accessor table; either way the text is parsed and recursively
//! indexed as a virtual file owned by the enclosing type. Failures are
//! logged and the expansion discarded - the rest of the host file indexes
//! normally.

use cryls_ast::node::{NamedArgument, Node, NodeKind};
use cryls_ast::parse::SourceParser;
use cryls_ast::visitor::{VisitControl, Visitor, walk};
use cryls_common::limits::MAX_MACRO_EXPANSION_DEPTH;
use cryls_common::position::Position;
use cryls_common::uri::macro_expansion_uri;
use tracing::{debug, warn};

use crate::builtin_macros::expand_builtin;
use crate::index::SemanticIndex;
use crate::macro_interpreter::interpret;
use crate::macro_registry::{MacroDefinition, arity_of};
use crate::pipeline::{qualify, run_passes};

/// Push the qualified name of an entered type definition onto `owners`.
fn enter_owner(owners: &mut Vec<String>, name: &Node) {
    let spelled = name.path_full().unwrap_or_default();
    let qualified = qualify(owners.last().map(String::as_str), &spelled);
    owners.push(qualified);
}

fn owner_stack(root_owner: Option<&str>) -> Vec<String> {
    root_owner
        .filter(|owner| !owner.is_empty())
        .map(|owner| vec![owner.to_string()])
        .unwrap_or_default()
}

// ===== Collection =====

pub(crate) fn collect(index: &mut SemanticIndex, tree: &Node, root_owner: Option<&str>) {
    let mut pass = CollectPass {
        index,
        owners: owner_stack(root_owner),
    };
    walk(tree, &mut pass);
}

struct CollectPass<'a> {
    index: &'a mut SemanticIndex,
    owners: Vec<String>,
}

impl<'tree> Visitor<'tree> for CollectPass<'_> {
    fn visit(&mut self, node: &'tree Node) -> VisitControl {
        match &node.kind {
            NodeKind::ModuleDef { name, .. }
            | NodeKind::ClassDef { name, .. }
            | NodeKind::EnumDef { name, .. } => {
                enter_owner(&mut self.owners, name);
                VisitControl::Descend
            }
            NodeKind::MacroDef {
                name,
                args,
                splat_index,
                body,
            } => {
                let scope = self.owners.last().cloned().unwrap_or_default();
                self.index.macros.register(MacroDefinition {
                    scope,
                    name: name.clone(),
                    params: args.clone(),
                    splat_index: *splat_index,
                    arity: arity_of(args, *splat_index),
                    body: (**body).clone(),
                    file: self.index.current_file_or_empty(),
                    location: node.range(),
                });
                VisitControl::Skip
            }
            NodeKind::Def { .. } => VisitControl::Skip,
            _ => VisitControl::Descend,
        }
    }

    fn leave(&mut self, node: &'tree Node) {
        if node.is_type_definition() {
            self.owners.pop();
        }
    }
}

// ===== Pre-expansion =====

pub(crate) fn pre_expand(
    index: &mut SemanticIndex,
    parser: &dyn SourceParser,
    tree: &Node,
    root_owner: Option<&str>,
) {
    let mut pass = ExpandPass {
        index,
        parser,
        owners: owner_stack(root_owner),
    };
    walk(tree, &mut pass);
}

struct ExpandPass<'a> {
    index: &'a mut SemanticIndex,
    parser: &'a dyn SourceParser,
    owners: Vec<String>,
}

impl<'tree> Visitor<'tree> for ExpandPass<'_> {
    fn visit(&mut self, node: &'tree Node) -> VisitControl {
        match &node.kind {
            NodeKind::ModuleDef { name, .. }
            | NodeKind::ClassDef { name, .. }
            | NodeKind::EnumDef { name, .. } => {
                enter_owner(&mut self.owners, name);
                VisitControl::Descend
            }
            NodeKind::Def { .. } | NodeKind::MacroDef { .. } => VisitControl::Skip,
            NodeKind::Call {
                obj: None,
                name,
                args,
                named_args,
                ..
            } => {
                self.dispatch_call(node, name, args, named_args);
                VisitControl::Skip
            }
            _ => VisitControl::Descend,
        }
    }

    fn leave(&mut self, node: &'tree Node) {
        if node.is_type_definition() {
            self.owners.pop();
        }
    }
}

impl ExpandPass<'_> {
    fn dispatch_call(
        &mut self,
        call: &Node,
        name: &str,
        args: &[Node],
        named_args: &[NamedArgument],
    ) {
        let scope = self.owners.last().cloned().unwrap_or_default();
        let arg_count = u32::try_from(args.len() + named_args.len()).unwrap_or(u32::MAX);

        if let Some(definition) = self.index.macros.resolve(&scope, name, arg_count).cloned() {
            match interpret(&definition, args, named_args) {
                Ok(text) => self.index_expansion(call, name, &scope, &text),
                Err(error) => {
                    warn!(macro_name = name, %error, "macro interpretation failed");
                }
            }
            return;
        }

        if let Some(text) = expand_builtin(name, args) {
            self.index_expansion(call, name, &scope, &text);
        }
    }

    fn index_expansion(&mut self, call: &Node, macro_name: &str, owner: &str, text: &str) {
        if self.index.macro_depth >= MAX_MACRO_EXPANSION_DEPTH {
            debug!(macro_name, "macro expansion depth limit reached, skipping");
            return;
        }
        let origin = self.index.current_file_or_empty();
        let at = call.location.unwrap_or(Position::new(0, 0));
        let uri = macro_expansion_uri(&origin, macro_name, at);

        let Some(tree) = self.parser.parse(&uri, text) else {
            warn!(macro_name, %uri, "macro expansion failed to parse, discarding");
            return;
        };

        self.index.add_virtual_file(&origin, &uri);
        let owner = (!owner.is_empty()).then_some(owner);
        let mut guard = self.index.enter_expansion(&uri);
        run_passes(&mut guard, self.parser, &tree, owner);
    }
}
