//! The completion engine.
//!
//! Dispatch order: require paths, `.` members, `::` namespaces, `@`/`@@`
//! variables, then the general provider (locals, types in scope, keywords).
//! Member items carry `data = {signature, doc}` so a second-stage
//! `resolve_completion_item` call can fill in markdown documentation
//! without the first response paying for it.

use cryls_ast::node::{Node, NodeKind};
use cryls_index::{PsiElement, TypeRef};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::analysis::Analysis;
use crate::infer::infer_type;
use crate::keywords::keyword_items;
use crate::require_paths::require_path_items;
use crate::workspace::WorkspaceConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionItemKind {
    Method,
    Class,
    Module,
    Enum,
    EnumMember,
    Variable,
    Field,
    Constant,
    Keyword,
    Folder,
    File,
}

/// Payload for the second-stage documentation resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionItemKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<CompletionData>,
}

impl CompletionItem {
    #[must_use]
    pub fn new(label: impl Into<String>, kind: CompletionItemKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
            documentation: None,
            insert_text: None,
            data: None,
        }
    }
}

/// What the editor sent along with the position.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompletionParams<'a> {
    /// Trigger character, when the request was character-triggered
    pub trigger: Option<&'a str>,
    /// Text of the current line up to the cursor
    pub line: &'a str,
}

/// Entry point: dispatch on the trigger and line shape.
#[must_use]
pub fn complete(
    analysis: &Analysis<'_>,
    params: &CompletionParams<'_>,
    workspace: Option<&WorkspaceConfig>,
) -> Vec<CompletionItem> {
    if let Some(partial) = require_partial(params.line) {
        return match workspace {
            Some(workspace) => require_path_items(partial, analysis.uri, workspace),
            None => Vec::new(),
        };
    }

    if params.trigger == Some(".") || dot_partial(params.line).is_some() {
        let prefix = dot_partial(params.line).unwrap_or("");
        return member_items(analysis, prefix);
    }

    if params.trigger == Some("::") || colon_partial(params.line).is_some() {
        let (namespace, prefix) = match colon_partial(params.line) {
            Some(parts) => parts,
            None => return Vec::new(),
        };
        return namespace_items(analysis, namespace, prefix);
    }

    if params.trigger == Some("@") || current_word(params.line).starts_with('@') {
        let word = current_word(params.line);
        return variable_items(analysis, word);
    }

    general_items(analysis, current_word(params.line))
}

/// Fill in markdown documentation from the item's carried data.
#[must_use]
pub fn resolve_completion_item(mut item: CompletionItem) -> CompletionItem {
    let Some(data) = &item.data else {
        return item;
    };
    let mut documentation = String::new();
    if let Some(signature) = &data.signature {
        documentation.push_str("```crystal\n");
        documentation.push_str(signature);
        documentation.push_str("\n```\n");
    }
    if let Some(doc) = &data.doc {
        if !documentation.is_empty() {
            documentation.push('\n');
        }
        documentation.push_str(doc);
    }
    if !documentation.is_empty() {
        item.documentation = Some(documentation);
    }
    item
}

// ===== Line-shape helpers =====

/// The string prefix of an unclosed `require "..."`.
fn require_partial(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix("require")?;
    let rest = rest.trim_start();
    let after_quote = rest.strip_prefix('"')?;
    if after_quote.contains('"') {
        return None;
    }
    Some(after_quote)
}

/// `recv.par` -> `par`; `recv.` -> `""`; no dot member shape -> `None`.
fn dot_partial(line: &str) -> Option<&str> {
    let dot = line.rfind('.')?;
    let after = &line[dot + 1..];
    if !after.chars().all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '?' || ch == '!') {
        return None;
    }
    // A leading dot with nothing before it is not member access.
    if line[..dot].trim_end().is_empty() {
        return None;
    }
    Some(after)
}

/// `Name::par` -> `(Name, par)`.
fn colon_partial(line: &str) -> Option<(&str, &str)> {
    let sep = line.rfind("::")?;
    let after = &line[sep + 2..];
    if !after
        .chars()
        .all(|ch| ch.is_alphanumeric() || ch == '_')
    {
        return None;
    }
    let before = &line[..sep];
    let start = before
        .rfind(|ch: char| !(ch.is_alphanumeric() || ch == '_' || ch == ':'))
        .map_or(0, |idx| idx + 1);
    let namespace = before[start..].trim_start_matches(':');
    if namespace.is_empty() {
        return None;
    }
    Some((namespace, after))
}

/// The identifier being typed at the end of the line.
fn current_word(line: &str) -> &str {
    let start = line
        .rfind(|ch: char| !(ch.is_alphanumeric() || ch == '_' || ch == '@'))
        .map_or(0, |idx| idx + 1);
    &line[start..]
}

// ===== Member completion (`.`) =====

fn member_items(analysis: &Analysis<'_>, prefix: &str) -> Vec<CompletionItem> {
    let Some((receiver, class_side)) = dot_receiver(analysis) else {
        return Vec::new();
    };
    let Some(owner) = resolve_receiver_owner(analysis, receiver, class_side) else {
        return Vec::new();
    };

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut items = Vec::new();
    for id in analysis.index.methods_on(&owner, None, Some(class_side)) {
        let Some(PsiElement::Method(method)) = analysis.index.element(id) else {
            continue;
        };
        if !prefix.is_empty() && !method.common.name.starts_with(prefix) {
            continue;
        }
        let signature = method.signature();
        if !seen.insert(signature.clone()) {
            continue;
        }
        let mut item = CompletionItem::new(&method.common.name, CompletionItemKind::Method);
        item.detail = Some(signature.clone());
        item.data = Some(CompletionData {
            signature: Some(signature),
            doc: method.common.doc.clone(),
        });
        items.push(item);
    }
    items
}

/// The receiver expression for the dot under the cursor: the call's `obj`
/// when a member prefix is already typed, otherwise the closest expression
/// ending before the cursor.
fn dot_receiver<'a>(analysis: &'a Analysis<'_>) -> Option<(&'a Node, bool)> {
    let receiver = match analysis.ctx.node {
        Some(node) => match &node.kind {
            NodeKind::Call { obj: Some(obj), .. } => Some(obj.as_ref()),
            _ => None,
        },
        None => None,
    };
    let receiver = receiver.or(analysis.ctx.previous_node)?;
    let class_side = matches!(
        receiver.kind,
        NodeKind::Path { .. } | NodeKind::Generic { .. } | NodeKind::Metaclass { .. }
    );
    Some((receiver, class_side))
}

fn resolve_receiver_owner(
    analysis: &Analysis<'_>,
    receiver: &Node,
    class_side: bool,
) -> Option<String> {
    let reference = if class_side {
        TypeRef::from_node(receiver)?
    } else if let Some(known) = analysis.env.lookup(receiver) {
        known.clone()
    } else {
        infer_type(analysis, receiver, 0)?
    };
    analysis.index.resolve_typeref(&reference, analysis.context())
}

// ===== Namespace completion (`::`) =====

fn namespace_items(analysis: &Analysis<'_>, namespace: &str, prefix: &str) -> Vec<CompletionItem> {
    let index = analysis.index;
    let Some(resolved) = index.resolve_type_name(namespace, analysis.context()) else {
        return Vec::new();
    };
    let mut items = Vec::new();
    let nested_prefix = format!("{resolved}::");

    for name in index.type_names() {
        if let Some(rest) = name.strip_prefix(&nested_prefix) {
            if rest.contains("::") || (!prefix.is_empty() && !rest.starts_with(prefix)) {
                continue;
            }
            let kind = match index.find_type(name) {
                Some((_, PsiElement::Module(_))) => CompletionItemKind::Module,
                Some((_, PsiElement::Enum(_))) => CompletionItemKind::Enum,
                _ => CompletionItemKind::Class,
            };
            let mut item = CompletionItem::new(rest, kind);
            item.detail = Some(name.to_string());
            items.push(item);
        }
    }

    // Aliases are listed at their declared name; their targets do not
    // expand here.
    for name in index.alias_names() {
        if let Some(rest) = name.strip_prefix(&nested_prefix) {
            if rest.contains("::") || (!prefix.is_empty() && !rest.starts_with(prefix)) {
                continue;
            }
            let mut item = CompletionItem::new(rest, CompletionItemKind::Constant);
            item.detail = Some(format!("alias {name}"));
            items.push(item);
        }
    }

    for id in index.enum_members(&resolved) {
        if let Some(element) = index.element(id) {
            if prefix.is_empty() || element.name().starts_with(prefix) {
                let mut item = CompletionItem::new(element.name(), CompletionItemKind::EnumMember);
                item.detail = Some(format!("{resolved}::{}", element.name()));
                items.push(item);
            }
        }
    }

    items.sort_by(|a, b| a.label.cmp(&b.label));
    items
}

// ===== Instance/class variables (`@`, `@@`) =====

fn variable_items(analysis: &Analysis<'_>, word: &str) -> Vec<CompletionItem> {
    let class_vars = word.starts_with("@@");
    let mut names: FxHashSet<String> = FxHashSet::default();

    if class_vars {
        names.extend(analysis.env.cvar_names().map(str::to_string));
    } else {
        names.extend(analysis.env.ivar_names().map(str::to_string));
    }

    // Indexed declarations of the context type (covers reopening files).
    if let Some(context) = analysis.context() {
        if let Some((_, element)) = analysis.index.find_type(context) {
            for &child in element.children() {
                match analysis.index.element(child) {
                    Some(PsiElement::InstanceVar(var)) if !class_vars => {
                        names.insert(var.common.name.clone());
                    }
                    Some(PsiElement::ClassVar(var)) if class_vars => {
                        names.insert(var.common.name.clone());
                    }
                    _ => {}
                }
            }
        }
    }

    let mut items: Vec<CompletionItem> = names
        .into_iter()
        .filter(|name| word.len() <= 2 || name.starts_with(word))
        .map(|name| {
            let type_hint = if class_vars {
                analysis.env.cvar(&name).map(TypeRef::display)
            } else {
                analysis.env.ivar(&name).map(TypeRef::display)
            };
            let mut item = CompletionItem::new(&name, CompletionItemKind::Field);
            item.detail = type_hint;
            item
        })
        .collect();
    items.sort_by(|a, b| a.label.cmp(&b.label));
    items
}

// ===== General provider =====

fn general_items(analysis: &Analysis<'_>, word: &str) -> Vec<CompletionItem> {
    let mut items = Vec::new();
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let matches = |name: &str| word.is_empty() || name.starts_with(word);

    // Locals: typed hints plus the enclosing method's parameters.
    for name in analysis.env.local_names() {
        if matches(name) && seen.insert(name.to_string()) {
            let mut item = CompletionItem::new(name, CompletionItemKind::Variable);
            item.detail = analysis.env.local(name).map(TypeRef::display);
            items.push(item);
        }
    }
    if let Some(NodeKind::Def { args, .. }) = analysis.ctx.enclosing_def.map(|def| &def.kind) {
        for arg in args {
            if let NodeKind::Arg { name, .. } = &arg.kind {
                if matches(name) && seen.insert(name.clone()) {
                    items.push(CompletionItem::new(name, CompletionItemKind::Variable));
                }
            }
        }
    }

    // Top-level types plus nested types under the enclosing namespace.
    let context_prefix = analysis.context().map(|context| format!("{context}::"));
    for name in analysis.index.type_names() {
        let visible = if !name.contains("::") {
            Some(name)
        } else {
            context_prefix
                .as_deref()
                .and_then(|prefix| name.strip_prefix(prefix))
                .filter(|rest| !rest.contains("::"))
        };
        let Some(label) = visible else { continue };
        if matches(label) && seen.insert(label.to_string()) {
            let kind = match analysis.index.find_type(name) {
                Some((_, PsiElement::Module(_))) => CompletionItemKind::Module,
                Some((_, PsiElement::Enum(_))) => CompletionItemKind::Enum,
                _ => CompletionItemKind::Class,
            };
            let mut item = CompletionItem::new(label, kind);
            item.detail = Some(name.to_string());
            items.push(item);
        }
    }

    items.extend(
        keyword_items(analysis)
            .into_iter()
            .filter(|item| matches(&item.label)),
    );
    items
}

#[cfg(test)]
#[path = "tests/completion_tests.rs"]
mod tests;
