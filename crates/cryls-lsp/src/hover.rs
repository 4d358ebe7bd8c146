//! Hover formatting.
//!
//! Resolves the cursor to a definition and renders it as markdown: a
//! code-fenced signature first, then the doc comment when the element
//! carries one.

use cryls_common::position::Range;
use cryls_index::{PsiElement, SemanticIndex};
use serde::Serialize;

use crate::analysis::Analysis;
use crate::resolver::resolve_definition;

#[derive(Debug, Clone, Serialize)]
pub struct Hover {
    /// Markdown blocks, signature first
    pub contents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
}

/// Hover info for the cursor, or `None` when nothing resolves.
#[must_use]
pub fn hover(analysis: &Analysis<'_>) -> Option<Hover> {
    let elements = resolve_definition(analysis);
    let element = elements.first()?;

    let mut contents = vec![format!(
        "```crystal\n{}\n```",
        element_signature(analysis.index, element)
    )];
    if let Some(doc) = element.doc() {
        contents.push(doc.to_string());
    }

    let range = analysis
        .ctx
        .node
        .and_then(|node| node.name_range().or_else(|| node.range()));
    Some(Hover { contents, range })
}

/// Source-like one-line signature of an element.
#[must_use]
pub fn element_signature(index: &SemanticIndex, element: &PsiElement) -> String {
    match element {
        PsiElement::Method(method) => method.signature(),
        PsiElement::Module(module) => format!("module {}", module.common.name),
        PsiElement::Class(class) => {
            let name = &class.common.name;
            let mut out = String::from("class ");
            out.push_str(name);
            let vars = index.type_vars(name);
            if !vars.is_empty() {
                out.push('(');
                out.push_str(&vars.join(", "));
                out.push(')');
            }
            if let Some(superclass) = index.effective_superclass(name) {
                out.push_str(" < ");
                out.push_str(&superclass.display());
            }
            out
        }
        PsiElement::Enum(enum_element) => format!("enum {}", enum_element.common.name),
        PsiElement::Alias(alias) => match &alias.target {
            Some(target) => format!("alias {} = {}", alias.common.name, target.display()),
            None => format!("alias {}", alias.common.name),
        },
        PsiElement::EnumMember(member) => format!("{}::{}", member.owner, member.common.name),
        PsiElement::InstanceVar(var) => match &var.type_string {
            Some(type_string) => format!("{} : {}", var.common.name, type_string),
            None => var.common.name.clone(),
        },
        PsiElement::ClassVar(var) => match &var.type_string {
            Some(type_string) => format!("{} : {}", var.common.name, type_string),
            None => var.common.name.clone(),
        },
        PsiElement::LocalVar(var) => match &var.type_string {
            Some(type_string) => format!("{} : {}", var.common.name, type_string),
            None => var.common.name.clone(),
        },
    }
}

/// Markdown body for a method in completion/signature documentation.
#[must_use]
pub fn method_documentation(signature: &str, doc: Option<&str>) -> String {
    let mut out = format!("```crystal\n{signature}\n```");
    if let Some(doc) = doc {
        out.push_str("\n\n");
        out.push_str(doc);
    }
    out
}
