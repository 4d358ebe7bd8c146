//! Document symbols.
//!
//! A hierarchical outline of one file built from the index: the types the
//! file (re)opens with that file's definition sites, and the file-scoped
//! members (methods, enum members, variables, aliases) nested under their
//! owners.

use cryls_common::position::Range;
use cryls_index::{PsiElement, SemanticIndex};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSymbol {
    pub name: String,
    /// Element kind tag (`class`, `module`, `enum`, `def`, ...)
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DocumentSymbol>,
}

/// The outline of `uri`.
#[must_use]
pub fn document_symbols(index: &SemanticIndex, uri: &str) -> Vec<DocumentSymbol> {
    // Type shells opened by this file, keyed by qualified name.
    let mut type_symbols: Vec<(String, DocumentSymbol)> = Vec::new();
    for name in index.types_in_file(uri) {
        let Some(definition) = index
            .type_definitions(name)
            .and_then(|definitions| definitions.get(uri))
        else {
            continue;
        };
        let kind = match index.find_type(name) {
            Some((_, element)) => element.kind_label().to_string(),
            None => "class".to_string(),
        };
        let short = name.rsplit("::").next().unwrap_or(name).to_string();
        type_symbols.push((
            name.clone(),
            DocumentSymbol {
                name: short,
                kind,
                range: definition.location,
                children: Vec::new(),
            },
        ));
    }

    // File-scoped members attach under their owner when the owner is also
    // in this file, otherwise at the top level (reopened elsewhere).
    let mut orphans: Vec<(Option<String>, DocumentSymbol)> = Vec::new();
    for &id in index.elements_in_file(uri) {
        let Some(element) = index.element(id) else {
            continue;
        };
        let symbol = DocumentSymbol {
            name: element.name().to_string(),
            kind: element.kind_label().to_string(),
            range: element.location(),
            children: Vec::new(),
        };
        let owner = element
            .owner_name()
            .filter(|owner| !owner.is_empty())
            .map(str::to_string);
        orphans.push((owner, symbol));
    }

    for (owner, symbol) in orphans {
        let slot = owner.and_then(|owner| {
            type_symbols
                .iter_mut()
                .position(|(name, _)| *name == owner)
        });
        match slot {
            Some(idx) => type_symbols[idx].1.children.push(symbol),
            None => type_symbols.push((String::new(), symbol)),
        }
    }

    // Nest types under their lexical owner when both are in the file.
    let mut out: Vec<DocumentSymbol> = Vec::new();
    let mut pending: Vec<(String, DocumentSymbol)> = type_symbols;
    while let Some((name, symbol)) = pending.pop() {
        let owner = name
            .rsplit_once("::")
            .map(|(owner, _)| owner.to_string())
            .filter(|owner| pending.iter().any(|(other, _)| other == owner));
        match owner {
            Some(owner) => {
                if let Some((_, parent)) = pending.iter_mut().find(|(other, _)| *other == owner) {
                    parent.children.insert(0, symbol);
                }
            }
            None => out.insert(0, symbol),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryls_ast::make;
    use cryls_index::SemanticIndex;

    #[test]
    fn outline_nests_members_under_types() {
        let mut index = SemanticIndex::new();
        let tree = make::expressions(vec![make::module_def(
            make::path(&["App"]).at(0, 7, 0, 10),
            vec![make::class_def(
                make::path(&["Server"]).at(1, 8, 1, 14),
                None,
                &[],
                vec![
                    make::def_node("run", vec![], vec![]).at(2, 4, 3, 7).named_at(2, 8, 3),
                    make::type_declaration(
                        make::ivar("@port"),
                        make::path(&["Int32"]),
                        None,
                    )
                    .at(4, 4, 4, 17),
                ],
            )
            .at(1, 2, 5, 5)],
        )
        .at(0, 0, 6, 3)]);
        index.index_tree("file:///app.cr", &tree);

        let symbols = document_symbols(&index, "file:///app.cr");
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "App");
        assert_eq!(symbols[0].kind, "module");
        let server = &symbols[0].children[0];
        assert_eq!(server.name, "Server");
        let child_names: Vec<&str> =
            server.children.iter().map(|child| child.name.as_str()).collect();
        assert!(child_names.contains(&"run"));
        assert!(child_names.contains(&"@port"));
    }

    #[test]
    fn reopened_type_members_attach_to_the_local_shell() {
        let mut index = SemanticIndex::new();
        index.index_tree(
            "file:///a.cr",
            &make::expressions(vec![make::class_def(
                make::path(&["Foo"]),
                None,
                &[],
                vec![make::def_node("bar", vec![], vec![])],
            )]),
        );
        index.index_tree(
            "file:///b.cr",
            &make::expressions(vec![make::class_def(
                make::path(&["Foo"]),
                None,
                &[],
                vec![make::def_node("baz", vec![], vec![])],
            )]),
        );

        let symbols = document_symbols(&index, "file:///b.cr");
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].name, "Foo");
        assert_eq!(symbols[0].children.len(), 1);
        assert_eq!(symbols[0].children[0].name, "baz");
    }
}
