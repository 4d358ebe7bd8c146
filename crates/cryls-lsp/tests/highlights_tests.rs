//! Document highlights and selection ranges.

use cryls_ast::make;
use cryls_common::position::Position;
use cryls_index::SemanticIndex;
use cryls_lsp::{Analysis, document_highlights, selection_range};

#[test]
fn local_var_occurrences_stay_inside_the_method() {
    let index = SemanticIndex::new();
    let tree = make::expressions(vec![
        make::def_node(
            "outer",
            vec![make::arg("x").at(0, 10, 0, 11)],
            vec![
                make::assign(
                    make::var("x").at(1, 2, 1, 3),
                    make::number_literal("1").at(1, 6, 1, 7),
                )
                .at(1, 2, 1, 7),
                make::var("x").at(2, 2, 2, 3),
            ],
        )
        .at(0, 0, 3, 3),
        make::def_node("other", vec![], vec![make::var("x").at(5, 2, 5, 3)]).at(4, 0, 6, 3),
    ])
    .at(0, 0, 6, 3);

    let analysis = Analysis::for_document(&index, &tree, "file:///q.cr", Position::new(2, 2));
    let ranges = document_highlights(&analysis);
    let lines: Vec<u32> = ranges.iter().map(|range| range.start.line).collect();
    // Parameter, assignment, read - but not the `x` in the other method.
    assert_eq!(lines, vec![0, 1, 2]);
}

#[test]
fn instance_var_occurrences_cover_the_class_body() {
    let index = SemanticIndex::new();
    let tree = make::expressions(vec![make::class_def(
        make::path(&["Session"]).at(0, 6, 0, 13),
        None,
        &[],
        vec![
            make::def_node(
                "initialize",
                vec![],
                vec![
                    make::assign(
                        make::ivar("@token").at(2, 4, 2, 10),
                        make::string_literal("t").at(2, 13, 2, 16),
                    )
                    .at(2, 4, 2, 16),
                ],
            )
            .at(1, 2, 3, 5),
            make::def_node("renew", vec![], vec![make::ivar("@token").at(5, 4, 5, 10)])
                .at(4, 2, 6, 5),
        ],
    )
    .at(0, 0, 7, 3)])
    .at(0, 0, 7, 3);

    let analysis = Analysis::for_document(&index, &tree, "file:///q.cr", Position::new(5, 6));
    let ranges = document_highlights(&analysis);
    let lines: Vec<u32> = ranges.iter().map(|range| range.start.line).collect();
    assert_eq!(lines, vec![2, 5]);
}

#[test]
fn path_occurrences_match_qualification_and_globality() {
    let index = SemanticIndex::new();
    let tree = make::expressions(vec![
        make::path(&["Foo"]).at(0, 0, 0, 3),
        make::global_path(&["Foo"]).at(1, 0, 1, 5),
        make::path(&["Foo"]).at(2, 0, 2, 3),
        make::path(&["Bar"]).at(3, 0, 3, 3),
    ])
    .at(0, 0, 4, 0);

    let analysis = Analysis::for_document(&index, &tree, "file:///q.cr", Position::new(0, 1));
    let ranges = document_highlights(&analysis);
    let lines: Vec<u32> = ranges.iter().map(|range| range.start.line).collect();
    // The global `::Foo` spelling is a different reference.
    assert_eq!(lines, vec![0, 2]);
}

#[test]
fn selection_chain_runs_outermost_to_name_range() {
    let index = SemanticIndex::new();
    let tree = make::expressions(vec![make::class_def(
        make::path(&["Widget"]).at(0, 6, 0, 12),
        None,
        &[],
        vec![make::def_node(
            "render",
            vec![],
            vec![
                make::call(Some(make::var("io").at(2, 4, 2, 6)), "print", vec![])
                    .at(2, 4, 2, 12)
                    .named_at(2, 7, 5),
            ],
        )
        .at(1, 2, 3, 5)
        .named_at(1, 6, 6)],
    )
    .at(0, 0, 4, 3)])
    .at(0, 0, 5, 0);

    let analysis = Analysis::for_document(&index, &tree, "file:///q.cr", Position::new(2, 8));
    let leaf = selection_range(&analysis).expect("selection chain");

    // Leaf is the call's name range.
    assert_eq!((leaf.range.start.line, leaf.range.start.character), (2, 7));
    let call = leaf.parent.as_deref().expect("call range");
    assert_eq!((call.range.start.line, call.range.start.character), (2, 4));
    let def = call.parent.as_deref().expect("def range");
    assert_eq!(def.range.start.line, 1);
    let class = def.parent.as_deref().expect("class range");
    assert_eq!(class.range.start.line, 0);
    // Outermost: the file root.
    assert!(class.parent.is_some());
    assert!(class.parent.as_deref().expect("root").parent.is_none());
}

#[test]
fn no_node_no_chain() {
    let index = SemanticIndex::new();
    let tree = make::expressions(vec![]).at(0, 0, 0, 0);
    let analysis = Analysis::for_document(&index, &tree, "file:///q.cr", Position::new(9, 9));
    assert!(selection_range(&analysis).is_none());
    assert!(document_highlights(&analysis).is_empty());
}
