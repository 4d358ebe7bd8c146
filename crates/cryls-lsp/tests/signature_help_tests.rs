//! Signature help: candidate listing, active signature and parameter.

use cryls_ast::make;
use cryls_common::position::Position;
use cryls_index::SemanticIndex;
use cryls_lsp::{Analysis, SignatureHelp, signature_help};

fn store_index() -> SemanticIndex {
    let mut index = SemanticIndex::new();
    index.index_tree(
        "file:///store.cr",
        &make::expressions(vec![make::class_def(
            make::path(&["Store"]),
            None,
            &[],
            vec![
                make::def_node("put", vec![make::arg("key")], vec![]),
                make::def_node("put", vec![make::arg("key"), make::arg("value")], vec![]),
            ],
        )]),
    );
    index
}

/// s.put("k", |) with two positional arguments.
fn call_tree(args: Vec<cryls_ast::node::Node>) -> cryls_ast::node::Node {
    make::expressions(vec![make::def_node(
        "main",
        vec![make::arg_with_restriction("s", make::path(&["Store"]))],
        vec![
            make::call_with_parens(Some(make::var("s").at(1, 2, 1, 3)), "put", args)
                .at(1, 2, 1, 20)
                .named_at(1, 4, 3),
        ],
    )
    .at(0, 0, 2, 3)])
    .at(0, 0, 2, 3)
}

fn help_at(index: &SemanticIndex, tree: &cryls_ast::node::Node, position: Position) -> SignatureHelp {
    let analysis = Analysis::for_document(index, tree, "file:///main.cr", position);
    signature_help(&analysis).expect("signature help")
}

#[test]
fn lists_overloads_and_picks_arity_matching_signature() {
    let index = store_index();
    let tree = call_tree(vec![
        make::string_literal("k").at(1, 8, 1, 11),
        make::number_literal("1").at(1, 13, 1, 14),
    ]);

    let help = help_at(&index, &tree, Position::new(1, 13));
    assert_eq!(help.signatures.len(), 2);
    // Two arguments: the second overload is active.
    assert_eq!(
        help.signatures[help.active_signature as usize].label,
        "def Store#put(key, value)"
    );
    assert_eq!(help.active_parameter, 1);
}

#[test]
fn first_argument_is_active_at_its_position() {
    let index = store_index();
    let tree = call_tree(vec![make::string_literal("k").at(1, 8, 1, 11)]);
    let help = help_at(&index, &tree, Position::new(1, 9));
    assert_eq!(
        help.signatures[help.active_signature as usize].label,
        "def Store#put(key)"
    );
    assert_eq!(help.active_parameter, 0);
}

#[test]
fn named_argument_resolves_to_its_parameter() {
    let index = store_index();
    // s.put("k", value: 1) - cursor inside the named argument.
    let call = make::call_named(
        make::call_with_parens(
            Some(make::var("s").at(1, 2, 1, 3)),
            "put",
            vec![make::string_literal("k").at(1, 8, 1, 11)],
        ),
        vec![("value", make::number_literal("1").at(1, 20, 1, 21))],
    )
    .at(1, 2, 1, 22)
    .named_at(1, 4, 3);
    let tree = make::expressions(vec![make::def_node(
        "main",
        vec![make::arg_with_restriction("s", make::path(&["Store"]))],
        vec![call],
    )
    .at(0, 0, 2, 3)])
    .at(0, 0, 2, 3);

    let help = help_at(&index, &tree, Position::new(1, 20));
    // Two arguments total: the two-parameter overload is active, and the
    // named argument selects its parameter by name.
    let signature = &help.signatures[help.active_signature as usize];
    assert_eq!(signature.label, "def Store#put(key, value)");
    assert_eq!(
        signature.parameters[help.active_parameter as usize].label,
        "value"
    );
}

#[test]
fn constructor_signature_prefers_new_then_initialize() {
    let mut index = SemanticIndex::new();
    index.index_tree(
        "file:///bean.cr",
        &make::expressions(vec![make::class_def(
            make::path(&["Bean"]),
            None,
            &[],
            vec![make::def_node("initialize", vec![make::arg("x")], vec![])],
        )]),
    );

    let tree = make::expressions(vec![
        make::call_with_parens(
            Some(make::path(&["Bean"]).at(0, 0, 0, 4)),
            "new",
            vec![make::number_literal("1").at(0, 9, 0, 10)],
        )
        .at(0, 0, 0, 11)
        .named_at(0, 5, 3),
    ])
    .at(0, 0, 0, 11);

    let analysis = Analysis::for_document(&index, &tree, "file:///q.cr", Position::new(0, 9));
    let help = signature_help(&analysis).expect("signature help");
    assert_eq!(help.signatures.len(), 1);
    assert!(help.signatures[0].label.contains("initialize"));
}

#[test]
fn inactive_positions_yield_no_help() {
    let index = store_index();
    // Cursor on the call name itself (before the parenthesis) is not an
    // active call position.
    let tree = call_tree(vec![make::string_literal("k").at(1, 8, 1, 11)]);
    let analysis = Analysis::for_document(&index, &tree, "file:///main.cr", Position::new(1, 4));
    assert!(signature_help(&analysis).is_none());

    // A bare call with neither parens nor arguments offers nothing.
    let bare = make::expressions(vec![make::def_node(
        "main",
        vec![make::arg_with_restriction("s", make::path(&["Store"]))],
        vec![
            make::call(Some(make::var("s").at(1, 2, 1, 3)), "put", vec![])
                .at(1, 2, 1, 7)
                .named_at(1, 4, 3),
        ],
    )
    .at(0, 0, 2, 3)])
    .at(0, 0, 2, 3);
    let analysis = Analysis::for_document(&index, &bare, "file:///main.cr", Position::new(1, 7));
    assert!(signature_help(&analysis).is_none());
}
