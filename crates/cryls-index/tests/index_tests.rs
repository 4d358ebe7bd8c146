//! End-to-end tests of the indexing pipeline and incremental removal.

use cryls_ast::{make, node::Node};
use cryls_index::{PsiElement, SemanticIndex, TypeKind};

fn method_names(index: &SemanticIndex, type_name: &str) -> Vec<String> {
    let mut names: Vec<String> = index
        .methods_on(type_name, None, None)
        .into_iter()
        .filter_map(|id| index.element(id).map(|el| el.name().to_string()))
        .collect();
    names.sort();
    names.dedup();
    names
}

fn class_with_method(class: &str, method: &str) -> Node {
    make::expressions(vec![make::class_def(
        make::path(&[class]),
        None,
        &[],
        vec![make::def_node(method, vec![], vec![])],
    )])
}

#[test]
fn reopened_class_merges_methods_across_files() {
    let mut index = SemanticIndex::new();
    index.index_tree("file:///a.cr", &class_with_method("Foo", "bar"));
    index.index_tree("file:///b.cr", &class_with_method("Foo", "baz"));

    assert_eq!(method_names(&index, "Foo"), vec!["bar", "baz"]);
    let defs = index.type_definitions("Foo").expect("Foo definitions");
    assert_eq!(defs.len(), 2);

    index.remove_file("file:///b.cr");
    assert_eq!(method_names(&index, "Foo"), vec!["bar"]);

    index.remove_file("file:///a.cr");
    assert!(index.type_definitions("Foo").is_none());
    assert!(index.find_type("Foo").is_none());
}

#[test]
fn remove_file_round_trips_to_empty_index() {
    let mut index = SemanticIndex::new();
    let tree = make::expressions(vec![
        make::module_def(
            make::path(&["App"]),
            vec![make::class_def(
                make::path(&["Server"]),
                Some(make::path(&["Base"])),
                &[],
                vec![
                    make::include(make::path(&["Helpers"])),
                    make::def_node("run", vec![], vec![]),
                ],
            )],
        ),
        make::alias_def(make::path(&["Handle"]), make::path(&["App", "Server"])),
    ]);
    index.index_tree("file:///app.cr", &tree);
    assert!(index.stats().types > 0);

    index.remove_file("file:///app.cr");
    let stats = index.stats();
    assert_eq!(stats.files, 0);
    assert_eq!(stats.types, 0);
    assert_eq!(stats.elements, 0);
    assert!(index.includes_of("App::Server").is_empty());
    assert!(index.alias_elements("Handle").is_empty());
    assert!(index.affected_files("file:///app.cr").is_empty());
}

#[test]
fn indexing_twice_is_idempotent() {
    let mut index = SemanticIndex::new();
    let tree = class_with_method("Foo", "bar");
    index.index_tree("file:///a.cr", &tree);
    let first = index.stats();
    let first_methods = method_names(&index, "Foo");

    index.index_tree("file:///a.cr", &tree);
    assert_eq!(index.stats(), first);
    assert_eq!(method_names(&index, "Foo"), first_methods);
}

#[test]
fn nested_declarations_are_qualified_by_owner() {
    let mut index = SemanticIndex::new();
    let tree = make::expressions(vec![make::module_def(
        make::path(&["Outer"]),
        vec![
            make::class_def(make::path(&["Inner"]), None, &[], vec![]),
            // A nested name containing `::` is absolute.
            make::class_def(make::path(&["Other", "Place"]), None, &[], vec![]),
        ],
    )]);
    index.index_tree("file:///a.cr", &tree);

    assert!(index.find_type("Outer").is_some());
    assert!(index.find_type("Outer::Inner").is_some());
    assert!(index.find_type("Other::Place").is_some());
    assert!(index.find_type("Outer::Other::Place").is_none());

    for name in index.type_names() {
        let element = index.find_type(name).expect("type element").1;
        if let Some(owner) = element.owner_name() {
            assert!(
                name.contains("::") || owner.is_empty(),
                "nested type {name} should carry a qualified name"
            );
        }
    }
}

#[test]
fn superclass_methods_are_visible_through_ancestors() {
    let mut index = SemanticIndex::new();
    index.index_tree("file:///base.cr", &class_with_method("Base", "greet"));
    let child = make::expressions(vec![make::class_def(
        make::path(&["Child"]),
        Some(make::path(&["Base"])),
        &[],
        vec![make::def_node("call", vec![], vec![])],
    )]);
    index.index_tree("file:///child.cr", &child);

    assert_eq!(index.ancestors("Child"), vec!["Child", "Base"]);
    let greet = index.methods_on("Child", Some("greet"), Some(false));
    assert_eq!(greet.len(), 1);
    let owner = match index.element(greet[0]) {
        Some(PsiElement::Method(method)) => method.owner.clone(),
        _ => panic!("expected method"),
    };
    assert_eq!(owner, "Base");

    // The child file depends on Base, so changing the base file reindexes it.
    let affected = index.affected_files("file:///base.cr");
    assert!(affected.contains(&"file:///child.cr".to_string()));

    // Replace Base with an empty class: greet disappears for Child too.
    index.index_tree(
        "file:///base.cr",
        &make::expressions(vec![make::class_def(make::path(&["Base"]), None, &[], vec![])]),
    );
    assert!(index.methods_on("Child", Some("greet"), Some(false)).is_empty());
}

#[test]
fn include_brings_module_methods_into_the_chain() {
    let mut index = SemanticIndex::new();
    let helpers = make::expressions(vec![make::module_def(
        make::path(&["Helpers"]),
        vec![make::def_node("assist", vec![], vec![])],
    )]);
    index.index_tree("file:///helpers.cr", &helpers);

    let user = make::expressions(vec![make::class_def(
        make::path(&["User"]),
        None,
        &[],
        vec![make::include(make::path(&["Helpers"]))],
    )]);
    index.index_tree("file:///user.cr", &user);

    assert_eq!(index.ancestors("User"), vec!["User", "Helpers"]);
    assert_eq!(method_names(&index, "User"), vec!["assist"]);

    index.remove_file("file:///user.cr");
    assert!(index.includes_of("User").is_empty());
}

#[test]
fn first_remaining_file_wins_for_superclass_and_location() {
    let mut index = SemanticIndex::new();
    let with_super = |sup: &str| {
        make::expressions(vec![make::class_def(
            make::path(&["Widget"]),
            Some(make::path(&[sup])),
            &[],
            vec![],
        )])
    };
    index.index_tree("file:///one.cr", &with_super("Alpha"));
    index.index_tree("file:///two.cr", &with_super("Beta"));

    assert_eq!(
        index.effective_superclass("Widget").and_then(|tr| tr.base_name()),
        Some("Alpha")
    );
    let element = index.find_type("Widget").expect("widget").1;
    assert_eq!(element.file(), Some("file:///one.cr"));

    index.remove_file("file:///one.cr");
    assert_eq!(
        index.effective_superclass("Widget").and_then(|tr| tr.base_name()),
        Some("Beta")
    );
    let element = index.find_type("Widget").expect("widget").1;
    assert_eq!(element.file(), Some("file:///two.cr"));
}

#[test]
fn enum_members_are_owner_scoped_and_additive() {
    let mut index = SemanticIndex::new();
    let tree = make::expressions(vec![make::enum_def(
        make::path(&["Color"]),
        vec![
            make::arg("Red"),
            make::arg_with_default("Green", make::number_literal("2")),
            make::def_node("hex", vec![], vec![]),
        ],
    )]);
    index.index_tree("file:///color.cr", &tree);

    let members: Vec<String> = index
        .enum_members("Color")
        .into_iter()
        .filter_map(|id| index.element(id).map(|el| el.name().to_string()))
        .collect();
    assert_eq!(members, vec!["Red", "Green"]);
    assert!(index.enum_member("Color", "Green").is_some());
    assert_eq!(method_names(&index, "Color"), vec!["hex"]);

    let reopened = make::expressions(vec![make::enum_def(
        make::path(&["Color"]),
        vec![make::arg("Blue")],
    )]);
    index.index_tree("file:///color_ext.cr", &reopened);
    assert_eq!(index.enum_members("Color").len(), 3);

    index.remove_file("file:///color_ext.cr");
    assert_eq!(index.enum_members("Color").len(), 2);
}

#[test]
fn builtin_macro_generates_resolvable_methods() {
    let mut index = SemanticIndex::new();
    let tree = make::expressions(vec![make::class_def(
        make::path(&["User"]),
        None,
        &[],
        vec![
            make::call(None, "getter", vec![make::call(None, "name", vec![])])
                .at(1, 2, 1, 13)
                .named_at(1, 2, 6),
            make::call(
                None,
                "property",
                vec![make::type_declaration(
                    make::call(None, "age", vec![]),
                    make::path(&["Int32"]),
                    None,
                )],
            )
            .at(2, 2, 2, 22)
            .named_at(2, 2, 8),
        ],
    )]);
    index.index_tree("file:///user.cr", &tree);

    assert_eq!(method_names(&index, "User"), vec!["age", "age=", "name"]);

    let name_method = index.methods_on("User", Some("name"), Some(false));
    assert_eq!(name_method.len(), 1);
    let method = match index.element(name_method[0]) {
        Some(PsiElement::Method(method)) => method,
        _ => panic!("expected method"),
    };
    assert_eq!(method.owner, "User");
    let file = method.common.file.as_deref().expect("virtual file uri");
    assert!(file.starts_with("macro-scheme:"), "generated method lives in a virtual file: {file}");

    let age = index.methods_on("User", Some("age"), Some(false));
    let age = match index.element(age[0]) {
        Some(PsiElement::Method(method)) => method,
        _ => panic!("expected method"),
    };
    assert_eq!(age.return_type_str.as_deref(), Some("Int32"));

    // Tearing down the host file also removes the generated members.
    index.remove_file("file:///user.cr");
    assert!(index.methods_on("User", Some("name"), None).is_empty());
    assert_eq!(index.stats().elements, 0);
}

#[test]
fn user_macro_expansion_defines_methods_in_scope() {
    let mut index = SemanticIndex::new();
    // macro field(name) -> def {{name.id}}; end
    let tree = make::expressions(vec![make::class_def(
        make::path(&["Config"]),
        None,
        &[],
        vec![
            make::macro_def(
                "field",
                vec![make::arg("name")],
                vec![
                    make::macro_literal("def "),
                    make::macro_expression(make::call(Some(make::var("name")), "id", vec![])),
                    make::macro_literal("; end\n"),
                ],
            ),
            make::call(None, "field", vec![make::symbol_literal("host")]).at(5, 2, 5, 13),
            make::call(None, "field", vec![make::symbol_literal("port")]).at(6, 2, 6, 13),
        ],
    )]);
    index.index_tree("file:///config.cr", &tree);

    assert_eq!(method_names(&index, "Config"), vec!["host", "port"]);
}

#[test]
fn macro_scope_prefers_innermost_definition() {
    let mut index = SemanticIndex::new();
    let stub_body = |text: &str| {
        vec![
            make::macro_literal("def "),
            make::macro_literal(text),
            make::macro_literal("; end\n"),
        ]
    };
    let tree = make::expressions(vec![
        make::macro_def("gen", vec![], stub_body("outer_one")),
        make::module_def(
            make::path(&["Wrap"]),
            vec![
                make::macro_def("gen", vec![], stub_body("inner_one")),
                make::class_def(
                    make::path(&["Thing"]),
                    None,
                    &[],
                    vec![make::call(None, "gen", vec![]).at(4, 2, 4, 5)],
                ),
            ],
        ),
    ]);
    index.index_tree("file:///scope.cr", &tree);

    assert_eq!(method_names(&index, "Wrap::Thing"), vec!["inner_one"]);
}

#[test]
fn macro_expansion_depth_is_bounded() {
    let mut index = SemanticIndex::new();
    // A parser that always returns a tree containing another call to the
    // same macro: without the depth bound this would never terminate.
    let looping_parser = |_: &str, _: &str| -> Option<cryls_ast::node::Node> {
        Some(make::expressions(vec![
            make::def_node("generated", vec![], vec![]),
            make::call(None, "loop_macro", vec![]),
        ]))
    };

    let tree = make::expressions(vec![make::class_def(
        make::path(&["Looper"]),
        None,
        &[],
        vec![
            make::macro_def("loop_macro", vec![], vec![make::macro_literal("def generated; end\n")]),
            make::call(None, "loop_macro", vec![]).at(2, 2, 2, 12),
        ],
    )]);
    index.index_tree_with("file:///loop.cr", &tree, &looping_parser);

    let generated = index.methods_on("Looper", Some("generated"), Some(false));
    assert_eq!(generated.len(), 4, "expansion stops at the depth bound");
}

#[test]
fn failed_macro_interpretation_keeps_rest_of_file() {
    let mut index = SemanticIndex::new();
    let tree = make::expressions(vec![make::class_def(
        make::path(&["Sturdy"]),
        None,
        &[],
        vec![
            // `for` over a non-collection raises inside the interpreter.
            make::macro_def(
                "broken",
                vec![make::arg("x")],
                vec![make::macro_for("i", make::var("x"), vec![make::macro_literal("def a; end\n")])],
            ),
            make::call(None, "broken", vec![make::number_literal("1")]).at(3, 2, 3, 10),
            make::def_node("still_here", vec![], vec![]),
        ],
    )]);
    index.index_tree("file:///sturdy.cr", &tree);

    assert_eq!(method_names(&index, "Sturdy"), vec!["still_here"]);
}

#[test]
fn alias_resolution_follows_target() {
    let mut index = SemanticIndex::new();
    index.index_tree("file:///list.cr", &class_with_method("List", "first"));
    let tree = make::expressions(vec![make::alias_def(
        make::path(&["Seq"]),
        make::generic(make::path(&["List"]), vec![make::path(&["Int32"])]),
    )]);
    index.index_tree("file:///alias.cr", &tree);

    assert_eq!(index.alias_elements("Seq").len(), 1);
    let resolved = index.resolve_typeref(&cryls_index::TypeRef::named("Seq"), None);
    assert_eq!(resolved.as_deref(), Some("List"));

    index.remove_file("file:///alias.cr");
    assert!(index.alias_elements("Seq").is_empty());
    assert!(index.resolve_typeref(&cryls_index::TypeRef::named("Seq"), None).is_none());
}

#[test]
fn splat_methods_admit_any_surplus_arity() {
    let mut index = SemanticIndex::new();
    let log = make::def_with_splat(
        make::def_node("log", vec![make::arg("level"), make::arg("parts")], vec![]),
        1,
    );
    let tree = make::expressions(vec![make::class_def(
        make::path(&["Logger"]),
        None,
        &[],
        vec![log],
    )]);
    index.index_tree("file:///logger.cr", &tree);

    let ids = index.methods_on("Logger", Some("log"), Some(false));
    let arity = match index.element(ids[0]) {
        Some(PsiElement::Method(method)) => method.arity,
        _ => panic!("expected method"),
    };
    assert_eq!(arity.min, 1);
    assert_eq!(arity.max, None);
    assert!(!arity.admits(0));
    assert!(arity.admits(1));
    assert!(arity.admits(12));
}

#[test]
fn type_vars_are_recorded_for_generics() {
    let mut index = SemanticIndex::new();
    let tree = make::expressions(vec![make::class_def(
        make::path(&["Container"]),
        None,
        &["T"],
        vec![make::def_node("value", vec![], vec![])],
    )]);
    index.index_tree("file:///container.cr", &tree);
    assert_eq!(index.type_vars("Container"), ["T".to_string()]);

    let defs = index.type_definitions("Container").expect("defs");
    assert_eq!(defs.values().next().map(|d| d.kind), Some(TypeKind::Class));
}

#[test]
fn affected_files_walks_reverse_edges_transitively() {
    let mut index = SemanticIndex::new();
    index.index_tree("file:///a.cr", &class_with_method("A", "a"));
    let b = make::expressions(vec![make::class_def(
        make::path(&["B"]),
        Some(make::path(&["A"])),
        &[],
        vec![],
    )]);
    index.index_tree("file:///b.cr", &b);
    let c = make::expressions(vec![make::class_def(
        make::path(&["C"]),
        Some(make::path(&["B"])),
        &[],
        vec![],
    )]);
    index.index_tree("file:///c.cr", &c);

    let affected = index.affected_files("file:///a.cr");
    assert!(affected.contains(&"file:///b.cr".to_string()));
    assert!(affected.contains(&"file:///c.cr".to_string()));
    assert!(!affected.contains(&"file:///a.cr".to_string()));

    index.remove_file("file:///c.cr");
    let affected = index.affected_files("file:///a.cr");
    assert!(!affected.contains(&"file:///c.cr".to_string()));
}
