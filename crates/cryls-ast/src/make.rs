//! Node constructors.
//!
//! Thin builders over `Node`/`NodeKind`. Tests assemble trees with these,
//! and the macro machinery uses them when synthesizing generated members.

use cryls_common::position::Position;

use crate::node::{NamedArgument, Node, NodeKind};

/// Positioning helpers, chainable on any node.
impl Node {
    #[must_use]
    pub fn at(mut self, start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        self.location = Some(Position::new(start_line, start_col));
        self.end_location = Some(Position::new(end_line, end_col));
        self
    }

    #[must_use]
    pub fn named_at(mut self, line: u32, col: u32, size: u32) -> Self {
        self.name_location = Some(Position::new(line, col));
        self.name_size = size;
        self
    }

    #[must_use]
    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_string());
        self
    }
}

#[must_use]
pub fn expressions(nodes: Vec<Node>) -> Node {
    Node::new(NodeKind::Expressions(nodes))
}

#[must_use]
pub fn nop() -> Node {
    Node::new(NodeKind::Nop)
}

#[must_use]
pub fn module_def(name: Node, body: Vec<Node>) -> Node {
    Node::new(NodeKind::ModuleDef {
        name: Box::new(name),
        body: Box::new(expressions(body)),
    })
}

#[must_use]
pub fn class_def(name: Node, superclass: Option<Node>, type_vars: &[&str], body: Vec<Node>) -> Node {
    Node::new(NodeKind::ClassDef {
        name: Box::new(name),
        superclass: superclass.map(Box::new),
        type_vars: type_vars.iter().map(|v| (*v).to_string()).collect(),
        body: Box::new(expressions(body)),
        is_struct: false,
        is_abstract: false,
    })
}

#[must_use]
pub fn enum_def(name: Node, body: Vec<Node>) -> Node {
    Node::new(NodeKind::EnumDef {
        name: Box::new(name),
        body: Box::new(expressions(body)),
    })
}

#[must_use]
pub fn alias_def(name: Node, value: Node) -> Node {
    Node::new(NodeKind::AliasDef {
        name: Box::new(name),
        value: Box::new(value),
    })
}

#[must_use]
pub fn include(name: Node) -> Node {
    Node::new(NodeKind::Include {
        name: Box::new(name),
    })
}

#[must_use]
pub fn def_node(name: &str, args: Vec<Node>, body: Vec<Node>) -> Node {
    Node::new(NodeKind::Def {
        name: name.to_string(),
        receiver: None,
        args,
        splat_index: None,
        return_type: None,
        body: Box::new(expressions(body)),
    })
}

/// `def self.name(args)` - a class method definition.
#[must_use]
pub fn class_def_node(name: &str, args: Vec<Node>, body: Vec<Node>) -> Node {
    let mut node = def_node(name, args, body);
    if let NodeKind::Def { receiver, .. } = &mut node.kind {
        *receiver = Some(Box::new(self_literal()));
    }
    node
}

/// Attach a return-type restriction to a `Def`.
#[must_use]
pub fn def_returning(mut def: Node, return_type_node: Node) -> Node {
    if let NodeKind::Def { return_type, .. } = &mut def.kind {
        *return_type = Some(Box::new(return_type_node));
    }
    def
}

/// Mark the parameter at `index` as the splat parameter of a `Def`.
#[must_use]
pub fn def_with_splat(mut def: Node, index: usize) -> Node {
    if let NodeKind::Def { splat_index, .. } = &mut def.kind {
        *splat_index = Some(index);
    }
    def
}

#[must_use]
pub fn macro_def(name: &str, args: Vec<Node>, body: Vec<Node>) -> Node {
    Node::new(NodeKind::MacroDef {
        name: name.to_string(),
        args,
        splat_index: None,
        body: Box::new(expressions(body)),
    })
}

#[must_use]
pub fn call(obj: Option<Node>, name: &str, args: Vec<Node>) -> Node {
    Node::new(NodeKind::Call {
        obj: obj.map(Box::new),
        name: name.to_string(),
        args,
        named_args: Vec::new(),
        block: None,
        has_parentheses: false,
    })
}

#[must_use]
pub fn call_with_parens(obj: Option<Node>, name: &str, args: Vec<Node>) -> Node {
    let mut node = call(obj, name, args);
    if let NodeKind::Call {
        has_parentheses, ..
    } = &mut node.kind
    {
        *has_parentheses = true;
    }
    node
}

#[must_use]
pub fn call_named(mut call_node: Node, named: Vec<(&str, Node)>) -> Node {
    if let NodeKind::Call { named_args, .. } = &mut call_node.kind {
        *named_args = named
            .into_iter()
            .map(|(name, value)| NamedArgument {
                name: name.to_string(),
                value,
            })
            .collect();
    }
    call_node
}

#[must_use]
pub fn var(name: &str) -> Node {
    Node::new(NodeKind::Var {
        name: name.to_string(),
    })
}

#[must_use]
pub fn ivar(name: &str) -> Node {
    Node::new(NodeKind::InstanceVar {
        name: name.to_string(),
    })
}

#[must_use]
pub fn cvar(name: &str) -> Node {
    Node::new(NodeKind::ClassVar {
        name: name.to_string(),
    })
}

#[must_use]
pub fn self_literal() -> Node {
    Node::new(NodeKind::SelfLiteral)
}

#[must_use]
pub fn path(names: &[&str]) -> Node {
    Node::new(NodeKind::Path {
        names: names.iter().map(|n| (*n).to_string()).collect(),
        global: false,
    })
}

#[must_use]
pub fn global_path(names: &[&str]) -> Node {
    Node::new(NodeKind::Path {
        names: names.iter().map(|n| (*n).to_string()).collect(),
        global: true,
    })
}

#[must_use]
pub fn generic(name: Node, args: Vec<Node>) -> Node {
    Node::new(NodeKind::Generic {
        name: Box::new(name),
        args,
    })
}

#[must_use]
pub fn metaclass(name: Node) -> Node {
    Node::new(NodeKind::Metaclass {
        name: Box::new(name),
    })
}

#[must_use]
pub fn union(types: Vec<Node>) -> Node {
    Node::new(NodeKind::Union { types })
}

#[must_use]
pub fn cast(obj: Node, to: Node) -> Node {
    Node::new(NodeKind::Cast {
        obj: Box::new(obj),
        to: Box::new(to),
    })
}

#[must_use]
pub fn nilable_cast(obj: Node, to: Node) -> Node {
    Node::new(NodeKind::NilableCast {
        obj: Box::new(obj),
        to: Box::new(to),
    })
}

#[must_use]
pub fn type_declaration(var: Node, declared_type: Node, value: Option<Node>) -> Node {
    Node::new(NodeKind::TypeDeclaration {
        var: Box::new(var),
        declared_type: Box::new(declared_type),
        value: value.map(Box::new),
    })
}

#[must_use]
pub fn assign(target: Node, value: Node) -> Node {
    Node::new(NodeKind::Assign {
        target: Box::new(target),
        value: Box::new(value),
    })
}

#[must_use]
pub fn op_assign(target: Node, op: &str, value: Node) -> Node {
    Node::new(NodeKind::OpAssign {
        target: Box::new(target),
        op: op.to_string(),
        value: Box::new(value),
    })
}

#[must_use]
pub fn multi_assign(targets: Vec<Node>, values: Vec<Node>) -> Node {
    Node::new(NodeKind::MultiAssign { targets, values })
}

#[must_use]
pub fn block(args: Vec<Node>, body: Vec<Node>) -> Node {
    Node::new(NodeKind::Block {
        args,
        body: Box::new(expressions(body)),
    })
}

#[must_use]
pub fn if_node(cond: Node, then: Vec<Node>, els: Option<Vec<Node>>) -> Node {
    Node::new(NodeKind::If {
        cond: Box::new(cond),
        then: Box::new(expressions(then)),
        els: els.map(|nodes| Box::new(expressions(nodes))),
    })
}

#[must_use]
pub fn unless_node(cond: Node, then: Vec<Node>, els: Option<Vec<Node>>) -> Node {
    Node::new(NodeKind::Unless {
        cond: Box::new(cond),
        then: Box::new(expressions(then)),
        els: els.map(|nodes| Box::new(expressions(nodes))),
    })
}

#[must_use]
pub fn while_node(cond: Node, body: Vec<Node>) -> Node {
    Node::new(NodeKind::While {
        cond: Box::new(cond),
        body: Box::new(expressions(body)),
    })
}

#[must_use]
pub fn until_node(cond: Node, body: Vec<Node>) -> Node {
    Node::new(NodeKind::Until {
        cond: Box::new(cond),
        body: Box::new(expressions(body)),
    })
}

#[must_use]
pub fn case_node(cond: Option<Node>, whens: Vec<Node>, els: Option<Vec<Node>>) -> Node {
    Node::new(NodeKind::Case {
        cond: cond.map(Box::new),
        whens,
        els: els.map(|nodes| Box::new(expressions(nodes))),
    })
}

#[must_use]
pub fn when_node(conds: Vec<Node>, body: Vec<Node>) -> Node {
    Node::new(NodeKind::When {
        conds,
        body: Box::new(expressions(body)),
    })
}

#[must_use]
pub fn exception_handler(body: Vec<Node>, rescues: Vec<Node>, ensure: Option<Vec<Node>>) -> Node {
    Node::new(NodeKind::ExceptionHandler {
        body: Box::new(expressions(body)),
        rescues,
        els: None,
        ensure: ensure.map(|nodes| Box::new(expressions(nodes))),
    })
}

#[must_use]
pub fn rescue_node(types: Vec<Node>, name: Option<&str>, body: Vec<Node>) -> Node {
    Node::new(NodeKind::Rescue {
        types,
        name: name.map(str::to_string),
        body: Box::new(expressions(body)),
    })
}

#[must_use]
pub fn range_literal(from: Node, to: Node, exclusive: bool) -> Node {
    Node::new(NodeKind::RangeLiteral {
        from: Box::new(from),
        to: Box::new(to),
        exclusive,
    })
}

#[must_use]
pub fn array_literal(elements: Vec<Node>, of: Option<Node>) -> Node {
    Node::new(NodeKind::ArrayLiteral {
        elements,
        of: of.map(Box::new),
    })
}

#[must_use]
pub fn hash_literal(entries: Vec<(Node, Node)>, of: Option<(Node, Node)>) -> Node {
    Node::new(NodeKind::HashLiteral {
        entries,
        of: of.map(|(key, value)| (Box::new(key), Box::new(value))),
    })
}

#[must_use]
pub fn tuple_literal(elements: Vec<Node>) -> Node {
    Node::new(NodeKind::TupleLiteral { elements })
}

#[must_use]
pub fn string_literal(value: &str) -> Node {
    Node::new(NodeKind::StringLiteral(value.to_string()))
}

#[must_use]
pub fn symbol_literal(value: &str) -> Node {
    Node::new(NodeKind::SymbolLiteral(value.to_string()))
}

#[must_use]
pub fn number_literal(value: &str) -> Node {
    Node::new(NodeKind::NumberLiteral(value.to_string()))
}

#[must_use]
pub fn bool_literal(value: bool) -> Node {
    Node::new(NodeKind::BoolLiteral(value))
}

#[must_use]
pub fn nil_literal() -> Node {
    Node::new(NodeKind::NilLiteral)
}

#[must_use]
pub fn require_node(path: &str) -> Node {
    Node::new(NodeKind::Require {
        path: path.to_string(),
    })
}

#[must_use]
pub fn arg(name: &str) -> Node {
    Node::new(NodeKind::Arg {
        name: name.to_string(),
        external_name: None,
        default_value: None,
        restriction: None,
    })
}

#[must_use]
pub fn arg_with_default(name: &str, default: Node) -> Node {
    let mut node = arg(name);
    if let NodeKind::Arg { default_value, .. } = &mut node.kind {
        *default_value = Some(Box::new(default));
    }
    node
}

#[must_use]
pub fn arg_with_restriction(name: &str, restriction_node: Node) -> Node {
    let mut node = arg(name);
    if let NodeKind::Arg { restriction, .. } = &mut node.kind {
        *restriction = Some(Box::new(restriction_node));
    }
    node
}

#[must_use]
pub fn named_arg(name: &str, value: Node) -> Node {
    Node::new(NodeKind::NamedArg {
        name: name.to_string(),
        value: Box::new(value),
    })
}

#[must_use]
pub fn macro_literal(text: &str) -> Node {
    Node::new(NodeKind::MacroLiteral(text.to_string()))
}

#[must_use]
pub fn macro_expression(exp: Node) -> Node {
    Node::new(NodeKind::MacroExpression { exp: Box::new(exp) })
}

#[must_use]
pub fn macro_if(cond: Node, then: Vec<Node>, els: Option<Vec<Node>>) -> Node {
    Node::new(NodeKind::MacroIf {
        cond: Box::new(cond),
        then: Box::new(expressions(then)),
        els: els.map(|nodes| Box::new(expressions(nodes))),
    })
}

#[must_use]
pub fn macro_for(var_name: &str, exp: Node, body: Vec<Node>) -> Node {
    Node::new(NodeKind::MacroFor {
        var: var_name.to_string(),
        exp: Box::new(exp),
        body: Box::new(expressions(body)),
    })
}
