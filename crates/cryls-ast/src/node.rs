//! The tagged syntax-tree node model.
//!
//! Every node carries an optional source range plus, for named nodes
//! (calls, paths, definitions), the location and length of the bare name
//! inside that range. Docs are attached to declarations by the parser.

use cryls_common::position::{Position, Range};

/// A named argument in a call (`foo(x: 1)`).
#[derive(Debug, Clone, PartialEq)]
pub struct NamedArgument {
    pub name: String,
    pub value: Node,
}

/// The node variants the semantic core distinguishes.
///
/// Anything else the language has is delivered as `Nop` by the parser and
/// ignored here.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// `module Name ... end`
    ModuleDef { name: Box<Node>, body: Box<Node> },
    /// `class Name(T) < Super ... end` (also `struct`)
    ClassDef {
        name: Box<Node>,
        superclass: Option<Box<Node>>,
        type_vars: Vec<String>,
        body: Box<Node>,
        is_struct: bool,
        is_abstract: bool,
    },
    /// `enum Name ... end`; members arrive as `Arg` nodes in the body
    EnumDef { name: Box<Node>, body: Box<Node> },
    /// `alias Name = Target`
    AliasDef { name: Box<Node>, value: Box<Node> },
    /// `include Mixin`
    Include { name: Box<Node> },
    /// `def name(args) : Ret ... end`; `receiver` is set for `def self.x`
    Def {
        name: String,
        receiver: Option<Box<Node>>,
        args: Vec<Node>,
        splat_index: Option<usize>,
        return_type: Option<Box<Node>>,
        body: Box<Node>,
    },
    /// `macro name(args) ... end`
    MacroDef {
        name: String,
        args: Vec<Node>,
        splat_index: Option<usize>,
        body: Box<Node>,
    },
    /// A call, with optional receiver and an optional trailing block
    Call {
        obj: Option<Box<Node>>,
        name: String,
        args: Vec<Node>,
        named_args: Vec<NamedArgument>,
        block: Option<Box<Node>>,
        has_parentheses: bool,
    },
    /// A local variable read
    Var { name: String },
    /// `@ivar`
    InstanceVar { name: String },
    /// `@@cvar`
    ClassVar { name: String },
    /// `self`
    SelfLiteral,
    /// `A::B::C`; `global` when spelled with a leading `::`
    Path { names: Vec<String>, global: bool },
    /// `Name(Arg1, Arg2)` in type position
    Generic { name: Box<Node>, args: Vec<Node> },
    /// `T.class`
    Metaclass { name: Box<Node> },
    /// `A | B`
    Union { types: Vec<Node> },
    /// `expr.as(T)`
    Cast { obj: Box<Node>, to: Box<Node> },
    /// `expr.as?(T)`
    NilableCast { obj: Box<Node>, to: Box<Node> },
    /// `var : Type` or `var : Type = value`
    TypeDeclaration {
        var: Box<Node>,
        declared_type: Box<Node>,
        value: Option<Box<Node>>,
    },
    Assign {
        target: Box<Node>,
        value: Box<Node>,
    },
    OpAssign {
        target: Box<Node>,
        op: String,
        value: Box<Node>,
    },
    MultiAssign {
        targets: Vec<Node>,
        values: Vec<Node>,
    },
    /// A block argument body (`do |x| ... end`)
    Block { args: Vec<Node>, body: Box<Node> },
    If {
        cond: Box<Node>,
        then: Box<Node>,
        els: Option<Box<Node>>,
    },
    Unless {
        cond: Box<Node>,
        then: Box<Node>,
        els: Option<Box<Node>>,
    },
    While {
        cond: Box<Node>,
        body: Box<Node>,
    },
    Until {
        cond: Box<Node>,
        body: Box<Node>,
    },
    Case {
        cond: Option<Box<Node>>,
        whens: Vec<Node>,
        els: Option<Box<Node>>,
    },
    When {
        conds: Vec<Node>,
        body: Box<Node>,
    },
    /// `begin ... rescue ... else ... ensure ... end`
    ExceptionHandler {
        body: Box<Node>,
        rescues: Vec<Node>,
        els: Option<Box<Node>>,
        ensure: Option<Box<Node>>,
    },
    /// One `rescue [name :] [Types]` clause
    Rescue {
        types: Vec<Node>,
        name: Option<String>,
        body: Box<Node>,
    },
    RangeLiteral {
        from: Box<Node>,
        to: Box<Node>,
        exclusive: bool,
    },
    ArrayLiteral {
        elements: Vec<Node>,
        of: Option<Box<Node>>,
    },
    HashLiteral {
        entries: Vec<(Node, Node)>,
        of: Option<(Box<Node>, Box<Node>)>,
    },
    TupleLiteral { elements: Vec<Node> },
    StringLiteral(String),
    SymbolLiteral(String),
    NumberLiteral(String),
    BoolLiteral(bool),
    NilLiteral,
    /// `require "path"`
    Require { path: String },
    Nop,
    /// A parameter (also an enum member in enum bodies)
    Arg {
        name: String,
        external_name: Option<String>,
        default_value: Option<Box<Node>>,
        restriction: Option<Box<Node>>,
    },
    /// A named argument appearing in the tree (kept addressable for the
    /// cursor machinery)
    NamedArg { name: String, value: Box<Node> },
    /// A statement sequence (file and body container)
    Expressions(Vec<Node>),
    /// Verbatim text inside a macro body
    MacroLiteral(String),
    /// `{{ exp }}` inside a macro body
    MacroExpression { exp: Box<Node> },
    /// `{% if cond %} ... {% else %} ... {% end %}`
    MacroIf {
        cond: Box<Node>,
        then: Box<Node>,
        els: Option<Box<Node>>,
    },
    /// `{% for var in exp %} ... {% end %}`
    MacroFor {
        var: String,
        exp: Box<Node>,
        body: Box<Node>,
    },
}

/// A syntax-tree node: a tagged kind plus source locations and doc comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub location: Option<Position>,
    pub end_location: Option<Position>,
    /// Start of the bare name inside the node, for calls/paths/definitions
    pub name_location: Option<Position>,
    /// Length of the bare name in characters
    pub name_size: u32,
    pub doc: Option<String>,
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            location: None,
            end_location: None,
            name_location: None,
            name_size: 0,
            doc: None,
        }
    }

    /// Full source range, when both endpoints are known.
    #[must_use]
    pub fn range(&self) -> Option<Range> {
        Some(Range::new(self.location?, self.end_location?))
    }

    /// Range of the bare name, when the parser recorded one.
    #[must_use]
    pub fn name_range(&self) -> Option<Range> {
        let start = self.name_location?;
        let end = Position::new(start.line, start.character + self.name_size);
        Some(Range::new(start, end))
    }

    /// The spelled name of this node, for the kinds that have one.
    #[must_use]
    pub fn name_str(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Def { name, .. }
            | NodeKind::MacroDef { name, .. }
            | NodeKind::Call { name, .. }
            | NodeKind::Var { name }
            | NodeKind::InstanceVar { name }
            | NodeKind::ClassVar { name }
            | NodeKind::Arg { name, .. }
            | NodeKind::NamedArg { name, .. } => Some(name),
            NodeKind::Path { .. } => None,
            _ => None,
        }
    }

    /// For `Path` nodes, the full `::`-joined spelling (with a leading `::`
    /// when global).
    #[must_use]
    pub fn path_full(&self) -> Option<String> {
        match &self.kind {
            NodeKind::Path { names, global } => {
                let joined = names.join("::");
                Some(if *global { format!("::{joined}") } else { joined })
            }
            _ => None,
        }
    }

    /// Whether this node opens a type definition (module/class/enum).
    #[must_use]
    pub fn is_type_definition(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::ModuleDef { .. } | NodeKind::ClassDef { .. } | NodeKind::EnumDef { .. }
        )
    }

    /// The name node of a type definition.
    #[must_use]
    pub fn type_definition_name(&self) -> Option<&Node> {
        match &self.kind {
            NodeKind::ModuleDef { name, .. }
            | NodeKind::ClassDef { name, .. }
            | NodeKind::EnumDef { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Immediate children in source order.
    #[must_use]
    pub fn children(&self) -> Vec<&Node> {
        let mut out: Vec<&Node> = Vec::new();
        match &self.kind {
            NodeKind::ModuleDef { name, body } => {
                out.push(name);
                out.push(body);
            }
            NodeKind::ClassDef {
                name,
                superclass,
                body,
                ..
            } => {
                out.push(name);
                if let Some(sup) = superclass {
                    out.push(sup);
                }
                out.push(body);
            }
            NodeKind::EnumDef { name, body } => {
                out.push(name);
                out.push(body);
            }
            NodeKind::AliasDef { name, value } => {
                out.push(name);
                out.push(value);
            }
            NodeKind::Include { name } | NodeKind::Metaclass { name } => out.push(name),
            NodeKind::Def {
                receiver,
                args,
                return_type,
                body,
                ..
            } => {
                if let Some(recv) = receiver {
                    out.push(recv);
                }
                out.extend(args.iter());
                if let Some(ret) = return_type {
                    out.push(ret);
                }
                out.push(body);
            }
            NodeKind::MacroDef { args, body, .. } => {
                out.extend(args.iter());
                out.push(body);
            }
            NodeKind::Call {
                obj,
                args,
                named_args,
                block,
                ..
            } => {
                if let Some(obj) = obj {
                    out.push(obj);
                }
                out.extend(args.iter());
                for named in named_args {
                    out.push(&named.value);
                }
                if let Some(block) = block {
                    out.push(block);
                }
            }
            NodeKind::Generic { name, args } => {
                out.push(name);
                out.extend(args.iter());
            }
            NodeKind::Union { types } => out.extend(types.iter()),
            NodeKind::Cast { obj, to } | NodeKind::NilableCast { obj, to } => {
                out.push(obj);
                out.push(to);
            }
            NodeKind::TypeDeclaration {
                var,
                declared_type,
                value,
            } => {
                out.push(var);
                out.push(declared_type);
                if let Some(value) = value {
                    out.push(value);
                }
            }
            NodeKind::Assign { target, value } | NodeKind::OpAssign { target, value, .. } => {
                out.push(target);
                out.push(value);
            }
            NodeKind::MultiAssign { targets, values } => {
                out.extend(targets.iter());
                out.extend(values.iter());
            }
            NodeKind::Block { args, body } => {
                out.extend(args.iter());
                out.push(body);
            }
            NodeKind::If { cond, then, els } | NodeKind::Unless { cond, then, els } => {
                out.push(cond);
                out.push(then);
                if let Some(els) = els {
                    out.push(els);
                }
            }
            NodeKind::While { cond, body } | NodeKind::Until { cond, body } => {
                out.push(cond);
                out.push(body);
            }
            NodeKind::Case { cond, whens, els } => {
                if let Some(cond) = cond {
                    out.push(cond);
                }
                out.extend(whens.iter());
                if let Some(els) = els {
                    out.push(els);
                }
            }
            NodeKind::When { conds, body } => {
                out.extend(conds.iter());
                out.push(body);
            }
            NodeKind::ExceptionHandler {
                body,
                rescues,
                els,
                ensure,
            } => {
                out.push(body);
                out.extend(rescues.iter());
                if let Some(els) = els {
                    out.push(els);
                }
                if let Some(ensure) = ensure {
                    out.push(ensure);
                }
            }
            NodeKind::Rescue { types, body, .. } => {
                out.extend(types.iter());
                out.push(body);
            }
            NodeKind::RangeLiteral { from, to, .. } => {
                out.push(from);
                out.push(to);
            }
            NodeKind::ArrayLiteral { elements, of } => {
                out.extend(elements.iter());
                if let Some(of) = of {
                    out.push(of);
                }
            }
            NodeKind::HashLiteral { entries, of } => {
                for (key, value) in entries {
                    out.push(key);
                    out.push(value);
                }
                if let Some((key, value)) = of {
                    out.push(key);
                    out.push(value);
                }
            }
            NodeKind::TupleLiteral { elements } => out.extend(elements.iter()),
            NodeKind::Arg {
                default_value,
                restriction,
                ..
            } => {
                if let Some(default) = default_value {
                    out.push(default);
                }
                if let Some(restriction) = restriction {
                    out.push(restriction);
                }
            }
            NodeKind::NamedArg { value, .. } => out.push(value),
            NodeKind::Expressions(nodes) => out.extend(nodes.iter()),
            NodeKind::MacroExpression { exp } => out.push(exp),
            NodeKind::MacroIf { cond, then, els } => {
                out.push(cond);
                out.push(then);
                if let Some(els) = els {
                    out.push(els);
                }
            }
            NodeKind::MacroFor { exp, body, .. } => {
                out.push(exp);
                out.push(body);
            }
            NodeKind::Var { .. }
            | NodeKind::InstanceVar { .. }
            | NodeKind::ClassVar { .. }
            | NodeKind::SelfLiteral
            | NodeKind::Path { .. }
            | NodeKind::StringLiteral(_)
            | NodeKind::SymbolLiteral(_)
            | NodeKind::NumberLiteral(_)
            | NodeKind::BoolLiteral(_)
            | NodeKind::NilLiteral
            | NodeKind::Require { .. }
            | NodeKind::Nop
            | NodeKind::MacroLiteral(_) => {}
        }
        out
    }

    /// Whether the node is "empty" in the macro-truthiness sense.
    #[must_use]
    pub fn is_nop(&self) -> bool {
        matches!(self.kind, NodeKind::Nop)
    }
}
