//! Syntax-tree contract for the cryls semantic core.
//!
//! The parser itself is an external collaborator; this crate defines the
//! tagged tree it is expected to deliver:
//! - `Node`/`NodeKind` - the tagged node tree with source locations
//! - `Visitor`/`walk` - tree traversal with `Descend`/`Skip` control
//! - `make` - node constructors (used by tests and macro expansion)
//! - `SourceParser` - the parsing hook handed to the indexer, with
//!   `StubParser` covering the macro-generated source dialect

pub mod node;
pub use node::{NamedArgument, Node, NodeKind};

pub mod visitor;
pub use visitor::{VisitControl, Visitor, walk};

pub mod make;

pub mod parse;
pub use parse::{SourceParser, StubParser};
