//! Editor-query providers for the cryls language server core.
//!
//! Every provider is a read-only function over a `SemanticIndex` plus the
//! parsed tree of the queried document:
//! - `Analysis` - per-cursor node context and type environment
//! - definition resolution, hover, completion, signature help
//! - document highlights, selection ranges, document symbols
//! - workspace configuration, scanning and incremental reindexing

pub mod node_finder;
pub use node_finder::{NodeContext, find_node_at};

pub mod type_env;
pub use type_env::{TypeEnv, build_type_env};

pub mod analysis;
pub use analysis::Analysis;

pub mod infer;
pub use infer::infer_type;

pub mod resolver;
pub use resolver::{call_candidates, call_candidates_unfiltered, resolve_definition};

pub mod completion;
pub use completion::{
    CompletionData, CompletionItem, CompletionItemKind, CompletionParams, complete,
    resolve_completion_item,
};

pub mod keywords;
pub use keywords::keyword_items;

pub mod require_paths;
pub use require_paths::require_path_items;

pub mod hover;
pub use hover::{Hover, element_signature, hover};

pub mod signature_help;
pub use signature_help::{
    ParameterInformation, SignatureHelp, SignatureInformation, signature_help,
};

pub mod highlights;
pub use highlights::document_highlights;

pub mod selection_range;
pub use selection_range::{SelectionRange, selection_range};

pub mod document_symbols;
pub use document_symbols::{DocumentSymbol, document_symbols};

pub mod workspace;
pub use workspace::{DEBUG_ENV, STDLIB_PATH_ENV, WorkspaceConfig, index_workspace, reindex_document};
