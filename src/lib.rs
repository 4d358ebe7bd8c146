//! cryls - the semantic analysis core of a Crystal language server.
//!
//! The workspace crates re-exported here:
//! - [`cryls_common`] - positions, virtual-file URIs, limits
//! - [`cryls_ast`] - the syntax-tree contract the external parser delivers
//! - [`cryls_index`] - the semantic index and indexing pipeline
//! - [`cryls_lsp`] - the editor-query providers

pub use cryls_ast as ast;
pub use cryls_common as common;
pub use cryls_index as index;
pub use cryls_lsp as lsp;

pub use cryls_index::SemanticIndex;
pub use cryls_lsp::{Analysis, WorkspaceConfig};
