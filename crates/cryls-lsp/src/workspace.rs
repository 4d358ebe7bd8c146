//! Workspace configuration and scanning.
//!
//! The workspace is selected by `root_uri` at initialization. Indexing
//! roots are, in order: the standard-library paths from the
//! `CRYSTAL_PATH` environment variable (colon-separated), `<root>/lib`
//! when present, then the root itself. Each root is walked once for `.cr`
//! files. Setting `CRYLS_DEBUG` dumps the chosen roots.

use std::path::{Path, PathBuf};

use cryls_ast::parse::SourceParser;
use cryls_common::uri::strip_file_scheme;
use cryls_index::SemanticIndex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Environment variable carrying colon-separated standard-library roots.
pub const STDLIB_PATH_ENV: &str = "CRYSTAL_PATH";

/// Set to any value to dump the computed search roots.
pub const DEBUG_ENV: &str = "CRYLS_DEBUG";

#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    root: PathBuf,
}

impl WorkspaceConfig {
    /// Build from a `root_uri` (a `file://` prefix is accepted).
    #[must_use]
    pub fn new(root_uri: &str) -> Self {
        Self {
            root: PathBuf::from(strip_file_scheme(root_uri)),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The ordered indexing roots: stdlib paths, `<root>/lib`, the root.
    #[must_use]
    pub fn search_roots(&self) -> Vec<PathBuf> {
        let mut roots = Vec::new();
        if let Ok(stdlib) = std::env::var(STDLIB_PATH_ENV) {
            for part in stdlib.split(':').filter(|part| !part.is_empty()) {
                roots.push(PathBuf::from(part));
            }
        }
        let lib = self.root.join("lib");
        if lib.is_dir() {
            roots.push(lib);
        }
        roots.push(self.root.clone());

        if std::env::var(DEBUG_ENV).is_ok() {
            for root in &roots {
                info!(root = %root.display(), "index root");
            }
        }
        roots
    }

    /// Every `.cr` file under the search roots, one walk per root.
    #[must_use]
    pub fn scan_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for root in self.search_roots() {
            for entry in WalkDir::new(&root).into_iter().filter_map(Result::ok) {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "cr") {
                    files.push(path.to_path_buf());
                }
            }
        }
        files.sort();
        files.dedup();
        files
    }
}

/// Scan and index the whole workspace. Files the parser rejects are logged
/// and skipped; previously indexed contents for them are left in place.
/// Returns the number of files indexed.
pub fn index_workspace(
    index: &mut SemanticIndex,
    config: &WorkspaceConfig,
    parser: &dyn SourceParser,
) -> usize {
    index.set_roots(
        config
            .search_roots()
            .iter()
            .map(|root| root.display().to_string())
            .collect(),
    );

    let mut indexed = 0usize;
    for path in config.scan_files() {
        let uri = format!("file://{}", path.display());
        let source = match std::fs::read_to_string(&path) {
            Ok(source) => source,
            Err(error) => {
                warn!(path = %path.display(), %error, "unreadable source file, skipping");
                continue;
            }
        };
        match parser.parse(&uri, &source) {
            Some(tree) => {
                index.index_tree_with(&uri, &tree, parser);
                indexed += 1;
            }
            None => {
                warn!(path = %path.display(), "parse failed, keeping previous index contents");
            }
        }
    }
    debug!(indexed, "workspace indexing complete");
    indexed
}

/// Re-index one document and return the other URIs whose resolution may
/// have changed: the reverse-dependency closure of the file's type names,
/// both before and after the edit.
pub fn reindex_document(
    index: &mut SemanticIndex,
    uri: &str,
    tree: &cryls_ast::node::Node,
    parser: &dyn SourceParser,
) -> Vec<String> {
    let mut affected = index.affected_files(uri);
    index.index_tree_with(uri, tree, parser);
    for uri in index.affected_files(uri) {
        if !affected.contains(&uri) {
            affected.push(uri);
        }
    }
    affected
}
