//! Require-path completion.
//!
//! A string literal after `require` completes against the filesystem: a
//! `./`/`../` prefix is relative to the current document's directory,
//! anything else resolves against `<root>/src` when it exists, else
//! `<root>`. Directories become Folder items, `.cr` files become File
//! items.

use std::path::{Path, PathBuf};

use cryls_common::uri::strip_file_scheme;
use tracing::debug;

use crate::completion::{CompletionItem, CompletionItemKind};
use crate::workspace::WorkspaceConfig;

/// Completion items for the partial path inside a `require` string.
#[must_use]
pub fn require_path_items(
    partial: &str,
    document_uri: &str,
    workspace: &WorkspaceConfig,
) -> Vec<CompletionItem> {
    let base = if partial.starts_with("./") || partial.starts_with("../") {
        match Path::new(strip_file_scheme(document_uri)).parent() {
            Some(parent) => parent.to_path_buf(),
            None => return Vec::new(),
        }
    } else {
        let src = workspace.root().join("src");
        if src.is_dir() { src } else { workspace.root().to_path_buf() }
    };

    // Split the typed path into a directory part and a basename prefix.
    let (sub_dir, prefix) = match partial.rsplit_once('/') {
        Some((dir, prefix)) => (dir, prefix),
        None => ("", partial),
    };
    let list_dir: PathBuf = base.join(sub_dir);

    let entries = match std::fs::read_dir(&list_dir) {
        Ok(entries) => entries,
        Err(error) => {
            debug!(dir = %list_dir.display(), %error, "require-path listing failed");
            return Vec::new();
        }
    };

    let mut items = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if path.is_dir() {
            if prefix.is_empty() || name.starts_with(prefix) {
                items.push(CompletionItem::new(name, CompletionItemKind::Folder));
            }
        } else if let Some(stem) = name.strip_suffix(".cr") {
            if prefix.is_empty() || stem.starts_with(prefix) {
                items.push(CompletionItem::new(stem, CompletionItemKind::File));
            }
        }
    }
    items.sort_by(|a, b| a.label.cmp(&b.label));
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::write(path, "").expect("fixture file");
    }

    #[test]
    fn completes_from_src_when_present() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("src");
        std::fs::create_dir_all(src.join("models")).expect("dirs");
        touch(&src.join("server.cr"));
        touch(&src.join("session.cr"));
        touch(&src.join("README.md"));

        let workspace = WorkspaceConfig::new(dir.path().to_str().expect("utf8 path"));
        let items = require_path_items("se", "file:///src/main.cr", &workspace);
        let labels: Vec<&str> = items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, vec!["server", "session"]);
        assert!(items.iter().all(|item| item.kind == CompletionItemKind::File));

        let items = require_path_items("", "file:///src/main.cr", &workspace);
        let labels: Vec<&str> = items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, vec!["models", "server", "session"]);
        assert_eq!(items[0].kind, CompletionItemKind::Folder);
    }

    #[test]
    fn dotted_prefix_resolves_relative_to_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let lib = dir.path().join("lib");
        std::fs::create_dir_all(&lib).expect("dirs");
        touch(&lib.join("helper.cr"));
        touch(&dir.path().join("main.cr"));

        let workspace = WorkspaceConfig::new(dir.path().to_str().expect("utf8 path"));
        let doc = format!("file://{}/main.cr", dir.path().display());
        let items = require_path_items("./lib/hel", &doc, &workspace);
        let labels: Vec<&str> = items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, vec!["helper"]);
    }

    #[test]
    fn subdirectory_partials_list_that_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("src").join("models");
        std::fs::create_dir_all(&nested).expect("dirs");
        touch(&nested.join("user.cr"));
        touch(&nested.join("group.cr"));

        let workspace = WorkspaceConfig::new(dir.path().to_str().expect("utf8 path"));
        let items = require_path_items("models/u", "file:///x.cr", &workspace);
        let labels: Vec<&str> = items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, vec!["user"]);
    }
}
