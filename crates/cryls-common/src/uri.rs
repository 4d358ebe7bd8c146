//! Virtual-file URIs for macro expansions.
//!
//! Macro expansions are indexed as first-class files addressed by a
//! synthetic URI of the form
//! `macro-scheme:<origin-path>/<macro-name>/<line>_<column>`, where
//! `<origin-path>` is the host file with any `file://` prefix removed.
//! These URIs go through the same index/remove lifecycle as real files.

use crate::position::Position;

/// Scheme prefix for macro-expansion virtual files.
pub const MACRO_SCHEME: &str = "macro-scheme:";

const FILE_SCHEME: &str = "file://";

/// Strip a `file://` prefix, if present.
#[must_use]
pub fn strip_file_scheme(uri: &str) -> &str {
    uri.strip_prefix(FILE_SCHEME).unwrap_or(uri)
}

/// Build the virtual URI for a macro expanded at `call_location` in `origin`.
#[must_use]
pub fn macro_expansion_uri(origin: &str, macro_name: &str, call_location: Position) -> String {
    format!(
        "{}{}/{}/{}_{}",
        MACRO_SCHEME,
        strip_file_scheme(origin),
        macro_name,
        call_location.line,
        call_location.character
    )
}

/// Whether `uri` addresses a macro-expansion virtual file.
#[must_use]
pub fn is_macro_expansion_uri(uri: &str) -> bool {
    uri.starts_with(MACRO_SCHEME)
}

/// The origin path a macro-expansion URI was derived from, if it is one.
///
/// The last two path segments (`<macro-name>/<line>_<column>`) are synthetic
/// and are stripped off.
#[must_use]
pub fn macro_expansion_origin(uri: &str) -> Option<&str> {
    let rest = uri.strip_prefix(MACRO_SCHEME)?;
    let rest = rest.rsplitn(3, '/').nth(2)?;
    Some(rest)
}
