//! Centralized limits and thresholds.
//!
//! All recursion bounds of the semantic core live here so the depth
//! discipline is auditable in one place.

/// Maximum depth of recursive macro expansion. A macro expansion may itself
/// contain macro calls; beyond this depth further calls are ignored.
pub const MAX_MACRO_EXPANSION_DEPTH: usize = 4;

/// Maximum recursion depth of best-effort type inference over call chains.
pub const MAX_INFERENCE_DEPTH: usize = 4;

/// Maximum number of alias indirections followed when resolving a type
/// reference to its owner type.
pub const MAX_ALIAS_FOLLOW: usize = 6;

/// Upper bound on ancestor-chain traversal (superclasses plus included
/// modules). Guards against pathological or cyclic hierarchies.
pub const MAX_ANCESTOR_WALK: usize = 64;
