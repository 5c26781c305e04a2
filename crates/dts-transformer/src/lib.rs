//! Declaration pruning and rewriting.
//!
//! The transformer runs once over the concatenated, re-parsed resolver
//! output. It drops everything the public surface cannot reach (private
//! members, non-exported declarations, tag-excluded nodes) and applies the
//! configured rewrites: generic-parameter removal, enum flattening, type
//! renames and opaque `any` conversion.
//!
//! All rewrites are expressed as span edits against the input text, so
//! whatever survives is emitted byte-identical to its authored form.

mod prune;
mod rename;

use dts_frontend::{apply_edits, parse_dts, FrontendError};
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use thiserror::Error;

pub use prune::Pruner;

/// Transformer configuration, carved out of the run configuration.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Names whose trailing-optional parameter occurrences are deleted.
    pub drop_types: FxHashSet<SmolStr>,
    /// Names replaced with the opaque `any` type in parameter and return
    /// positions.
    pub convert_to_any: FxHashSet<SmolStr>,
    /// Annotation tags that mark a declaration or member as excluded.
    pub exclude_tags: FxHashSet<SmolStr>,
    /// Class names stripped of their type-parameter lists.
    pub drop_generics: FxHashSet<SmolStr>,
    /// Identifier renames, applied everywhere an identifier matches.
    pub rename_types: FxHashMap<SmolStr, SmolStr>,
    /// Rewrite enums as aliases to unions of literal types.
    pub flatten_enums: bool,
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error(transparent)]
    Frontend(#[from] FrontendError),
}

/// Prunes and rewrites a declaration text.
///
/// The input is expected to be self-contained (no imports left to chase);
/// import and re-export statements that still appear are deleted.
pub fn prune(source: &str, opts: &TransformOptions) -> Result<String, TransformError> {
    let file = parse_dts(source, "master.d.ts")?;
    let mut pruner = Pruner::new(&file, opts);
    pruner.run();
    let mut edits = pruner.into_edits();
    rename::collect_renames(&file, opts, &mut edits);
    Ok(apply_edits(source, edits))
}
