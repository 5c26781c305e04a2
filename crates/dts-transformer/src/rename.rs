//! Identifier renaming.
//!
//! Renames are queued after the pruning walk, so a rename inside a deleted
//! or replaced range is swallowed by the earlier edit.

use dts_frontend::{Edit, ParsedFile};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use swc_ecma_ast::Ident;
use swc_ecma_visit::{Visit, VisitWith};

use crate::TransformOptions;

struct Renamer<'a> {
    file: &'a ParsedFile,
    renames: &'a FxHashMap<SmolStr, SmolStr>,
    edits: &'a mut Vec<Edit>,
}

impl Visit for Renamer<'_> {
    fn visit_ident(&mut self, ident: &Ident) {
        if let Some(renamed) = self.renames.get(ident.sym.as_str()) {
            self.edits.push(Edit::replace(
                self.file.lo(ident.span),
                self.file.hi(ident.span),
                renamed.as_str(),
            ));
        }
    }
}

/// Queues a replacement edit for every identifier matching a rename key.
pub(crate) fn collect_renames(file: &ParsedFile, opts: &TransformOptions, edits: &mut Vec<Edit>) {
    if opts.rename_types.is_empty() {
        return;
    }
    let mut renamer = Renamer {
        file,
        renames: &opts.rename_types,
        edits,
    };
    file.module.visit_with(&mut renamer);
}
