//! Resolution state: per-file collection results and the run-wide context.

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tracing::warn;

use crate::error::ResolveError;

/// Default ceiling on resolver invocations for one run.
pub const MAX_INVOCATIONS: u64 = 1_000_000;

/// Where a type mention was seen. Recorded for diagnostics only; the
/// closure logic treats all provenances alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Heritage clause (extends/implements) identifier or qualified name.
    Heritage,
    /// Direct type reference.
    TypeRef,
    /// Re-export binding.
    ReExport,
}

/// One target of a re-export declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReExportTarget {
    /// `export { Name } from '...'`.
    Named(SmolStr),
    /// `export * from '...'` — stands for whatever the caller still wants.
    Wildcard,
}

/// Everything one pass over a single file produces.
#[derive(Debug, Default)]
pub struct ResolutionState {
    /// Names still being sought in this file. `None` means "keep every
    /// public declaration".
    pub wanted: Option<Vec<SmolStr>>,
    /// Satisfied names, in discovery order, with their verbatim text.
    pub found: IndexMap<SmolStr, String>,
    /// Declarations present but not (yet) wanted; promotion candidates.
    pub extra: FxHashMap<SmolStr, String>,
    /// Every type name mentioned anywhere in the file, with a count.
    pub referenced: IndexMap<SmolStr, u32>,
    /// Container name -> type names that container directly mentions.
    pub referenced_by: IndexMap<SmolStr, Vec<SmolStr>>,
    /// Imported local name -> originating module specifier.
    pub imported: IndexMap<SmolStr, String>,
    /// Module specifier -> re-exported names (or the wildcard sentinel).
    pub recursive_targets: IndexMap<String, Vec<ReExportTarget>>,
    /// Verbatim top-level exported variable statements, deduplicated.
    pub exported_variable_statements: Vec<String>,
}

/// One memoization entry: was `name` ever resolved from this file?
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// The name was (not) found directly in the file.
    Found(bool),
    /// The name was satisfied through a re-export; the key names the
    /// child entry, whose own value is always exactly `Found(true)`.
    Redirect(String),
}

/// The accumulated kept-declaration set, in first-discovery order.
#[derive(Debug, Default)]
pub struct Master {
    entries: IndexMap<String, String>,
    seen_statements: FxHashSet<String>,
    statement_seq: u64,
}

impl Master {
    /// Inserts a named declaration. Last writer wins on the text; the
    /// first writer fixes the position. A text mismatch is logged, not
    /// fatal (accepted edge case when two files declare the same name).
    pub fn insert(&mut self, name: &str, text: &str, origin: &Utf8Path) {
        if let Some(previous) = self.entries.get(name) {
            if previous != text {
                warn!(
                    name,
                    origin = origin.as_str(),
                    "duplicate declaration with different text, last writer wins"
                );
            }
        }
        self.entries.insert(name.to_string(), text.to_string());
    }

    /// Appends an exported variable statement under a synthetic key,
    /// preserving first-discovery order and skipping exact duplicates.
    pub fn append_statement(&mut self, text: &str) {
        if !self.seen_statements.insert(text.to_string()) {
            return;
        }
        let key = format!("#statement{}", self.statement_seq);
        self.statement_seq += 1;
        self.entries.insert(key, text.to_string());
    }

    /// Whether a named declaration is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Keys in discovery order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The kept declarations, concatenated in discovery order.
    pub fn concatenated(&self) -> String {
        let mut out = String::new();
        for text in self.entries.values() {
            out.push_str(text);
            out.push('\n');
        }
        out
    }
}

/// Run-wide mutable state, threaded by reference through every resolver
/// call. No ambient globals; parallel runs never interfere.
#[derive(Debug, Default)]
pub struct RunContext {
    /// "`filepath:name`" -> memo entry. Monotonic: `Found(true)` is never
    /// overwritten, and redirects only ever replace absent/false entries.
    pub lookups: FxHashMap<String, Lookup>,
    /// The accumulated kept-declaration set.
    pub master: Master,
    pub(crate) invocations: u64,
    pub(crate) stack: Vec<Utf8PathBuf>,
}

/// The memo key for a (file, name) pair.
pub fn lookup_key(file: &Utf8Path, name: &str) -> String {
    format!("{}:{}", file, name)
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a direct found/not-found memo entry.
    pub(crate) fn record_memo(&mut self, file: &Utf8Path, name: &str, found: bool) {
        let key = lookup_key(file, name);
        match self.lookups.get(&key) {
            // Once true, never downgraded.
            Some(Lookup::Found(true)) | Some(Lookup::Redirect(_)) => {}
            _ => {
                self.lookups.insert(key, Lookup::Found(found));
            }
        }
    }

    /// Upgrades a memo entry to a redirect at `child_key`, asserting the
    /// child entry is exactly `Found(true)`. A redirect chain means the
    /// resolver itself is broken.
    pub(crate) fn record_redirect(
        &mut self,
        file: &Utf8Path,
        name: &str,
        child_key: String,
    ) -> Result<(), ResolveError> {
        match self.lookups.get(&child_key) {
            Some(Lookup::Found(true)) => {}
            other => {
                return Err(ResolveError::ConsistencyViolation {
                    detail: format!(
                        "redirect target {} is {:?}, expected Found(true)",
                        child_key, other
                    ),
                });
            }
        }
        let key = lookup_key(file, name);
        match self.lookups.get(&key) {
            Some(Lookup::Found(true)) => {}
            _ => {
                self.lookups.insert(key, Lookup::Redirect(child_key));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_master_keeps_discovery_order() {
        let mut master = Master::default();
        master.insert("A", "interface A {}", Utf8Path::new("a.d.ts"));
        master.insert("B", "interface B {}", Utf8Path::new("a.d.ts"));
        master.append_statement("export declare const VERSION: string;");
        let names: Vec<_> = master.names().collect();
        assert_eq!(names, vec!["A", "B", "#statement0"]);
    }

    #[test]
    fn test_master_last_writer_wins_keeps_position() {
        let mut master = Master::default();
        master.insert("A", "one", Utf8Path::new("a.d.ts"));
        master.insert("B", "two", Utf8Path::new("a.d.ts"));
        master.insert("A", "three", Utf8Path::new("b.d.ts"));
        assert_eq!(master.concatenated(), "three\ntwo\n");
    }

    #[test]
    fn test_master_statement_dedup() {
        let mut master = Master::default();
        master.append_statement("export declare const X: number;");
        master.append_statement("export declare const X: number;");
        assert_eq!(master.len(), 1);
    }

    #[test]
    fn test_memo_true_is_never_downgraded() {
        let mut ctx = RunContext::new();
        let file = Utf8Path::new("a.d.ts");
        ctx.record_memo(file, "T", true);
        ctx.record_memo(file, "T", false);
        assert_eq!(
            ctx.lookups.get(&lookup_key(file, "T")),
            Some(&Lookup::Found(true))
        );
    }

    #[test]
    fn test_redirect_requires_true_target() {
        let mut ctx = RunContext::new();
        let child = Utf8Path::new("x.d.ts");
        let parent = Utf8Path::new("a.d.ts");
        ctx.record_memo(child, "C", false);
        let err = ctx
            .record_redirect(parent, "C", lookup_key(child, "C"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::ConsistencyViolation { .. }));

        ctx.record_memo(child, "D", true);
        ctx.record_redirect(parent, "D", lookup_key(child, "D")).unwrap();
        assert_eq!(
            ctx.lookups.get(&lookup_key(parent, "D")),
            Some(&Lookup::Redirect(lookup_key(child, "D")))
        );
    }
}
