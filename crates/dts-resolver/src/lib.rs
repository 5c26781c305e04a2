//! Transitive dependency resolver for declaration-file rollups.
//!
//! Given an entry declaration file (and optionally a specific set of wanted
//! type names), the resolver computes the transitive closure of declarations
//! that must be kept, crossing file boundaries through named imports and
//! re-exports while pruning everything unreachable from the wanted set.
//!
//! The traversal is depth-first and synchronous; every recursive call fully
//! completes before control returns, so run-wide state lives in a single
//! [`RunContext`] threaded by reference. Termination is guaranteed by a
//! cycle guard on the active file stack and a hard invocation ceiling.

mod collect;
mod error;
mod globals;
mod paths;
mod state;

pub use error::ResolveError;
pub use paths::{normalize, resolve_specifier, DECLARATION_SUFFIX};
pub use state::{lookup_key, Lookup, Master, Provenance, ReExportTarget, RunContext, MAX_INVOCATIONS};

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use state::ResolutionState;
use std::fs;
use tracing::debug;

/// Resolver configuration, carved out of the run configuration.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Directory of the configuration document; all mapped paths resolve
    /// against it.
    pub config_dir: Utf8PathBuf,
    /// Source root, relative to `config_dir`.
    pub root: Utf8PathBuf,
    /// Module-specifier prefix -> filesystem path remaps, in order.
    pub map: Vec<(String, String)>,
    /// Names deleted outright; never kept, never chased.
    pub drop_types: FxHashSet<SmolStr>,
    /// Names converted to opaque `any`; never kept, never chased.
    pub convert_to_any: FxHashSet<SmolStr>,
    /// Annotation tags that mark a declaration or member as excluded.
    pub exclude_tags: FxHashSet<SmolStr>,
    /// Hard ceiling on resolver invocations for one run.
    pub invocation_ceiling: u64,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            config_dir: Utf8PathBuf::default(),
            root: Utf8PathBuf::default(),
            map: Vec::new(),
            drop_types: FxHashSet::default(),
            convert_to_any: FxHashSet::default(),
            exclude_tags: FxHashSet::default(),
            invocation_ceiling: MAX_INVOCATIONS,
        }
    }
}

/// The result of a targeted resolution, for callers that want to inspect
/// the memo table as well as the accumulated declarations.
#[derive(Debug)]
pub struct ResolveOutcome {
    pub master: Master,
    pub lookups: FxHashMap<String, Lookup>,
}

/// Collects every exported, non-excluded declaration reachable from `entry`.
pub fn resolve_entry(entry: &Utf8Path, opts: &ResolveOptions) -> Result<Master, ResolveError> {
    Ok(resolve_file(entry, None, opts)?.master)
}

/// Resolves `entry`, optionally restricted to a wanted name set.
pub fn resolve_file(
    entry: &Utf8Path,
    wanted: Option<&[&str]>,
    opts: &ResolveOptions,
) -> Result<ResolveOutcome, ResolveError> {
    let mut ctx = RunContext::new();
    let wanted = wanted.map(|names| names.iter().map(|n| SmolStr::new(n)).collect());
    resolve(&mut ctx, &paths::normalize(entry), wanted, 0, opts)?;
    Ok(ResolveOutcome {
        master: ctx.master,
        lookups: ctx.lookups,
    })
}

/// One resolver invocation over one file.
fn resolve(
    ctx: &mut RunContext,
    file: &Utf8Path,
    wanted: Option<Vec<SmolStr>>,
    depth: usize,
    opts: &ResolveOptions,
) -> Result<ResolutionState, ResolveError> {
    if ctx.stack.iter().any(|f| f == file) {
        return Err(ResolveError::CircularDependency {
            path: file.to_owned(),
            stack: ctx.stack.clone(),
        });
    }
    ctx.invocations += 1;
    if ctx.invocations > opts.invocation_ceiling {
        return Err(ResolveError::RunawayRecursion {
            limit: opts.invocation_ceiling,
        });
    }

    ctx.stack.push(file.to_owned());
    let result = resolve_in_file(ctx, file, wanted, depth, opts);
    ctx.stack.pop();
    result
}

fn resolve_in_file(
    ctx: &mut RunContext,
    file: &Utf8Path,
    wanted: Option<Vec<SmolStr>>,
    depth: usize,
    opts: &ResolveOptions,
) -> Result<ResolutionState, ResolveError> {
    debug!(file = %file, depth, wanted = ?wanted, "resolving");

    let source = fs::read_to_string(file).map_err(|e| ResolveError::Io {
        path: file.to_owned(),
        source: e,
    })?;
    let parsed = dts_frontend::parse_dts(&source, file.as_str())?;

    let original_wanted = wanted.clone();
    let mut state = collect::collect(&parsed, opts, wanted)?;

    // Containment-closure filter: with a wanted set, a referenced name only
    // survives if it is wanted itself or some container that (transitively)
    // mentions it is wanted. This keeps an unrelated subgraph from riding in
    // on a name collision.
    let surviving: Vec<SmolStr> = match &original_wanted {
        None => state.referenced.keys().cloned().collect(),
        Some(wanted) => {
            let wanted_set: FxHashSet<&SmolStr> = wanted.iter().collect();
            state
                .referenced
                .keys()
                .filter(|name| {
                    wanted_set.contains(name)
                        || resolve_containing_types(name, &state.referenced_by)
                            .iter()
                            .any(|container| wanted_set.contains(container))
                })
                .cloned()
                .collect()
        }
    };

    // Promotion: surviving names already present in this file move to found.
    for name in &surviving {
        if state.found.contains_key(name) {
            continue;
        }
        if let Some(text) = state.extra.remove(name) {
            state.found.insert(name.clone(), text);
            ctx.record_memo(file, name, true);
        }
    }

    // Every found name is memoized true so a caller's re-export of it can
    // redirect here; originally wanted names that stayed unfound are
    // memoized false.
    for name in state.found.keys() {
        ctx.record_memo(file, name, true);
    }
    if let Some(wanted) = &original_wanted {
        for name in wanted {
            if !state.found.contains_key(name) {
                ctx.record_memo(file, name, false);
            }
        }
    }

    // Accumulate before recursing so discovery order is parent-first.
    for (name, text) in &state.found {
        ctx.master.insert(name, text, file);
    }
    for text in &state.exported_variable_statements {
        ctx.master.append_statement(text);
    }

    resolve_reexports(ctx, file, &state, &original_wanted, depth, opts)?;
    resolve_imports(ctx, file, &state, &surviving, depth, opts)?;

    Ok(state)
}

/// Walks `referenced_by` backwards from `name`, collecting every container
/// that directly or transitively mentions it (reflexive).
fn resolve_containing_types(
    name: &SmolStr,
    referenced_by: &IndexMap<SmolStr, Vec<SmolStr>>,
) -> FxHashSet<SmolStr> {
    let mut result: FxHashSet<SmolStr> = FxHashSet::default();
    result.insert(name.clone());
    let mut queue = vec![name.clone()];
    while let Some(current) = queue.pop() {
        for (container, mentions) in referenced_by {
            if mentions.contains(&current) && result.insert(container.clone()) {
                queue.push(container.clone());
            }
        }
    }
    result
}

/// Follows `export ... from` targets one level deeper.
fn resolve_reexports(
    ctx: &mut RunContext,
    file: &Utf8Path,
    state: &ResolutionState,
    original_wanted: &Option<Vec<SmolStr>>,
    depth: usize,
    opts: &ResolveOptions,
) -> Result<(), ResolveError> {
    let mut outstanding: Option<Vec<SmolStr>> = original_wanted.as_ref().map(|wanted| {
        wanted
            .iter()
            .filter(|name| !state.found.contains_key(*name))
            .cloned()
            .collect()
    });

    for (specifier, targets) in &state.recursive_targets {
        if let Some(outstanding) = &outstanding {
            if outstanding.is_empty() {
                break;
            }
        }
        let target_path = paths::resolve_specifier(specifier, file, opts);

        // Expand targets into a request list; wildcard stands for whatever
        // the caller is still missing.
        let request: Option<Vec<SmolStr>> = match &outstanding {
            Some(missing) => {
                let mut request: Vec<SmolStr> = Vec::new();
                for target in targets {
                    match target {
                        ReExportTarget::Named(name) => {
                            if missing.contains(name) && !request.contains(name) {
                                request.push(name.clone());
                            }
                        }
                        ReExportTarget::Wildcard => {
                            for name in missing {
                                if !request.contains(name) {
                                    request.push(name.clone());
                                }
                            }
                        }
                    }
                }
                Some(request)
            }
            None => {
                if targets.iter().any(|t| *t == ReExportTarget::Wildcard) {
                    None
                } else {
                    let mut request: Vec<SmolStr> = Vec::new();
                    for target in targets {
                        if let ReExportTarget::Named(name) = target {
                            if !request.contains(name) {
                                request.push(name.clone());
                            }
                        }
                    }
                    Some(request)
                }
            }
        };

        // Drop names already memoized for the target path.
        let request = request.map(|names| {
            names
                .into_iter()
                .filter(|name| !ctx.lookups.contains_key(&lookup_key(&target_path, name)))
                .collect::<Vec<_>>()
        });
        if let Some(request) = &request {
            if request.is_empty() {
                continue;
            }
        }

        let asked = request.clone();
        let child = resolve(ctx, &target_path, request, depth + 1, opts)?;

        let satisfied: Vec<SmolStr> = match asked {
            Some(asked) => asked
                .into_iter()
                .filter(|name| child.found.contains_key(name))
                .collect(),
            None => child.found.keys().cloned().collect(),
        };
        for name in satisfied {
            ctx.record_redirect(file, &name, lookup_key(&target_path, &name))?;
            if let Some(outstanding) = &mut outstanding {
                outstanding.retain(|n| n != &name);
            }
        }
    }
    Ok(())
}

/// Chases referenced-but-unfound names through their named imports. These
/// are hard prerequisites of kept declarations, so there is no filtering
/// and no early exit.
fn resolve_imports(
    ctx: &mut RunContext,
    file: &Utf8Path,
    state: &ResolutionState,
    surviving: &[SmolStr],
    depth: usize,
    opts: &ResolveOptions,
) -> Result<(), ResolveError> {
    let mut by_source: IndexMap<&str, Vec<SmolStr>> = IndexMap::new();
    for name in surviving {
        if state.found.contains_key(name) || state.extra.contains_key(name) {
            continue;
        }
        // Dropped and opaque names are never chased.
        if opts.drop_types.contains(name) || opts.convert_to_any.contains(name) {
            continue;
        }
        if let Some(specifier) = state.imported.get(name) {
            let group = by_source.entry(specifier.as_str()).or_default();
            if !group.contains(name) {
                group.push(name.clone());
            }
        } else if !globals::is_known_global(name) {
            debug!(file = %file, name = %name, "unresolved type reference, skipping");
        }
    }

    for (specifier, names) in by_source {
        let target_path = paths::resolve_specifier(specifier, file, opts);
        let request: Vec<SmolStr> = names
            .into_iter()
            .filter(|name| !ctx.lookups.contains_key(&lookup_key(&target_path, name)))
            .collect();
        if request.is_empty() {
            continue;
        }
        resolve(ctx, &target_path, Some(request), depth + 1, opts)?;
    }
    Ok(())
}
