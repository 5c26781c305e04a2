//! Module-specifier to filesystem path resolution.

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

use crate::ResolveOptions;

/// The declaration-file suffix appended to resolved specifiers.
pub const DECLARATION_SUFFIX: &str = ".d.ts";

/// Resolves a module specifier to a declaration-file path.
///
/// In order:
/// 1. a configured `map` prefix substitutes into a config-dir-relative path,
/// 2. a relative specifier (`./`, `../`) resolves against the current
///    file's directory,
/// 3. a specifier with a path separator resolves under `configDir/root`,
/// 4. a bare package-style name resolves to its conventional nested entry
///    `configDir/root/<name>/index.d.ts`.
pub fn resolve_specifier(
    specifier: &str,
    current_file: &Utf8Path,
    opts: &ResolveOptions,
) -> Utf8PathBuf {
    for (prefix, mapped) in &opts.map {
        if let Some(rest) = specifier.strip_prefix(prefix.as_str()) {
            let substituted = format!("{}{}", mapped, rest);
            return normalize(&opts.config_dir.join(with_suffix(&substituted)));
        }
    }

    if specifier.starts_with('.') {
        let dir = current_file.parent().unwrap_or(Utf8Path::new("."));
        return normalize(&dir.join(with_suffix(specifier)));
    }

    if specifier.contains('/') {
        return normalize(&opts.config_dir.join(&opts.root).join(with_suffix(specifier)));
    }

    normalize(
        &opts
            .config_dir
            .join(&opts.root)
            .join(specifier)
            .join("index.d.ts"),
    )
}

fn with_suffix(specifier: &str) -> String {
    if specifier.ends_with(DECLARATION_SUFFIX) {
        specifier.to_string()
    } else {
        format!("{}{}", specifier, DECLARATION_SUFFIX)
    }
}

/// Lexically normalizes `.` and `..` segments so the same file is always
/// identified by the same path (the cycle guard compares paths verbatim).
pub fn normalize(path: &Utf8Path) -> Utf8PathBuf {
    let mut out = Utf8PathBuf::new();
    for component in path.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn opts() -> ResolveOptions {
        ResolveOptions {
            config_dir: Utf8PathBuf::from("/proj"),
            root: Utf8PathBuf::from("src"),
            map: vec![("vs/".to_string(), "out/vs/".to_string())],
            ..Default::default()
        }
    }

    #[test]
    fn test_relative_specifier() {
        let resolved = resolve_specifier("./types", Utf8Path::new("/proj/src/index.d.ts"), &opts());
        assert_eq!(resolved, Utf8PathBuf::from("/proj/src/types.d.ts"));
    }

    #[test]
    fn test_parent_relative_specifier() {
        let resolved =
            resolve_specifier("../common/events", Utf8Path::new("/proj/src/ui/widget.d.ts"), &opts());
        assert_eq!(resolved, Utf8PathBuf::from("/proj/src/common/events.d.ts"));
    }

    #[test]
    fn test_mapped_prefix() {
        let resolved = resolve_specifier("vs/editor/core", Utf8Path::new("/proj/src/index.d.ts"), &opts());
        assert_eq!(resolved, Utf8PathBuf::from("/proj/out/vs/editor/core.d.ts"));
    }

    #[test]
    fn test_rooted_specifier_with_separator() {
        let resolved = resolve_specifier("lib/util", Utf8Path::new("/proj/src/index.d.ts"), &opts());
        assert_eq!(resolved, Utf8PathBuf::from("/proj/src/lib/util.d.ts"));
    }

    #[test]
    fn test_bare_package_name() {
        let resolved = resolve_specifier("events", Utf8Path::new("/proj/src/index.d.ts"), &opts());
        assert_eq!(resolved, Utf8PathBuf::from("/proj/src/events/index.d.ts"));
    }

    #[test]
    fn test_existing_suffix_not_doubled() {
        let resolved = resolve_specifier("./types.d.ts", Utf8Path::new("/proj/src/index.d.ts"), &opts());
        assert_eq!(resolved, Utf8PathBuf::from("/proj/src/types.d.ts"));
    }
}
