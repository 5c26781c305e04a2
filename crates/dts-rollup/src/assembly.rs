//! Final text assembly.
//!
//! Concatenates the configured include files, prepends the version banner
//! and applies two cosmetic passes to the pruned declaration text before it
//! is written out.

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use thiserror::Error;

/// Assembly errors.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("invalid package manifest {path}: {source}")]
    Package {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    name: Option<String>,
    version: Option<String>,
}

/// Builds the version banner from a package manifest, truncating the
/// version's trailing patch component ("1.2.3" -> "1.2").
pub fn version_banner(package: &Utf8Path) -> Result<Option<String>, AssemblyError> {
    let content = fs::read_to_string(package).map_err(|source| AssemblyError::Io {
        path: package.to_owned(),
        source,
    })?;
    let manifest: PackageManifest =
        serde_json::from_str(&content).map_err(|source| AssemblyError::Package {
            path: package.to_owned(),
            source,
        })?;
    let Some(version) = manifest.version else {
        return Ok(None);
    };
    let truncated = version
        .rsplit_once('.')
        .map_or(version.as_str(), |(head, _)| head);
    let banner = match manifest.name {
        Some(name) if !name.is_empty() => format!("/*! {} v{} */\n", name, truncated),
        _ => format!("/*! v{} */\n", truncated),
    };
    Ok(Some(banner))
}

/// Concatenates includes, banner and the cleaned-up declaration text.
pub fn assemble(
    includes: &[Utf8PathBuf],
    banner: Option<&str>,
    pruned: &str,
) -> Result<String, AssemblyError> {
    let mut out = String::new();
    for path in includes {
        let text = fs::read_to_string(path).map_err(|source| AssemblyError::Io {
            path: path.clone(),
            source,
        })?;
        out.push_str(&text);
        if !text.ends_with('\n') {
            out.push('\n');
        }
    }
    if let Some(banner) = banner {
        out.push_str(banner);
    }
    out.push_str(&cleanup(pruned));
    Ok(out)
}

/// The two cosmetic passes over the pruned text.
fn cleanup(text: &str) -> String {
    // A doc comment the splicer left directly after code on the same line
    // moves to its own line.
    let inline_comment = Regex::new(r"(\S)[ \t]*(/\*\*)").unwrap();
    let text = inline_comment.replace_all(text, "$1\n$2");

    // Strip @privateRemarks blocks: from the tag's line up to the next tag
    // line or the comment's close.
    let private_remarks =
        Regex::new(r"(?ms)^[ \t]*\*[ \t]*@privateRemarks\b.*?(^[ \t]*\*[ \t]*@|^[ \t]*\*/)")
            .unwrap();
    let text = private_remarks.replace_all(&text, "$1");

    // Collapse an empty comment continuation line left before the close.
    let empty_close = Regex::new(r"(?m)^[ \t]*\*[ \t]*\n([ \t]*\*/)").unwrap();
    empty_close.replace_all(&text, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_version_banner_truncates_patch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, r#"{"name": "mylib", "version": "1.2.3"}"#).unwrap();
        let path = Utf8PathBuf::from_path_buf(path).unwrap();
        assert_eq!(
            version_banner(&path).unwrap().as_deref(),
            Some("/*! mylib v1.2 */\n")
        );
    }

    #[test]
    fn test_version_banner_absent_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        std::fs::write(&path, r#"{"name": "mylib"}"#).unwrap();
        let path = Utf8PathBuf::from_path_buf(path).unwrap();
        assert_eq!(version_banner(&path).unwrap(), None);
    }

    #[test]
    fn test_inline_comment_moved_to_own_line() {
        let text = "export interface A {} /** docs */\n";
        assert_eq!(cleanup(text), "export interface A {}\n/** docs */\n");
    }

    #[test]
    fn test_comment_already_on_own_line_untouched() {
        let text = "export interface A {}\n/** docs */\nexport interface B {}\n";
        assert_eq!(cleanup(text), text);
    }

    #[test]
    fn test_private_remarks_block_stripped() {
        let text = concat!(
            "/**\n",
            " * Public summary.\n",
            " * @privateRemarks\n",
            " * Internal notes, not for the rollup.\n",
            " * @since 1.0\n",
            " */\n",
        );
        let expected = concat!(
            "/**\n",
            " * Public summary.\n",
            " * @since 1.0\n",
            " */\n",
        );
        assert_eq!(cleanup(text), expected);
    }

    #[test]
    fn test_private_remarks_before_close_collapses() {
        let text = concat!(
            "/**\n",
            " * Public summary.\n",
            " * @privateRemarks internal only\n",
            " */\n",
        );
        let expected = concat!("/**\n", " * Public summary.\n", " */\n");
        assert_eq!(cleanup(text), expected);
    }

    #[test]
    fn test_assemble_orders_includes_banner_body() {
        let dir = tempfile::tempdir().unwrap();
        let include = dir.path().join("header.d.ts");
        std::fs::write(&include, "// prelude").unwrap();
        let include = Utf8PathBuf::from_path_buf(include).unwrap();
        let out = assemble(
            &[include],
            Some("/*! v1.2 */\n"),
            "export interface A {}\n",
        )
        .unwrap();
        assert_eq!(out, "// prelude\n/*! v1.2 */\nexport interface A {}\n");
    }
}
