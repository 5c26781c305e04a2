//! Configuration loading.

use camino::{Utf8Path, Utf8PathBuf};
use dts_resolver::ResolveOptions;
use dts_transformer::TransformOptions;
use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::Deserialize;
use smol_str::SmolStr;
use std::fs;
use thiserror::Error;

/// The rollup configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RollupConfig {
    /// Source root containing the declaration tree.
    pub root: Utf8PathBuf,

    /// Entry declaration file, relative to `root`.
    pub index: Utf8PathBuf,

    /// Output file path.
    pub output: Utf8PathBuf,

    /// Package manifest supplying the version banner.
    pub package: Option<Utf8PathBuf>,

    /// Names deleted outright.
    pub drop_types: Vec<String>,

    /// Names replaced with the opaque `any` type.
    pub convert_to_any: Vec<String>,

    /// Annotation tags marking declarations and members as excluded.
    pub exclude_tags: Vec<String>,

    /// Class names stripped of their type-parameter lists.
    pub drop_generics: Vec<String>,

    /// Identifier renames.
    pub rename_types: IndexMap<String, String>,

    /// Files prepended verbatim to the output.
    pub include: Vec<Utf8PathBuf>,

    /// Module-specifier prefix remaps, in declaration order.
    pub map: IndexMap<String, String>,

    /// Rewrite enums as aliases to unions of literal types.
    pub flatten_enums: bool,
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },
}

impl RollupConfig {
    /// Loads a configuration document, tolerating JSON comments.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let content = remove_json_comments(&content);
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// The entry declaration file.
    pub fn entry(&self, config_dir: &Utf8Path) -> Utf8PathBuf {
        config_dir.join(&self.root).join(&self.index)
    }

    pub fn resolve_options(&self, config_dir: &Utf8Path) -> ResolveOptions {
        ResolveOptions {
            config_dir: config_dir.to_owned(),
            root: self.root.clone(),
            map: self
                .map
                .iter()
                .map(|(prefix, target)| (prefix.clone(), target.clone()))
                .collect(),
            drop_types: to_names(&self.drop_types),
            convert_to_any: to_names(&self.convert_to_any),
            exclude_tags: to_names(&self.exclude_tags),
            ..Default::default()
        }
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            drop_types: to_names(&self.drop_types),
            convert_to_any: to_names(&self.convert_to_any),
            exclude_tags: to_names(&self.exclude_tags),
            drop_generics: to_names(&self.drop_generics),
            rename_types: self
                .rename_types
                .iter()
                .map(|(from, to)| (SmolStr::new(from), SmolStr::new(to)))
                .collect(),
            flatten_enums: self.flatten_enums,
        }
    }
}

fn to_names(names: &[String]) -> FxHashSet<SmolStr> {
    names.iter().map(|name| SmolStr::new(name)).collect()
}

/// Removes single-line and multi-line comments from JSON. String contents
/// are left untouched.
fn remove_json_comments(json: &str) -> String {
    let mut result = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '"' {
                in_string = false;
            } else if c == '\\' {
                if let Some(escaped) = chars.next() {
                    result.push(escaped);
                }
            }
        } else if c == '"' {
            result.push(c);
            in_string = true;
        } else if c == '/' && chars.peek() == Some(&'/') {
            while let Some(&next) = chars.peek() {
                if next == '\n' {
                    break;
                }
                chars.next();
            }
        } else if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            while let Some(next) = chars.next() {
                if next == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}
