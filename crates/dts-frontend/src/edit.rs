//! Span-based text edits.
//!
//! The transformer expresses every rewrite as a list of byte-range edits
//! against the original source, applied in one pass. Edits that start
//! inside an already-applied range are dropped, so deleting a whole
//! declaration silently swallows any finer-grained rewrites queued for its
//! members.

/// A single text edit: replace `start..end` with `text`.
#[derive(Debug, Clone)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Edit {
    /// Deletes a range.
    pub fn delete(start: usize, end: usize) -> Self {
        Edit {
            start,
            end,
            text: String::new(),
        }
    }

    /// Replaces a range with new text.
    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Edit {
            start,
            end,
            text: text.into(),
        }
    }

    /// Inserts text at a position.
    pub fn insert(pos: usize, text: impl Into<String>) -> Self {
        Edit {
            start: pos,
            end: pos,
            text: text.into(),
        }
    }
}

/// Applies a list of edits to a source string.
///
/// Edits are sorted by start position (stable, so insertion order breaks
/// ties). An edit overlapping the previously applied one is skipped.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|e| e.start);

    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for edit in edits {
        if edit.start < last || edit.end > source.len() || edit.end < edit.start {
            continue;
        }
        out.push_str(&source[last..edit.start]);
        out.push_str(&edit.text);
        last = edit.end;
    }
    out.push_str(&source[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_delete_and_replace() {
        let source = "abc def ghi";
        let edits = vec![Edit::delete(3, 7), Edit::replace(8, 11, "XYZ")];
        assert_eq!(apply_edits(source, edits), "abc XYZ");
    }

    #[test]
    fn test_insert() {
        let source = "ab";
        let edits = vec![Edit::insert(1, "-")];
        assert_eq!(apply_edits(source, edits), "a-b");
    }

    #[test]
    fn test_unsorted_edits_are_ordered() {
        let source = "0123456789";
        let edits = vec![Edit::delete(6, 8), Edit::delete(0, 2)];
        assert_eq!(apply_edits(source, edits), "234589");
    }

    #[test]
    fn test_inner_edit_swallowed_by_outer_delete() {
        let source = "keep DELETE_ME keep";
        let edits = vec![
            Edit::delete(5, 15),
            // Queued against a range inside the deletion; must not resurface.
            Edit::replace(7, 9, "zz"),
        ];
        assert_eq!(apply_edits(source, edits), "keep keep");
    }

    #[test]
    fn test_out_of_bounds_edit_is_ignored() {
        let source = "short";
        let edits = vec![Edit::delete(2, 99)];
        assert_eq!(apply_edits(source, edits), "short");
    }
}
