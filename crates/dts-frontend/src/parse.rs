//! Declaration parsing and span/text mapping.

use crate::error::FrontendError;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use std::sync::Arc;
use swc_common::comments::{Comment, CommentKind, Comments, SingleThreadedComments};
use swc_common::{BytePos, FileName, SourceMap, Span};
use swc_ecma_ast::{EsVersion, Module};
use swc_ecma_parser::{parse_file_as_module, Syntax, TsSyntax};

/// A parsed declaration file together with everything needed to map swc
/// spans back onto the original source text.
#[derive(Debug)]
pub struct ParsedFile {
    /// The identity the file was parsed under (usually its path).
    pub file_name: String,
    /// The verbatim source text.
    pub source: String,
    /// The parsed module tree.
    pub module: Module,
    comments: SingleThreadedComments,
    /// Byte position the source map assigned to the first byte of the file.
    base: usize,
}

/// Parses TypeScript declaration text.
///
/// Comments are retained so that documentation tags (`@internal` and
/// friends) stay queryable per node.
pub fn parse_dts(source: &str, file_name: &str) -> Result<ParsedFile, FrontendError> {
    let cm: Arc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        FileName::Custom(file_name.to_string()).into(),
        source.to_string(),
    );
    let comments = SingleThreadedComments::default();

    let syntax = Syntax::Typescript(TsSyntax {
        dts: true,
        ..Default::default()
    });

    let module = parse_file_as_module(
        &fm,
        syntax,
        EsVersion::Es2022,
        Some(&comments),
        &mut Vec::new(),
    )
    .map_err(|e| FrontendError::Parse {
        file: file_name.to_string(),
        message: format!("{:?}", e),
    })?;

    Ok(ParsedFile {
        file_name: file_name.to_string(),
        source: source.to_string(),
        module,
        comments,
        base: fm.start_pos.0 as usize,
    })
}

impl ParsedFile {
    /// Converts a span start to a byte offset into `source`.
    pub fn lo(&self, span: Span) -> usize {
        self.pos(span.lo)
    }

    /// Converts a span end to a byte offset into `source`.
    pub fn hi(&self, span: Span) -> usize {
        self.pos(span.hi)
    }

    /// Converts a raw byte position to an offset into `source`.
    pub fn pos(&self, p: BytePos) -> usize {
        (p.0 as usize).saturating_sub(self.base)
    }

    /// The verbatim text covered by a span.
    pub fn span_text(&self, span: Span) -> &str {
        &self.source[self.lo(span)..self.hi(span)]
    }

    /// The comments attached immediately before a node position.
    pub fn leading_comments(&self, lo: BytePos) -> Vec<Comment> {
        self.comments.get_leading(lo).unwrap_or_default()
    }

    /// Start offset of a node, extended backwards over its leading comments.
    pub fn item_start(&self, lo: BytePos) -> usize {
        let node_start = self.pos(lo);
        self.leading_comments(lo)
            .iter()
            .map(|c| self.pos(c.span.lo))
            .min()
            .map_or(node_start, |s| s.min(node_start))
    }

    /// Verbatim text of a node including its leading comments.
    pub fn full_text(&self, span: Span) -> &str {
        &self.source[self.item_start(span.lo)..self.hi(span)]
    }

    /// Documentation tags (`@foo` markers) from a node's leading doc
    /// comments, without the `@`.
    pub fn doc_tags(&self, lo: BytePos) -> FxHashSet<SmolStr> {
        let mut tags = FxHashSet::default();
        for comment in self.leading_comments(lo) {
            if comment.kind != CommentKind::Block {
                continue;
            }
            collect_tags(&comment.text, &mut tags);
        }
        tags
    }

    /// The last leading block doc comment of a node, reconstructed as text.
    pub fn leading_doc_comment(&self, lo: BytePos) -> Option<String> {
        self.leading_comments(lo)
            .iter()
            .rev()
            .find(|c| c.kind == CommentKind::Block && c.text.starts_with('*'))
            .map(|c| format!("/*{}*/", c.text))
    }
}

/// Scans comment text for `@tag` markers.
fn collect_tags(text: &str, tags: &mut FxHashSet<SmolStr>) {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'@' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len()
                && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
            {
                end += 1;
            }
            if end > start {
                tags.insert(SmolStr::new(&text[start..end]));
            }
            i = end;
        } else {
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use swc_ecma_ast::{Decl, ModuleDecl, ModuleItem};

    #[test]
    fn test_parse_simple_interface() {
        let parsed = parse_dts("export interface A { b: string; }", "a.d.ts").unwrap();
        assert_eq!(parsed.module.body.len(), 1);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = parse_dts("export interface {", "bad.d.ts").unwrap_err();
        assert!(matches!(err, FrontendError::Parse { .. }));
    }

    #[test]
    fn test_span_text_roundtrip() {
        let source = "export interface A { b: string; }";
        let parsed = parse_dts(source, "a.d.ts").unwrap();
        let item = &parsed.module.body[0];
        if let ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) = item {
            assert_eq!(parsed.span_text(export.span), source);
        } else {
            panic!("expected export decl");
        }
    }

    #[test]
    fn test_doc_tags() {
        let source = "/** docs\n * @internal\n * @deprecated use X\n */\nexport interface A {}";
        let parsed = parse_dts(source, "a.d.ts").unwrap();
        if let ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) = &parsed.module.body[0] {
            let tags = parsed.doc_tags(export.span.lo);
            assert!(tags.contains("internal"));
            assert!(tags.contains("deprecated"));
            assert!(!tags.contains("public"));
        } else {
            panic!("expected export decl");
        }
    }

    #[test]
    fn test_full_text_includes_leading_comment() {
        let source = "/** docs */\nexport interface A {}";
        let parsed = parse_dts(source, "a.d.ts").unwrap();
        if let ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) = &parsed.module.body[0] {
            assert_eq!(parsed.full_text(export.span), source);
        } else {
            panic!("expected export decl");
        }
    }

    #[test]
    fn test_leading_doc_comment_picks_last_block() {
        let source = "// line\n/** kept */\nexport type T = string;";
        let parsed = parse_dts(source, "t.d.ts").unwrap();
        if let ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) = &parsed.module.body[0] {
            assert_eq!(
                parsed.leading_doc_comment(export.span.lo).as_deref(),
                Some("/** kept */")
            );
            assert!(matches!(export.decl, Decl::TsTypeAlias(_)));
        } else {
            panic!("expected export decl");
        }
    }
}
