//! The pruning walk.
//!
//! One top-down pass over the parsed module queues span edits: whole-item
//! deletions for declarations outside the public surface, line deletions
//! for dropped members, and targeted replacements for the configured
//! rewrites. Deleting an item swallows any finer edits queued inside it.

use dts_frontend::{Edit, ParsedFile, Visibility};
use swc_common::{BytePos, Span, Spanned};
use swc_ecma_ast::{
    Accessibility, ClassMember, Decl, Expr, Lit, ModuleDecl, ModuleItem, ParamOrTsParamProp, Pat,
    Stmt, TsEnumDecl, TsEntityName, TsFnParam, TsNamespaceBody, TsParamPropParam, TsType,
    TsTypeAnn, TsTypeElement,
};
use tracing::trace;

use crate::TransformOptions;

pub struct Pruner<'a> {
    file: &'a ParsedFile,
    opts: &'a TransformOptions,
    edits: Vec<Edit>,
}

/// One parameter position: its byte range and what the rewrite rules need
/// to know about it.
#[derive(Clone, Copy)]
struct ParamView<'a> {
    lo: usize,
    hi: usize,
    optional: bool,
    type_ann: Option<&'a TsTypeAnn>,
}

impl<'a> Pruner<'a> {
    pub fn new(file: &'a ParsedFile, opts: &'a TransformOptions) -> Self {
        Pruner {
            file,
            opts,
            edits: Vec::new(),
        }
    }

    pub fn run(&mut self) {
        let file = self.file;
        self.items(&file.module.body, false);
    }

    pub fn into_edits(self) -> Vec<Edit> {
        self.edits
    }

    fn items(&mut self, items: &[ModuleItem], ambient: bool) {
        for item in items {
            match item {
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                    self.decl(&export.decl, export.span, true, ambient);
                }
                ModuleItem::Stmt(Stmt::Decl(decl)) => {
                    self.decl(decl, item.span(), false, ambient);
                }
                // Leftover imports, re-exports and loose statements have no
                // place in the emitted surface.
                _ => self.delete_item(item.span()),
            }
        }
    }

    fn decl(&mut self, decl: &Decl, item_span: Span, exported: bool, ambient: bool) {
        if !self.keep_declaration(item_span, exported, ambient) {
            self.delete_item(item_span);
            return;
        }
        match decl {
            Decl::Class(class_decl) => {
                if self.opts.drop_generics.contains(class_decl.ident.sym.as_str()) {
                    if let Some(type_params) = &class_decl.class.type_params {
                        trace!(name = %class_decl.ident.sym, "dropping type parameters");
                        self.edits.push(Edit::delete(
                            self.file.lo(type_params.span),
                            self.file.hi(type_params.span),
                        ));
                    }
                }
                self.class_members(&class_decl.class.body);
            }
            Decl::TsInterface(interface) => {
                self.interface_members(&interface.body.body);
            }
            Decl::TsEnum(enum_decl) => {
                if self.opts.flatten_enums {
                    self.flatten_enum(enum_decl);
                }
            }
            Decl::TsModule(module) => {
                if let Some(body) = &module.body {
                    // The container exports its subtree implicitly.
                    self.namespace_body(body);
                }
            }
            Decl::Fn(fn_decl) => {
                let params = fn_decl
                    .function
                    .params
                    .iter()
                    .map(|p| self.pat_view(&p.pat, p.span))
                    .collect();
                self.signature(params, fn_decl.function.return_type.as_deref());
            }
            _ => {}
        }
    }

    fn namespace_body(&mut self, body: &TsNamespaceBody) {
        match body {
            TsNamespaceBody::TsModuleBlock(block) => self.items(&block.body, true),
            TsNamespaceBody::TsNamespaceDecl(nested) => self.namespace_body(&nested.body),
        }
    }

    fn keep_declaration(&self, item_span: Span, exported: bool, ambient: bool) -> bool {
        (exported || ambient) && !self.tag_excluded(item_span.lo)
    }

    fn class_members(&mut self, members: &[ClassMember]) {
        for member in members {
            match member {
                ClassMember::Constructor(ctor) => {
                    if !self.keep_member(ctor.span, ctor.accessibility) {
                        self.delete_item(ctor.span);
                        continue;
                    }
                    let params = ctor.params.iter().map(|p| self.ctor_param_view(p)).collect();
                    self.signature(params, None);
                }
                ClassMember::Method(method) => {
                    if !self.keep_member(method.span, method.accessibility) {
                        self.delete_item(method.span);
                        continue;
                    }
                    let params = method
                        .function
                        .params
                        .iter()
                        .map(|p| self.pat_view(&p.pat, p.span))
                        .collect();
                    self.signature(params, method.function.return_type.as_deref());
                }
                ClassMember::ClassProp(prop) => {
                    if !self.keep_member(prop.span, prop.accessibility) {
                        self.delete_item(prop.span);
                    }
                }
                // #-private members are never part of the public surface.
                ClassMember::PrivateMethod(method) => self.delete_item(method.span),
                ClassMember::PrivateProp(prop) => self.delete_item(prop.span),
                _ => {}
            }
        }
    }

    fn interface_members(&mut self, members: &[TsTypeElement]) {
        for member in members {
            let span = member.span();
            if self.tag_excluded(span.lo) {
                self.delete_item(span);
                continue;
            }
            match member {
                TsTypeElement::TsMethodSignature(method) => {
                    let params = method.params.iter().map(|p| self.fn_param_view(p)).collect();
                    self.signature(params, method.type_ann.as_deref());
                }
                TsTypeElement::TsGetterSignature(getter) => {
                    if let Some(type_ann) = &getter.type_ann {
                        self.convert_type(&type_ann.type_ann);
                    }
                }
                TsTypeElement::TsSetterSignature(setter) => {
                    let view = self.fn_param_view(&setter.param);
                    if let Some(type_ann) = view.type_ann {
                        self.convert_type(&type_ann.type_ann);
                    }
                }
                _ => {}
            }
        }
    }

    /// Applies the rewrite rules to one callable signature: opaque return
    /// type, trailing-optional parameter drop, opaque parameter types.
    ///
    /// Only the final parameter is ever dropped. An earlier parameter of a
    /// dropped type stays in place (and is still eligible for the opaque
    /// conversion).
    fn signature(&mut self, mut params: Vec<ParamView<'_>>, return_type: Option<&TsTypeAnn>) {
        if let Some(type_ann) = return_type {
            self.convert_type(&type_ann.type_ann);
        }
        let drop_last = params
            .last()
            .is_some_and(|last| last.optional && self.dropped_ref(last.type_ann));
        if drop_last {
            if let Some(last) = params.pop() {
                let start = params.last().map_or(last.lo, |prev| prev.hi);
                self.edits.push(Edit::delete(start, last.hi));
            }
        }
        for param in params {
            if let Some(type_ann) = param.type_ann {
                self.convert_type(&type_ann.type_ann);
            }
        }
    }

    /// Replaces a direct reference to a configured opaque type with `any`.
    fn convert_type(&mut self, ty: &TsType) {
        if let TsType::TsTypeRef(type_ref) = ty {
            if let TsEntityName::Ident(ident) = &type_ref.type_name {
                if self.opts.convert_to_any.contains(ident.sym.as_str()) {
                    self.edits.push(Edit::replace(
                        self.file.lo(type_ref.span),
                        self.file.hi(type_ref.span),
                        "any",
                    ));
                }
            }
        }
    }

    fn dropped_ref(&self, type_ann: Option<&TsTypeAnn>) -> bool {
        let Some(type_ann) = type_ann else {
            return false;
        };
        if let TsType::TsTypeRef(type_ref) = &*type_ann.type_ann {
            if let TsEntityName::Ident(ident) = &type_ref.type_name {
                return self.opts.drop_types.contains(ident.sym.as_str());
            }
        }
        false
    }

    /// Rebuilds an enum as an alias to a union of literal types. Literal
    /// initializers are kept verbatim; everything else falls back to the
    /// member's zero-based ordinal.
    fn flatten_enum(&mut self, enum_decl: &TsEnumDecl) {
        let mut literals = Vec::with_capacity(enum_decl.members.len());
        for (ordinal, member) in enum_decl.members.iter().enumerate() {
            let literal = match &member.init {
                Some(init) => match &**init {
                    Expr::Lit(Lit::Num(_)) | Expr::Lit(Lit::Str(_)) => {
                        self.file.span_text(init.span()).to_string()
                    }
                    _ => ordinal.to_string(),
                },
                None => ordinal.to_string(),
            };
            literals.push(literal);
        }
        let name = enum_decl.id.sym.as_str();
        let name = self
            .opts
            .rename_types
            .get(name)
            .map_or(name, |renamed| renamed.as_str());
        self.edits.push(Edit::replace(
            self.file.lo(enum_decl.span),
            self.file.hi(enum_decl.span),
            format!("type {} = {};", name, literals.join(" | ")),
        ));
    }

    fn keep_member(&self, span: Span, accessibility: Option<Accessibility>) -> bool {
        Visibility::from_accessibility(accessibility).is_public() && !self.tag_excluded(span.lo)
    }

    fn tag_excluded(&self, lo: BytePos) -> bool {
        self.file
            .doc_tags(lo)
            .iter()
            .any(|tag| self.opts.exclude_tags.contains(tag))
    }

    /// Deletes a whole item: its leading comments, surrounding indentation
    /// and the line break that follows it.
    fn delete_item(&mut self, span: Span) {
        let bytes = self.file.source.as_bytes();
        let mut start = self.file.item_start(span.lo);
        while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
            start -= 1;
        }
        let mut end = self.file.hi(span);
        while end < bytes.len() && matches!(bytes[end], b' ' | b'\t') {
            end += 1;
        }
        if end < bytes.len() && bytes[end] == b'\r' {
            end += 1;
        }
        if end < bytes.len() && bytes[end] == b'\n' {
            end += 1;
        }
        self.edits.push(Edit::delete(start, end));
    }

    fn pat_view<'b>(&self, pat: &'b Pat, outer: Span) -> ParamView<'b> {
        let type_ann = pat_type_ann(pat);
        ParamView {
            lo: self.file.lo(outer),
            hi: self.param_hi(outer, type_ann),
            optional: pat_optional(pat),
            type_ann,
        }
    }

    fn ctor_param_view<'b>(&self, param: &'b ParamOrTsParamProp) -> ParamView<'b> {
        match param {
            ParamOrTsParamProp::Param(param) => self.pat_view(&param.pat, param.span),
            ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                TsParamPropParam::Ident(ident) => ParamView {
                    lo: self.file.lo(prop.span),
                    hi: self.param_hi(prop.span, ident.type_ann.as_deref()),
                    optional: ident.id.optional,
                    type_ann: ident.type_ann.as_deref(),
                },
                TsParamPropParam::Assign(assign) => {
                    let type_ann = pat_type_ann(&assign.left);
                    ParamView {
                        lo: self.file.lo(prop.span),
                        hi: self.param_hi(prop.span, type_ann),
                        optional: true,
                        type_ann,
                    }
                }
            },
        }
    }

    fn fn_param_view<'b>(&self, param: &'b TsFnParam) -> ParamView<'b> {
        match param {
            TsFnParam::Ident(ident) => ParamView {
                lo: self.file.lo(ident.id.span),
                hi: self.param_hi(ident.id.span, ident.type_ann.as_deref()),
                optional: ident.id.optional,
                type_ann: ident.type_ann.as_deref(),
            },
            TsFnParam::Array(array) => ParamView {
                lo: self.file.lo(array.span),
                hi: self.param_hi(array.span, array.type_ann.as_deref()),
                optional: array.optional,
                type_ann: array.type_ann.as_deref(),
            },
            TsFnParam::Rest(rest) => ParamView {
                lo: self.file.lo(rest.span),
                hi: self.param_hi(rest.span, rest.type_ann.as_deref()),
                optional: false,
                type_ann: rest.type_ann.as_deref(),
            },
            TsFnParam::Object(object) => ParamView {
                lo: self.file.lo(object.span),
                hi: self.param_hi(object.span, object.type_ann.as_deref()),
                optional: object.optional,
                type_ann: object.type_ann.as_deref(),
            },
        }
    }

    /// End offset of a parameter, extended over its type annotation.
    fn param_hi(&self, span: Span, type_ann: Option<&TsTypeAnn>) -> usize {
        let base = self.file.hi(span);
        type_ann.map_or(base, |ann| base.max(self.file.hi(ann.span)))
    }
}

fn pat_type_ann(pat: &Pat) -> Option<&TsTypeAnn> {
    match pat {
        Pat::Ident(ident) => ident.type_ann.as_deref(),
        Pat::Array(array) => array.type_ann.as_deref(),
        Pat::Rest(rest) => rest.type_ann.as_deref(),
        Pat::Object(object) => object.type_ann.as_deref(),
        Pat::Assign(assign) => pat_type_ann(&assign.left),
        _ => None,
    }
}

fn pat_optional(pat: &Pat) -> bool {
    match pat {
        Pat::Ident(ident) => ident.id.optional,
        Pat::Array(array) => array.optional,
        Pat::Object(object) => object.optional,
        // A default value makes the parameter optional at call sites.
        Pat::Assign(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::{prune, TransformOptions};
    use pretty_assertions::assert_eq;
    use rustc_hash::{FxHashMap, FxHashSet};
    use smol_str::SmolStr;

    fn names(items: &[&str]) -> FxHashSet<SmolStr> {
        items.iter().map(|n| SmolStr::new(n)).collect()
    }

    #[test]
    fn test_non_exported_declaration_dropped() {
        let source = "export interface A {}\ninterface Hidden {}\n";
        let output = prune(source, &TransformOptions::default()).unwrap();
        assert_eq!(output, "export interface A {}\n");
    }

    #[test]
    fn test_tag_excluded_declaration_dropped_with_comment() {
        let source = "/** @internal */\nexport interface Hidden {}\nexport interface A {}\n";
        let opts = TransformOptions {
            exclude_tags: names(&["internal"]),
            ..Default::default()
        };
        assert_eq!(prune(source, &opts).unwrap(), "export interface A {}\n");
    }

    #[test]
    fn test_import_statements_removed() {
        let source = "import { B } from './b';\nexport interface A {}\n";
        let output = prune(source, &TransformOptions::default()).unwrap();
        assert_eq!(output, "export interface A {}\n");
    }

    #[test]
    fn test_namespace_members_implicitly_exported() {
        let source = concat!(
            "export declare namespace api {\n",
            "    interface Options {}\n",
            "    const version: string;\n",
            "}\n",
        );
        let output = prune(source, &TransformOptions::default()).unwrap();
        assert_eq!(output, source);
    }

    #[test]
    fn test_drop_generics_strips_type_parameters() {
        let source = "export declare class List<T> {\n    items: T[];\n}\n";
        let opts = TransformOptions {
            drop_generics: names(&["List"]),
            ..Default::default()
        };
        assert_eq!(
            prune(source, &opts).unwrap(),
            "export declare class List {\n    items: T[];\n}\n"
        );
    }

    #[test]
    fn test_flatten_enum_with_ordinal_fallback() {
        let source = "export declare enum Color {\n    Red,\n    Green = 5,\n    Blue\n}\n";
        let opts = TransformOptions {
            flatten_enums: true,
            ..Default::default()
        };
        assert_eq!(prune(source, &opts).unwrap(), "export type Color = 0 | 5 | 2;\n");
    }

    #[test]
    fn test_flatten_enum_keeps_string_literals() {
        let source = "export declare enum Mode {\n    On = \"on\",\n    Off = \"off\"\n}\n";
        let opts = TransformOptions {
            flatten_enums: true,
            ..Default::default()
        };
        assert_eq!(
            prune(source, &opts).unwrap(),
            "export type Mode = \"on\" | \"off\";\n"
        );
    }

    #[test]
    fn test_flatten_enum_keeps_leading_doc_comment() {
        let source = "/** Palette. */\nexport declare enum Color {\n    Red\n}\n";
        let opts = TransformOptions {
            flatten_enums: true,
            ..Default::default()
        };
        assert_eq!(
            prune(source, &opts).unwrap(),
            "/** Palette. */\nexport type Color = 0;\n"
        );
    }

    #[test]
    fn test_rename_applies_everywhere() {
        let source = "export interface Foo {\n    next(): Foo;\n}\n";
        let mut rename_types = FxHashMap::default();
        rename_types.insert(SmolStr::new("Foo"), SmolStr::new("Bar"));
        let opts = TransformOptions {
            rename_types,
            ..Default::default()
        };
        assert_eq!(
            prune(source, &opts).unwrap(),
            "export interface Bar {\n    next(): Bar;\n}\n"
        );
    }

    #[test]
    fn test_non_public_members_dropped() {
        let source = concat!(
            "export declare class C {\n",
            "    private secret: string;\n",
            "    protected inner(): void;\n",
            "    #hidden: number;\n",
            "    open: string;\n",
            "}\n",
        );
        let output = prune(source, &TransformOptions::default()).unwrap();
        assert_eq!(output, "export declare class C {\n    open: string;\n}\n");
    }

    #[test]
    fn test_tag_excluded_member_dropped() {
        let source = concat!(
            "export interface A {\n",
            "    kept: string;\n",
            "    /** @internal */\n",
            "    secret: string;\n",
            "}\n",
        );
        let opts = TransformOptions {
            exclude_tags: names(&["internal"]),
            ..Default::default()
        };
        assert_eq!(
            prune(source, &opts).unwrap(),
            "export interface A {\n    kept: string;\n}\n"
        );
    }

    #[test]
    fn test_convert_return_type_to_any() {
        let source = "export declare class C {\n    open(): Connection;\n}\n";
        let opts = TransformOptions {
            convert_to_any: names(&["Connection"]),
            ..Default::default()
        };
        assert_eq!(
            prune(source, &opts).unwrap(),
            "export declare class C {\n    open(): any;\n}\n"
        );
    }

    #[test]
    fn test_trailing_optional_dropped_parameter_removed() {
        let source = "export declare class C {\n    run(name: string, opts?: Internal): void;\n}\n";
        let opts = TransformOptions {
            drop_types: names(&["Internal"]),
            ..Default::default()
        };
        assert_eq!(
            prune(source, &opts).unwrap(),
            "export declare class C {\n    run(name: string): void;\n}\n"
        );
    }

    #[test]
    fn test_only_final_optional_parameter_dropped() {
        let source = "export declare class C {\n    run(a?: Internal, b?: Internal): void;\n}\n";
        let opts = TransformOptions {
            drop_types: names(&["Internal"]),
            convert_to_any: names(&["Internal"]),
            ..Default::default()
        };
        // The earlier parameter stays (converted); only the final one goes.
        assert_eq!(
            prune(source, &opts).unwrap(),
            "export declare class C {\n    run(a?: any): void;\n}\n"
        );
    }

    #[test]
    fn test_required_trailing_parameter_not_dropped() {
        let source = "export declare class C {\n    run(opts: Internal): void;\n}\n";
        let opts = TransformOptions {
            drop_types: names(&["Internal"]),
            ..Default::default()
        };
        assert_eq!(prune(source, &opts).unwrap(), source);
    }

    #[test]
    fn test_interface_method_signature_rewritten() {
        let source = concat!(
            "export interface Api {\n",
            "    open(url: string, conn?: Internal): Connection;\n",
            "}\n",
        );
        let opts = TransformOptions {
            drop_types: names(&["Internal"]),
            convert_to_any: names(&["Connection"]),
            ..Default::default()
        };
        assert_eq!(
            prune(source, &opts).unwrap(),
            "export interface Api {\n    open(url: string): any;\n}\n"
        );
    }

    #[test]
    fn test_exported_function_rewritten() {
        let source = "export declare function connect(url: string, opts?: Internal): Connection;\n";
        let opts = TransformOptions {
            drop_types: names(&["Internal"]),
            convert_to_any: names(&["Connection"]),
            ..Default::default()
        };
        assert_eq!(
            prune(source, &opts).unwrap(),
            "export declare function connect(url: string): any;\n"
        );
    }

    #[test]
    fn test_namespace_variable_statement_tag_excluded() {
        let source = concat!(
            "export declare namespace api {\n",
            "    /** @internal */\n",
            "    const secret: string;\n",
            "    const version: string;\n",
            "}\n",
        );
        let opts = TransformOptions {
            exclude_tags: names(&["internal"]),
            ..Default::default()
        };
        assert_eq!(
            prune(source, &opts).unwrap(),
            "export declare namespace api {\n    const version: string;\n}\n"
        );
    }

    #[test]
    fn test_parameter_converted_to_any_keeps_optionality() {
        let source = "export declare function wrap(conn?: Connection): void;\n";
        let opts = TransformOptions {
            convert_to_any: names(&["Connection"]),
            ..Default::default()
        };
        assert_eq!(
            prune(source, &opts).unwrap(),
            "export declare function wrap(conn?: any): void;\n"
        );
    }
}
