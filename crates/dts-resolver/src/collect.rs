//! Per-file collection pass.
//!
//! One pass over a parsed declaration file fills a [`ResolutionState`]:
//! declarations kept or set aside, every type name mentioned (and by which
//! container), named imports, and re-export targets. Excluded declarations
//! and members are pruned before any reference inside them is seen.

use camino::Utf8PathBuf;
use dts_frontend::{
    entity_head, heritage_head, module_name_text, FrontendError, ParsedFile, Visibility,
};
use smol_str::SmolStr;
use swc_common::{Span, Spanned};
use swc_ecma_ast::{
    Accessibility, Class, ClassMember, Decl, ExportSpecifier, ImportDecl, ImportSpecifier,
    ModuleDecl, ModuleExportName, ModuleItem, NamedExport, Stmt, Str, TsExprWithTypeArgs,
    TsNamespaceBody, TsTypeElement, TsTypeRef, VarDecl,
};
use swc_ecma_visit::{Visit, VisitWith};
use tracing::trace;

use crate::error::ResolveError;
use crate::state::{Provenance, ReExportTarget, ResolutionState};
use crate::ResolveOptions;

/// Runs the collection pass over one parsed file.
pub(crate) fn collect(
    file: &ParsedFile,
    opts: &ResolveOptions,
    wanted: Option<Vec<SmolStr>>,
) -> Result<ResolutionState, ResolveError> {
    let mut collector = Collector {
        file,
        opts,
        state: ResolutionState {
            wanted,
            ..Default::default()
        },
        containers: Vec::new(),
        error: None,
    };
    collector.module_items(&file.module.body, false);
    match collector.error {
        Some(error) => Err(error),
        None => Ok(collector.state),
    }
}

struct Collector<'a> {
    file: &'a ParsedFile,
    opts: &'a ResolveOptions,
    state: ResolutionState,
    containers: Vec<SmolStr>,
    error: Option<ResolveError>,
}

impl<'a> Collector<'a> {
    fn module_items(&mut self, items: &[ModuleItem], ambient: bool) {
        for item in items {
            match item {
                ModuleItem::ModuleDecl(decl) => self.module_decl(decl, item.span(), ambient),
                ModuleItem::Stmt(Stmt::Decl(decl)) => self.decl(decl, item.span(), false, ambient),
                ModuleItem::Stmt(_) => {}
            }
        }
    }

    fn module_decl(&mut self, decl: &ModuleDecl, span: Span, ambient: bool) {
        match decl {
            ModuleDecl::Import(import) => self.import_decl(import),
            ModuleDecl::ExportNamed(named) => self.named_export(named),
            ModuleDecl::ExportAll(all) => {
                self.state
                    .recursive_targets
                    .entry(str_value(&all.src))
                    .or_default()
                    .push(ReExportTarget::Wildcard);
            }
            ModuleDecl::ExportDecl(export) => self.decl(&export.decl, span, true, ambient),
            _ => {}
        }
    }

    /// Named imports map a local name to its originating module.
    fn import_decl(&mut self, import: &ImportDecl) {
        for specifier in &import.specifiers {
            if let ImportSpecifier::Named(named) = specifier {
                self.state
                    .imported
                    .insert(SmolStr::new(&named.local.sym), str_value(&import.src));
            }
        }
    }

    fn named_export(&mut self, named: &NamedExport) {
        let src = named.src.as_ref().map(|s| str_value(s));
        for specifier in &named.specifiers {
            if let ExportSpecifier::Named(export) = specifier {
                let name = export_name(&export.orig);
                if let Some(specifier) = &src {
                    self.state
                        .recursive_targets
                        .entry(specifier.clone())
                        .or_default()
                        .push(ReExportTarget::Named(name.clone()));
                }
                self.record_reference(&name, Provenance::ReExport);
            }
        }
    }

    fn decl(&mut self, decl: &Decl, item_span: Span, exported: bool, ambient: bool) {
        match decl {
            Decl::Class(class_decl) => {
                let name = SmolStr::new(&class_decl.ident.sym);
                if self.keep_declaration(&name, item_span, exported, ambient) {
                    self.containers.push(name);
                    self.class_heritage(&class_decl.class);
                    self.class_members(&class_decl.class.body);
                    if let Some(type_params) = &class_decl.class.type_params {
                        self.refs_in(type_params.as_ref());
                    }
                    self.containers.pop();
                }
            }
            Decl::TsInterface(interface) => {
                let name = SmolStr::new(&interface.id.sym);
                if self.keep_declaration(&name, item_span, exported, ambient) {
                    self.containers.push(name);
                    for heritage in &interface.extends {
                        self.heritage_clause(heritage);
                    }
                    if let Some(type_params) = &interface.type_params {
                        self.refs_in(type_params.as_ref());
                    }
                    self.interface_members(&interface.body.body);
                    self.containers.pop();
                }
            }
            Decl::TsTypeAlias(alias) => {
                let name = SmolStr::new(&alias.id.sym);
                if self.keep_declaration(&name, item_span, exported, ambient) {
                    self.containers.push(name);
                    self.refs_in(alias.type_ann.as_ref());
                    if let Some(type_params) = &alias.type_params {
                        self.refs_in(type_params.as_ref());
                    }
                    self.containers.pop();
                }
            }
            Decl::TsEnum(enum_decl) => {
                let name = SmolStr::new(&enum_decl.id.sym);
                // Enum members never mention other types.
                self.keep_declaration(&name, item_span, exported, ambient);
            }
            Decl::TsModule(module) => {
                let name = SmolStr::new(module_name_text(&module.id).as_str());
                if self.keep_declaration(&name, item_span, exported, ambient) {
                    self.containers.push(name);
                    let inner_ambient = ambient || module.declare || exported;
                    if let Some(body) = &module.body {
                        self.namespace_body(body, inner_ambient);
                    }
                    self.containers.pop();
                }
            }
            Decl::Fn(fn_decl) => {
                let name = SmolStr::new(&fn_decl.ident.sym);
                if self.keep_declaration(&name, item_span, exported, ambient) {
                    self.containers.push(name);
                    self.refs_in(fn_decl.function.as_ref());
                    self.containers.pop();
                }
            }
            Decl::Var(var) => self.var_statement(var, item_span, exported, ambient),
            _ => {}
        }
    }

    fn namespace_body(&mut self, body: &TsNamespaceBody, ambient: bool) {
        match body {
            TsNamespaceBody::TsModuleBlock(block) => self.module_items(&block.body, ambient),
            TsNamespaceBody::TsNamespaceDecl(nested) => self.namespace_body(&nested.body, ambient),
        }
    }

    /// Applies the exclusion policy; on keep, registers the declaration.
    fn keep_declaration(
        &mut self,
        name: &SmolStr,
        span: Span,
        exported: bool,
        ambient: bool,
    ) -> bool {
        if !exported && !ambient {
            trace!(name = %name, "pruned: not exported");
            return false;
        }
        if self.tag_excluded(span) {
            trace!(name = %name, "pruned: excluded tag");
            return false;
        }
        if self.opts.drop_types.contains(name) || self.opts.convert_to_any.contains(name) {
            trace!(name = %name, "pruned: configured drop/opaque type");
            return false;
        }
        let text = self.file.full_text(span).to_string();
        self.add_found_type(name.clone(), text);
        true
    }

    fn add_found_type(&mut self, name: SmolStr, text: String) {
        match &mut self.state.wanted {
            None => {
                self.state.found.insert(name, text);
            }
            Some(wanted) => {
                if let Some(idx) = wanted.iter().position(|w| w == &name) {
                    wanted.remove(idx);
                    self.state.found.insert(name, text);
                } else {
                    self.state.extra.insert(name, text);
                }
            }
        }
    }

    fn class_heritage(&mut self, class: &Class) {
        if let Some(super_class) = &class.super_class {
            match heritage_head(super_class) {
                Ok(head) => self.record_reference(&head.sym, Provenance::Heritage),
                Err(error) => return self.fail(error),
            }
            if let Some(args) = &class.super_type_params {
                self.refs_in(args.as_ref());
            }
        }
        for implemented in &class.implements {
            self.heritage_clause(implemented);
        }
    }

    fn heritage_clause(&mut self, heritage: &TsExprWithTypeArgs) {
        match heritage_head(&heritage.expr) {
            Ok(head) => self.record_reference(&head.sym, Provenance::Heritage),
            Err(error) => return self.fail(error),
        }
        if let Some(args) = &heritage.type_args {
            self.refs_in(args.as_ref());
        }
    }

    fn class_members(&mut self, members: &[ClassMember]) {
        for member in members {
            match member {
                ClassMember::Constructor(ctor) => {
                    if !self.keep_member(ctor.span, ctor.accessibility) {
                        continue;
                    }
                    for param in &ctor.params {
                        self.refs_in(param);
                    }
                }
                ClassMember::Method(method) => {
                    if !self.keep_member(method.span, method.accessibility) {
                        continue;
                    }
                    self.refs_in(method.function.as_ref());
                }
                ClassMember::ClassProp(prop) => {
                    if !self.keep_member(prop.span, prop.accessibility) {
                        continue;
                    }
                    if let Some(type_ann) = &prop.type_ann {
                        self.refs_in(type_ann.as_ref());
                    }
                }
                ClassMember::TsIndexSignature(index) => self.refs_in(index),
                // #-private members are never part of the public surface.
                ClassMember::PrivateMethod(_) | ClassMember::PrivateProp(_) => {}
                _ => {}
            }
        }
    }

    fn interface_members(&mut self, members: &[TsTypeElement]) {
        for member in members {
            if self.tag_excluded(member.span()) {
                continue;
            }
            self.refs_in(member);
        }
    }

    fn var_statement(&mut self, var: &VarDecl, item_span: Span, exported: bool, ambient: bool) {
        if !exported && !ambient {
            return;
        }
        if self.tag_excluded(item_span) {
            return;
        }
        let text = self.file.full_text(item_span).to_string();
        if !self.state.exported_variable_statements.contains(&text) {
            self.state.exported_variable_statements.push(text);
        }
        self.refs_in(var);
    }

    fn keep_member(&self, span: Span, accessibility: Option<Accessibility>) -> bool {
        Visibility::from_accessibility(accessibility).is_public() && !self.tag_excluded(span)
    }

    fn tag_excluded(&self, span: Span) -> bool {
        self.file
            .doc_tags(span.lo)
            .iter()
            .any(|tag| self.opts.exclude_tags.contains(tag))
    }

    fn record_reference(&mut self, name: &str, provenance: Provenance) {
        let name = SmolStr::new(name);
        *self.state.referenced.entry(name.clone()).or_insert(0) += 1;
        let container = self.containers.last().cloned().unwrap_or_default();
        let mentions = self.state.referenced_by.entry(container).or_default();
        if !mentions.contains(&name) {
            mentions.push(name.clone());
        }
        trace!(name = %name, ?provenance, "type reference");
    }

    fn fail(&mut self, error: FrontendError) {
        if self.error.is_some() {
            return;
        }
        self.error = Some(match error {
            FrontendError::UnhandledConstruct { detail } => ResolveError::UnhandledConstruct {
                file: Utf8PathBuf::from(self.file.file_name.clone()),
                detail,
            },
            other => ResolveError::Frontend(other),
        });
    }

    fn refs_in<N>(&mut self, node: &N)
    where
        N: for<'x> VisitWith<RefSink<'x, 'a>>,
    {
        let mut sink = RefSink { cx: self };
        node.visit_with(&mut sink);
    }
}

fn export_name(name: &ModuleExportName) -> SmolStr {
    match name {
        ModuleExportName::Ident(ident) => SmolStr::new(&ident.sym),
        ModuleExportName::Str(s) => SmolStr::new(s.value.as_str().unwrap_or_default()),
    }
}

/// Module specifiers are always valid UTF-8 in declaration files.
fn str_value(s: &Str) -> String {
    s.value.as_str().unwrap_or_default().to_string()
}

/// Collects the left-most identifier of every type mention in a subtree,
/// then keeps descending: generic arguments may contain further references.
struct RefSink<'x, 'a> {
    cx: &'x mut Collector<'a>,
}

impl Visit for RefSink<'_, '_> {
    fn visit_ts_type_ref(&mut self, node: &TsTypeRef) {
        let head = entity_head(&node.type_name);
        self.cx.record_reference(&head.sym, Provenance::TypeRef);
        node.visit_children_with(self);
    }

    fn visit_ts_expr_with_type_args(&mut self, node: &TsExprWithTypeArgs) {
        match heritage_head(&node.expr) {
            Ok(head) => self.cx.record_reference(&head.sym, Provenance::Heritage),
            Err(error) => self.cx.fail(error),
        }
        node.visit_children_with(self);
    }
}
