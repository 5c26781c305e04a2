//! Primitive node queries.

use crate::error::FrontendError;
use swc_ecma_ast::{Accessibility, Expr, Ident, TsEntityName, TsModuleName};

/// Member visibility. Absent accessibility means public.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    /// Maps swc's optional accessibility modifier.
    pub fn from_accessibility(access: Option<Accessibility>) -> Self {
        match access {
            None | Some(Accessibility::Public) => Visibility::Public,
            Some(Accessibility::Protected) => Visibility::Protected,
            Some(Accessibility::Private) => Visibility::Private,
        }
    }

    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

/// Left-most identifier of a possibly qualified type name (`A.B.C` -> `A`).
pub fn entity_head(name: &TsEntityName) -> &Ident {
    match name {
        TsEntityName::Ident(ident) => ident,
        TsEntityName::TsQualifiedName(qualified) => entity_head(&qualified.left),
    }
}

/// Left-most identifier of a heritage-clause expression.
///
/// Heritage clauses are open expressions in the grammar; only plain
/// identifiers and dotted member chains denote resolvable type names.
/// Anything else (calls, literals, ...) is an unhandled construct.
pub fn heritage_head(expr: &Expr) -> Result<&Ident, FrontendError> {
    match expr {
        Expr::Ident(ident) => Ok(ident),
        Expr::Member(member) => heritage_head(&member.obj),
        other => Err(FrontendError::UnhandledConstruct {
            detail: format!("heritage clause expression: {:?}", other),
        }),
    }
}

/// The declared name of a namespace/module container.
pub fn module_name_text(name: &TsModuleName) -> String {
    match name {
        TsModuleName::Ident(ident) => ident.sym.to_string(),
        TsModuleName::Str(s) => s.value.as_str().unwrap_or_default().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_dts;
    use pretty_assertions::assert_eq;
    use swc_ecma_ast::{Decl, ModuleDecl, ModuleItem, Stmt};

    fn first_interface_extends_head(source: &str) -> String {
        let parsed = parse_dts(source, "t.d.ts").unwrap();
        if let ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) = &parsed.module.body[0] {
            if let Decl::TsInterface(interface) = &export.decl {
                let heritage = &interface.extends[0];
                return heritage_head(&heritage.expr).unwrap().sym.to_string();
            }
        }
        panic!("expected exported interface");
    }

    #[test]
    fn test_heritage_head_ident() {
        assert_eq!(
            first_interface_extends_head("export interface A extends B {}"),
            "B"
        );
    }

    #[test]
    fn test_heritage_head_qualified() {
        assert_eq!(
            first_interface_extends_head("export interface A extends ns.deep.B {}"),
            "ns"
        );
    }

    #[test]
    fn test_module_name_text_quoted() {
        let parsed = parse_dts("declare module \"my-pkg\" {}", "t.d.ts").unwrap();
        if let ModuleItem::Stmt(Stmt::Decl(Decl::TsModule(module))) = &parsed.module.body[0] {
            assert_eq!(module_name_text(&module.id), "my-pkg");
        } else {
            panic!("expected module declaration");
        }
    }

    #[test]
    fn test_visibility_mapping() {
        assert!(Visibility::from_accessibility(None).is_public());
        assert!(Visibility::from_accessibility(Some(Accessibility::Public)).is_public());
        assert_eq!(
            Visibility::from_accessibility(Some(Accessibility::Private)),
            Visibility::Private
        );
        assert_eq!(
            Visibility::from_accessibility(Some(Accessibility::Protected)),
            Visibility::Protected
        );
    }
}
