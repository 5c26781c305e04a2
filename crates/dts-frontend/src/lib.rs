//! TypeScript declaration-file frontend.
//!
//! This crate wraps swc for the rest of the workspace: it parses `.d.ts`
//! sources into a navigable module tree, answers primitive node questions
//! (visibility, documentation tags, verbatim text), and applies span-based
//! text edits back onto the original source.
//!
//! "Printing" is deliberately text splicing rather than AST codegen: every
//! downstream consumer works with verbatim source spans, so the emitted
//! output is the input text with ranges deleted or replaced. That keeps
//! member bodies, initializers and comments byte-identical to the authored
//! declarations.

mod edit;
mod error;
mod parse;
mod queries;

pub use edit::{apply_edits, Edit};
pub use error::FrontendError;
pub use parse::{parse_dts, ParsedFile};
pub use queries::{entity_head, heritage_head, module_name_text, Visibility};
