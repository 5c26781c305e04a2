//! Frontend error types.

use thiserror::Error;

/// An error raised by the declaration frontend.
#[derive(Debug, Clone, Error)]
pub enum FrontendError {
    /// The declaration source failed to parse.
    #[error("failed to parse {file}: {message}")]
    Parse {
        /// The file being parsed.
        file: String,
        /// The parser's diagnostic.
        message: String,
    },

    /// A node had a shape no query knows how to answer.
    #[error("unhandled construct: {detail}")]
    UnhandledConstruct {
        /// A description of the unexpected shape.
        detail: String,
    },
}
