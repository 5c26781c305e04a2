//! Resolver error types.

use camino::Utf8PathBuf;
use dts_frontend::FrontendError;
use thiserror::Error;

/// A fatal resolution failure. There is no partial-failure mode: any of
/// these aborts the run before anything is written.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A file was re-entered while still on the active resolution stack.
    #[error("circular dependency on {path} (stack: {})", format_stack(.stack))]
    CircularDependency {
        /// The re-entered file.
        path: Utf8PathBuf,
        /// The in-flight files at the moment of re-entry.
        stack: Vec<Utf8PathBuf>,
    },

    /// The global invocation ceiling was exceeded.
    #[error("resolution exceeded {limit} invocations, aborting")]
    RunawayRecursion {
        /// The configured ceiling.
        limit: u64,
    },

    /// A memo entry disagreed with what the resolution logic guarantees.
    /// This is a bug in the resolver, never recoverable input trouble.
    #[error("memo consistency violation: {detail}")]
    ConsistencyViolation {
        /// What disagreed.
        detail: String,
    },

    /// A type mention had a shape the resolver does not understand.
    #[error("{file}: unhandled construct: {detail}")]
    UnhandledConstruct {
        /// The file containing the construct.
        file: Utf8PathBuf,
        /// A description of the shape.
        detail: String,
    },

    /// A declaration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file being read.
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The frontend rejected a file.
    #[error(transparent)]
    Frontend(#[from] FrontendError),
}

fn format_stack(stack: &[Utf8PathBuf]) -> String {
    stack
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}
