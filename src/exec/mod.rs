use std::process::ExitStatus;

/// Run a subprocess
mod run_cmd;
pub use run_cmd::run_cmd;

/// Temporary tool inputs removed on every exit path
mod scoped_input;
pub use scoped_input::ScopedInput;

/// Multiple-sequence alignment jobs
mod aligner;
pub use aligner::Aligner;

/// Tree-inference jobs
mod tree_builder;
pub use tree_builder::{Threads, TreeBuilder, TreeParams};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{tool} executable not found: \"{program}\"")]
    ToolNotFound { tool: &'static str, program: String },
    #[error("{tool} failed ({status}):\n{stderr}")]
    ToolFailed {
        tool: &'static str,
        status: ExitStatus,
        stderr: String,
    },
    #[error("Unable to attach to child {0}")]
    NoPipe(&'static str),
    #[error("Error joining {0} reader thread")]
    Communicate(&'static str),
    #[error("No sequences to align for {0}")]
    EmptyInput(String),
    #[error("Expected file not found: {0}")]
    ExpectedFileNotFound(String),
    #[error("Invalid thread count \"{0}\" (expected AUTO or a positive integer)")]
    InvalidThreads(String),
}

impl Error {
    /// True if the error means the tool could not be launched at all.
    pub fn is_not_found(e: &anyhow::Error) -> bool {
        matches!(e.downcast_ref::<Self>(), Some(Self::ToolNotFound { .. }))
    }
}
