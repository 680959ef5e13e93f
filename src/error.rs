//! Error taxonomy for a compilation run.
//!
//! Configuration and resource errors are fatal and fail fast; unmatched hook
//! descriptions are accumulated over a whole traversal and reported together
//! so one invocation surfaces every problem at once.

use thiserror::Error;

/// Errors produced by the compiler core.
#[derive(Debug, Error)]
pub enum CompilerError {
    /// A hook description is structurally invalid (e.g. empty name pattern).
    #[error("invalid hook description '{desc}': {reason}")]
    InvalidDescription { desc: String, reason: String },

    /// A free-function hook was matched but its description carries no module.
    #[error("'{desc}': module is required to load function \"{name}\"")]
    MissingModule { desc: String, name: String },

    /// Two hooks resolved to the same identifier.
    #[error("duplicate hook identifier '{0}'")]
    DuplicateIdentifier(String),

    /// A hook description matched nothing in the declaration tree.
    #[error("hook description not found '{0}'")]
    DescriptionNotFound(String),

    /// One or more errors were collected during extraction.
    #[error("{}", render_list(.0))]
    Extraction(Vec<CompilerError>),

    /// A template referenced a macro the generator never defined.
    #[error("missing template macro '{0}'")]
    MissingTemplateMacro(String),

    /// An input header could not be located in any include directory.
    #[error("input file '{0}' not found in any include directory")]
    InputNotFound(String),

    /// The C++ frontend failed to produce a declaration tree.
    #[error("frontend error: {0}")]
    Frontend(String),

    #[error("malformed configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CompilerError>;

fn render_list(errors: &[CompilerError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
