//! Error types for the code generation pass.

use thiserror::Error;

use crate::diagnostics::Diagnostic;

/// Hard failures of a generation pass.
///
/// Problems with the *user's* declarations (unreachable services, misshapen
/// decorators, unused validators) are not errors at this level: they are
/// collected as [`Diagnostic`]s so a single build reports all of them. A
/// `GenError` means the pass itself could not run, or that the caller asked
/// to turn error diagnostics into a failure via
/// [`GenerationOutput::into_result`](crate::GenerationOutput::into_result).
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::GenError;
///
/// let missing = GenError::UnknownModule("App".to_string());
/// assert_eq!(missing.to_string(), "Current module not found in graph: App");
///
/// let dup = GenError::DuplicateArtifact("ServiceRegistry.g.rs".to_string());
/// assert!(dup.to_string().contains("ServiceRegistry.g.rs"));
/// ```
#[derive(Debug, Error)]
pub enum GenError {
    /// The graph names a current module that it does not contain
    #[error("Current module not found in graph: {0}")]
    UnknownModule(String),
    /// Two modules share a name
    #[error("Module declared more than once: {0}")]
    DuplicateModule(String),
    /// Two types in one module share a qualified name
    #[error("Type {type_name} declared more than once in module {module}")]
    DuplicateType { module: String, type_name: String },
    /// A type claims to belong to a module other than the one containing it
    #[error("Type {type_name} is listed under module {listed} but declares module {declared}")]
    ModuleMismatch {
        type_name: String,
        listed: String,
        declared: String,
    },
    /// A build property could not be parsed
    #[error("Invalid value for build property {key}: {value:?} ({reason})")]
    InvalidProperty {
        key: String,
        value: String,
        reason: &'static str,
    },
    /// The same artifact name was published twice in one pass
    #[error("Artifact published more than once: {0}")]
    DuplicateArtifact(String),
    /// Error diagnostics were reported and the caller asked for a failure
    #[error("{} error diagnostic(s) reported; first: {}", .0.len(), .0.first().map(|d| d.message()).unwrap_or_default())]
    Reachability(Vec<Diagnostic>),
    /// JSON (de)serialization failed
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    /// YAML serialization failed
    #[cfg(feature = "yaml")]
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Writing an artifact failed
    #[error("Artifact I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for generation operations
///
/// A convenience alias for `Result<T, GenError>`, following the usual
/// crate-specific `Result` pattern.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::{GenError, GenResult};
///
/// fn lookup(name: &str) -> GenResult<()> {
///     Err(GenError::UnknownModule(name.to_string()))
/// }
///
/// assert!(lookup("Missing").is_err());
/// ```
pub type GenResult<T> = Result<T, GenError>;
