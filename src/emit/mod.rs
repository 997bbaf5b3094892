//! Rendering a [`ResolutionPlan`] into text artifacts.
//!
//! Renderers are swappable behind [`ArtifactRenderer`]. Each renders one
//! [`ArtifactKind`] at a time from the same ordered plan; a renderer must be
//! a pure function of its inputs so identical plans give byte-identical
//! artifacts.

mod json;
mod report;
mod source;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EngineOptions;
use crate::error::GenResult;
use crate::plan::ResolutionPlan;

pub use json::JsonRenderer;
#[cfg(feature = "yaml")]
pub use json::YamlRenderer;
pub use report::{DiagnosticReport, ReportChain, ReportEntry};
pub use source::SourceRenderer;

/// The artifacts a pass produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    ServiceRegistry,
    PluginRegistry,
    DecoratorApplication,
    ConfigurationBinding,
    Bootstrap,
    DiagnosticReport,
}

impl ArtifactKind {
    /// Artifacts rendered on every pass, in publication order.
    pub const CORE: [ArtifactKind; 5] = [
        ArtifactKind::ServiceRegistry,
        ArtifactKind::PluginRegistry,
        ArtifactKind::DecoratorApplication,
        ArtifactKind::ConfigurationBinding,
        ArtifactKind::Bootstrap,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::ServiceRegistry => "ServiceRegistry",
            ArtifactKind::PluginRegistry => "PluginRegistry",
            ArtifactKind::DecoratorApplication => "DecoratorApplication",
            ArtifactKind::ConfigurationBinding => "ConfigurationBinding",
            ArtifactKind::Bootstrap => "Bootstrap",
            ArtifactKind::DiagnosticReport => "DiagnosticReport",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output formats of the shipped renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderFormat {
    /// Rust registration source
    Source,
    Json,
    Yaml,
}

impl RenderFormat {
    pub fn extension(self) -> &'static str {
        match self {
            RenderFormat::Source => "g.rs",
            RenderFormat::Json => "json",
            RenderFormat::Yaml => "yaml",
        }
    }
}

/// One rendered artifact, ready for a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    /// File name, e.g. `ServiceRegistry.g.rs`
    pub name: String,
    pub contents: String,
}

impl Artifact {
    pub fn new(kind: ArtifactKind, format: RenderFormat, contents: String) -> Self {
        Self {
            kind,
            name: format!("{}.{}", kind.as_str(), format.extension()),
            contents,
        }
    }
}

/// Renders plan artifacts in one output format.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::config::EngineOptions;
/// use ferrous_di_codegen::emit::{ArtifactKind, ArtifactRenderer, JsonRenderer};
/// use ferrous_di_codegen::plan::ResolutionPlan;
///
/// let plan = ResolutionPlan::new("App");
/// let text = JsonRenderer
///     .render(ArtifactKind::Bootstrap, &plan, &EngineOptions::default())
///     .unwrap();
/// assert!(text.contains("\"modules\""));
/// ```
pub trait ArtifactRenderer: Send + Sync {
    fn format(&self) -> RenderFormat;

    /// Renders one artifact of the plan.
    fn render(&self, kind: ArtifactKind, plan: &ResolutionPlan, options: &EngineOptions) -> GenResult<String>;
}

/// Renders the core artifacts, plus the diagnostic report when enabled.
pub fn render_all(
    renderer: &dyn ArtifactRenderer,
    plan: &ResolutionPlan,
    options: &EngineOptions,
) -> GenResult<Vec<Artifact>> {
    let mut kinds = ArtifactKind::CORE.to_vec();
    if options.diagnostics {
        kinds.push(ArtifactKind::DiagnosticReport);
    }
    kinds
        .into_iter()
        .map(|kind| {
            let contents = renderer.render(kind, plan, options)?;
            tracing::debug!(artifact = %kind, bytes = contents.len(), "rendered artifact");
            Ok(Artifact::new(kind, renderer.format(), contents))
        })
        .collect()
}
