//! The generation pass.
//!
//! One pass is: validate the graph, classify every scanned module (in
//! parallel with the `parallel` feature), then, after all modules are in,
//! run the global steps: open-decorator expansion, chain composition,
//! nested-configuration filtering and the cross-module checks. The result
//! is an ordered [`ResolutionPlan`] that the configured renderer turns into
//! artifacts.

use crate::binding::remove_nested;
use crate::classify::{Classifier, ModuleDiscovery};
use crate::config::EngineOptions;
use crate::consistency;
use crate::decoration::{compose_chains, expand_open_decorators};
use crate::diagnostics::{Diagnostic, DiagnosticBag};
use crate::emit::{render_all, Artifact, ArtifactKind, ArtifactRenderer, SourceRenderer};
use crate::error::{GenError, GenResult};
use crate::model::{ModuleDecl, TypeGraph};
use crate::plan::{emission_order, BindingMode, ResolutionPlan};
use crate::sink::{write_atomically, ArtifactSink};

/// Result of one pass.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub plan: ResolutionPlan,
    pub artifacts: Vec<Artifact>,
    /// Sorted, most severe first
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationOutput {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn artifact(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }

    /// Fails with every error diagnostic when the pass produced any.
    pub fn into_result(self) -> GenResult<Self> {
        if self.has_errors() {
            let errors = self.diagnostics.into_iter().filter(Diagnostic::is_error).collect();
            return Err(GenError::Reachability(errors));
        }
        Ok(self)
    }

    /// Publishes every artifact to `sink`, in render order.
    pub fn publish_to(&self, sink: &mut dyn ArtifactSink) -> GenResult<()> {
        for artifact in &self.artifacts {
            sink.publish(artifact)?;
        }
        Ok(())
    }
}

/// Runs generation passes with one set of options and one renderer.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::config::EngineOptions;
/// use ferrous_di_codegen::engine::Engine;
/// use ferrous_di_codegen::model::{ModuleDecl, TypeDeclaration, TypeGraph, TypeRef};
///
/// let graph = TypeGraph::new("App").with_module(
///     ModuleDecl::new("App").with_type(
///         TypeDeclaration::class("App", "App.OrderService")
///             .implementing(TypeRef::interface("App.IOrderService")),
///     ),
/// );
///
/// let output = Engine::new(EngineOptions::default()).run(&graph).unwrap();
/// assert_eq!(output.plan.services.len(), 1);
/// assert_eq!(output.artifacts.len(), 5);
/// ```
pub struct Engine {
    options: EngineOptions,
    renderer: Box<dyn ArtifactRenderer>,
}

impl Engine {
    /// An engine rendering Rust source.
    pub fn new(options: EngineOptions) -> Self {
        Self {
            options,
            renderer: Box::new(SourceRenderer),
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn ArtifactRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Computes the ordered plan without rendering.
    pub fn plan(&self, graph: &TypeGraph) -> GenResult<ResolutionPlan> {
        graph.validate()?;
        let index = graph.index();
        let classifier = Classifier::new(&index, &self.options);

        let mut modules: Vec<&ModuleDecl> = graph.scanned_modules().collect();
        modules.sort_by(|a, b| emission_order(&graph.current_module, (&a.name, ""), (&b.name, "")));

        let mut merged = ModuleDiscovery::default();
        for discovery in classify_modules(&classifier, &modules) {
            merged.merge(discovery);
        }

        let mut decorators = std::mem::take(&mut merged.decorators);
        decorators.extend(expand_open_decorators(
            &merged.open_decorators,
            merged.services.iter().flat_map(|s| s.interfaces.iter()),
        ));
        let decorator_chains = compose_chains(decorators, &merged.services);
        let configuration = remove_nested(std::mem::take(&mut merged.bindings));

        let mut bag = DiagnosticBag::new();
        for diagnostic in merged.diagnostics.drain(..) {
            bag.push(diagnostic);
        }
        for diagnostic in consistency::check(graph, &classifier) {
            bag.push(diagnostic);
        }

        let plan = ResolutionPlan {
            current_module: graph.current_module.clone(),
            services: merged.services,
            plugins: merged.plugins,
            factories: merged.factories,
            intercepted: merged.intercepted,
            decorator_chains,
            configuration,
            bootstrap_modules: graph
                .participating_references()
                .into_iter()
                .map(|m| m.name.clone())
                .collect(),
            binding_mode: if self.options.aot {
                BindingMode::Generated
            } else {
                BindingMode::Reflective
            },
            diagnostics: bag.into_sorted(),
        }
        .into_ordered();

        tracing::info!(
            module = %plan.current_module,
            services = plan.services.len(),
            plugins = plan.plugins.len(),
            chains = plan.decorator_chains.len(),
            bindings = plan.configuration.len(),
            diagnostics = plan.diagnostics.len(),
            "resolution plan ready"
        );
        Ok(plan)
    }

    /// Plans and renders.
    pub fn run(&self, graph: &TypeGraph) -> GenResult<GenerationOutput> {
        let plan = self.plan(graph)?;
        let artifacts = render_all(self.renderer.as_ref(), &plan, &self.options)?;
        let diagnostics = plan.diagnostics.clone();
        Ok(GenerationOutput {
            plan,
            artifacts,
            diagnostics,
        })
    }

    /// Plans, renders and publishes to `sink`, then writes the diagnostic
    /// report file when one is configured.
    pub fn generate(&self, graph: &TypeGraph, sink: &mut dyn ArtifactSink) -> GenResult<GenerationOutput> {
        let output = self.run(graph)?;
        output.publish_to(sink)?;
        if let (Some(path), Some(report)) = (
            self.options.diagnostics_path.as_deref(),
            output.artifact(ArtifactKind::DiagnosticReport),
        ) {
            write_atomically(path, &report.contents)?;
            tracing::debug!(path = %path.display(), "wrote diagnostic report");
        }
        Ok(output)
    }
}

#[cfg(not(feature = "parallel"))]
fn classify_modules(classifier: &Classifier<'_, '_>, modules: &[&ModuleDecl]) -> Vec<ModuleDiscovery> {
    modules.iter().map(|m| classifier.classify_module(m)).collect()
}

/// One scoped worker per module; results come back in `modules` order.
#[cfg(feature = "parallel")]
fn classify_modules(classifier: &Classifier<'_, '_>, modules: &[&ModuleDecl]) -> Vec<ModuleDiscovery> {
    let scoped = crossbeam_utils::thread::scope(|scope| {
        let handles: Vec<_> = modules
            .iter()
            .map(|module| scope.spawn(move |_| classifier.classify_module(module)))
            .collect();
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(discovery) => discovery,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect::<Vec<_>>()
    });
    match scoped {
        Ok(discoveries) => discoveries,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BreadcrumbLevel;
    use crate::diagnostics::DiagnosticId;
    use crate::model::{Accessibility, TypeDeclaration, TypeRef};
    use crate::sink::MemorySink;

    fn graph() -> TypeGraph {
        TypeGraph::new("App")
            .with_module(
                ModuleDecl::new("App").with_type(
                    TypeDeclaration::class("App", "App.OrderService")
                        .implementing(TypeRef::interface("App.IOrderService")),
                ),
            )
            .with_module(
                ModuleDecl::new("Lib")
                    .participating()
                    .with_type(TypeDeclaration::class("Lib", "Lib.Clock").implementing(TypeRef::interface("Lib.IClock")))
                    .with_type(TypeDeclaration::class("Lib", "Lib.Hidden").with_accessibility(Accessibility::Internal)),
            )
    }

    #[test]
    fn referenced_modules_follow_current_module() {
        let plan = Engine::new(EngineOptions::default()).plan(&graph()).unwrap();
        let names: Vec<_> = plan.services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["App.OrderService", "Lib.Clock"]);
        assert_eq!(plan.bootstrap_modules, vec!["Lib"]);
    }

    #[test]
    fn reachability_errors_surface_through_into_result() {
        let output = Engine::new(EngineOptions::default()).run(&graph()).unwrap();
        assert!(output.has_errors());
        assert_eq!(output.diagnostics[0].id, DiagnosticId::InaccessibleCandidate);
        match output.into_result() {
            Err(GenError::Reachability(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected reachability failure, got {other:?}"),
        }
    }

    #[test]
    fn report_is_rendered_and_written_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("di-report.txt");
        let options = EngineOptions {
            diagnostics: true,
            diagnostics_path: Some(report_path.clone()),
            breadcrumbs: BreadcrumbLevel::None,
            ..EngineOptions::default()
        };
        let mut sink = MemorySink::new();
        let output = Engine::new(options).generate(&graph(), &mut sink).unwrap();

        assert_eq!(sink.len(), 6);
        let report = output.artifact(ArtifactKind::DiagnosticReport).unwrap();
        assert_eq!(std::fs::read_to_string(report_path).unwrap(), report.contents);
    }
}
