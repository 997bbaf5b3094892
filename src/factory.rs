//! Generated factories for types that need caller-supplied arguments.

use serde::{Deserialize, Serialize};

use crate::constructor::{select_factory_constructor, ArgumentPlan, ChosenConstructor};
use crate::diagnostics::{Diagnostic, DiagnosticId};
use crate::lifetime::Lifetime;
use crate::model::{namespace_of, SourceLocation, TypeDeclaration, TypeRef};

/// A factory generated for a factory-source type.
///
/// The factory itself is registered as a singleton; each `create` call builds
/// a fresh product from injected services plus the runtime arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryPlan {
    /// The type the factory produces
    pub product: String,
    pub module: String,
    /// Qualified factory name, `<SimpleName>Factory` in the product's namespace
    pub factory_name: String,
    pub lifetime: Lifetime,
    pub constructor: ChosenConstructor,
    /// Interfaces of the product, exposed on the factory's `create`
    pub interfaces: Vec<TypeRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl FactoryPlan {
    /// Arguments `create` takes from its caller, in constructor order.
    pub fn runtime_arguments(&self) -> impl Iterator<Item = &ArgumentPlan> {
        self.constructor.arguments.iter().filter(|a| a.is_runtime())
    }

    /// Arguments the factory resolves from the container.
    pub fn injected_arguments(&self) -> impl Iterator<Item = &ArgumentPlan> {
        self.constructor.arguments.iter().filter(|a| !a.is_runtime())
    }
}

/// Qualified name of the factory generated for `product`.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::factory::factory_name;
///
/// assert_eq!(factory_name("App.Reports.Report"), "App.Reports.ReportFactory");
/// assert_eq!(factory_name("Report"), "ReportFactory");
/// ```
pub fn factory_name(product: &str) -> String {
    let simple = crate::model::simple_name(product);
    match namespace_of(product) {
        "" => format!("{simple}Factory"),
        namespace => format!("{namespace}.{simple}Factory"),
    }
}

/// Plans the factory for a factory-source declaration.
///
/// Returns `None` when the type has no callable constructor at all. A factory
/// without runtime arguments is still planned but reported, since the
/// product could be registered directly.
pub fn plan_factory(
    declaration: &TypeDeclaration,
    interfaces: Vec<TypeRef>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<FactoryPlan> {
    let constructor = select_factory_constructor(declaration)?;
    if !constructor.arguments.iter().any(ArgumentPlan::is_runtime) {
        diagnostics.push(Diagnostic::at(
            DiagnosticId::FactoryUnnecessary,
            vec![declaration.name.clone()],
            declaration.location.as_ref(),
            &declaration.module,
        ));
    }
    Some(FactoryPlan {
        product: declaration.name.clone(),
        module: declaration.module.clone(),
        factory_name: factory_name(&declaration.name),
        lifetime: Lifetime::Singleton,
        constructor,
        interfaces,
        location: declaration.location.clone(),
    })
}
