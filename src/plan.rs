//! The resolution plan: typed IR between planning and emission.
//!
//! A [`ResolutionPlan`] is built once per pass and never mutated after
//! [`ResolutionPlan::into_ordered`]. Every renderer reads the same plan, so
//! ordering is decided here and only here.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::binding::ConfigurationBinding;
use crate::classify::{DiscoveredPlugin, DiscoveredService};
use crate::decoration::DecoratorChain;
use crate::diagnostics::Diagnostic;
use crate::error::GenResult;
use crate::factory::FactoryPlan;
use crate::interception::InterceptedService;
use crate::lifetime::Lifetime;

/// How configuration binding code is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BindingMode {
    /// Hand everything to a generic binder at runtime
    #[default]
    Reflective,
    /// Emit one coercion statement per property
    Generated,
}

/// Everything the emitter needs, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionPlan {
    pub current_module: String,
    pub services: Vec<DiscoveredService>,
    pub plugins: Vec<DiscoveredPlugin>,
    pub factories: Vec<FactoryPlan>,
    pub intercepted: Vec<InterceptedService>,
    pub decorator_chains: Vec<DecoratorChain>,
    pub configuration: Vec<ConfigurationBinding>,
    /// Participating referenced modules the bootstrap forces to load
    pub bootstrap_modules: Vec<String>,
    pub binding_mode: BindingMode,
    pub diagnostics: Vec<Diagnostic>,
}

/// Total emission order: current module first, other modules by name, then
/// qualified type name.
///
/// # Examples
///
/// ```rust
/// use std::cmp::Ordering;
/// use ferrous_di_codegen::plan::emission_order;
///
/// assert_eq!(emission_order("App", ("App", "App.Z"), ("Alpha", "Alpha.A")), Ordering::Less);
/// assert_eq!(emission_order("App", ("Beta", "Beta.A"), ("Alpha", "Alpha.Z")), Ordering::Greater);
/// ```
pub fn emission_order(current: &str, a: (&str, &str), b: (&str, &str)) -> Ordering {
    let rank = |module: &str| module != current;
    rank(a.0)
        .cmp(&rank(b.0))
        .then_with(|| a.0.cmp(b.0))
        .then_with(|| a.1.cmp(b.1))
}

impl ResolutionPlan {
    /// An empty plan for `current_module`.
    pub fn new(current_module: impl Into<String>) -> Self {
        Self {
            current_module: current_module.into(),
            services: Vec::new(),
            plugins: Vec::new(),
            factories: Vec::new(),
            intercepted: Vec::new(),
            decorator_chains: Vec::new(),
            configuration: Vec::new(),
            bootstrap_modules: Vec::new(),
            binding_mode: BindingMode::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Sorts every list into emission order.
    pub fn into_ordered(mut self) -> Self {
        let current = self.current_module.clone();
        self.services
            .sort_by(|a, b| emission_order(&current, (&a.module, &a.name), (&b.module, &b.name)));
        self.plugins
            .sort_by(|a, b| emission_order(&current, (&a.module, &a.name), (&b.module, &b.name)));
        self.factories
            .sort_by(|a, b| emission_order(&current, (&a.module, &a.product), (&b.module, &b.product)));
        self.intercepted
            .sort_by(|a, b| emission_order(&current, (&a.module, &a.service), (&b.module, &b.service)));
        self.decorator_chains
            .sort_by(|a, b| a.target.to_string().cmp(&b.target.to_string()));
        self.configuration.sort_by(|a, b| {
            emission_order(&current, (&a.module, &a.bound_type), (&b.module, &b.bound_type))
                .then_with(|| a.section.cmp(&b.section))
                .then_with(|| a.instance_name.cmp(&b.instance_name))
        });
        self.bootstrap_modules.sort();
        self.bootstrap_modules.dedup();
        self
    }

    pub fn service(&self, name: &str) -> Option<&DiscoveredService> {
        self.services.iter().find(|s| s.name == name)
    }

    /// The interception proxy registered for `service`, if any.
    pub fn proxy_for(&self, service: &str) -> Option<&InterceptedService> {
        self.intercepted.iter().find(|i| i.service == service)
    }

    /// `(type, interface, lifetime)` for every interface registration.
    pub fn interface_triples(&self) -> Vec<(String, String, Lifetime)> {
        self.services
            .iter()
            .flat_map(|s| {
                s.interfaces
                    .iter()
                    .map(move |i| (s.name.clone(), i.to_string(), s.lifetime))
            })
            .collect()
    }

    pub fn to_json(&self) -> GenResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
