//! Type classification: which DI roles a declaration plays.
//!
//! The classifier is a pure function of the graph and the options. It runs
//! per module (possibly in parallel) and produces a [`ModuleDiscovery`] of
//! discovered records; nothing here looks across modules except through the
//! read-only [`GraphIndex`].

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::binding::{BindingPlanner, ConfigurationBinding};
use crate::config::EngineOptions;
use crate::constructor::{select_constructor, select_decorator_constructor, ChosenConstructor};
use crate::decoration::{open_target_in_scope, DiscoveredDecorator, DiscoveredOpenDecorator};
use crate::diagnostics::{Diagnostic, DiagnosticId};
use crate::factory::{plan_factory, FactoryPlan};
use crate::interception::{has_interceptors, plan_interception, InterceptedService};
use crate::key::{keys_for, Key};
use crate::lifetime::{resolve_lifetime, Lifetime};
use crate::model::{GraphIndex, Marker, ModuleDecl, SourceLocation, TypeDeclaration, TypeRef};

/// A role a declaration can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Injectable service
    Service,
    Plugin,
    Decorator,
    OpenDecorator,
    FactorySource,
    Configuration,
    /// Service registered through an interception proxy
    Intercepted,
}

/// An injectable type with its wiring decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredService {
    pub name: String,
    pub module: String,
    pub constructor: ChosenConstructor,
    pub lifetime: Lifetime,
    /// Exposed interfaces, declaration order
    pub interfaces: Vec<TypeRef>,
    /// Service keys from keyed markers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl DiscoveredService {
    /// Every key the service is registered under.
    pub fn registration_keys(&self) -> Vec<Key> {
        let interfaces: Vec<String> = self.interfaces.iter().map(ToString::to_string).collect();
        keys_for(&self.name, &interfaces, &self.keys)
    }
}

/// A plugin implementation, built on demand with its parameterless
/// constructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredPlugin {
    pub name: String,
    pub module: String,
    /// Plugin interfaces the type implements
    pub interfaces: Vec<TypeRef>,
    /// Marker labels carried into the plugin metadata
    pub markers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

/// Everything classification found in one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleDiscovery {
    pub module: String,
    pub services: Vec<DiscoveredService>,
    pub plugins: Vec<DiscoveredPlugin>,
    pub decorators: Vec<DiscoveredDecorator>,
    pub open_decorators: Vec<DiscoveredOpenDecorator>,
    pub factories: Vec<FactoryPlan>,
    pub intercepted: Vec<InterceptedService>,
    pub bindings: Vec<ConfigurationBinding>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ModuleDiscovery {
    fn new(module: &str) -> Self {
        Self {
            module: module.to_string(),
            ..Self::default()
        }
    }

    /// Folds another module's discoveries into this one, preserving order.
    pub fn merge(&mut self, other: ModuleDiscovery) {
        self.services.extend(other.services);
        self.plugins.extend(other.plugins);
        self.decorators.extend(other.decorators);
        self.open_decorators.extend(other.open_decorators);
        self.factories.extend(other.factories);
        self.intercepted.extend(other.intercepted);
        self.bindings.extend(other.bindings);
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Classifies declarations against one graph and one set of options.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::classify::{Classifier, Role};
/// use ferrous_di_codegen::config::EngineOptions;
/// use ferrous_di_codegen::model::{ModuleDecl, TypeDeclaration, TypeGraph, TypeRef};
///
/// let graph = TypeGraph::new("App").with_module(
///     ModuleDecl::new("App")
///         .with_type(TypeDeclaration::interface("App", "App.IOrderService"))
///         .with_type(
///             TypeDeclaration::class("App", "App.OrderService")
///                 .implementing(TypeRef::interface("App.IOrderService")),
///         ),
/// );
/// let index = graph.index();
/// let options = EngineOptions::default();
/// let classifier = Classifier::new(&index, &options);
///
/// let service = graph.find_type("App.OrderService").unwrap();
/// assert_eq!(classifier.roles(service), vec![Role::Service]);
/// ```
pub struct Classifier<'a, 'g> {
    index: &'a GraphIndex<'g>,
    options: &'a EngineOptions,
}

impl<'a, 'g> Classifier<'a, 'g> {
    pub fn new(index: &'a GraphIndex<'g>, options: &'a EngineOptions) -> Self {
        Self { index, options }
    }

    /// Interfaces whose implementations are plugins.
    pub fn is_plugin_interface(&self, interface: &TypeRef) -> bool {
        let name = interface.base_name();
        self.index.plugin_contracts().contains(name) || self.options.plugin_interfaces.iter().any(|p| p == name)
    }

    /// Implements at least one plugin interface.
    pub fn is_plugin_shaped(&self, declaration: &TypeDeclaration) -> bool {
        declaration.interfaces.iter().any(|i| self.is_plugin_interface(i))
    }

    fn is_ignored_interface(&self, interface: &TypeRef) -> bool {
        self.options.ignored_interfaces.iter().any(|i| i == interface.base_name())
    }

    /// Interfaces a service is registered under: declared interfaces minus
    /// plugin contracts, ignored and open ones, without duplicates.
    pub fn exposed_interfaces(&self, declaration: &TypeDeclaration) -> Vec<TypeRef> {
        let mut seen = BTreeSet::new();
        declaration
            .interfaces
            .iter()
            .filter(|i| !i.is_open() && !self.is_plugin_interface(i) && !self.is_ignored_interface(i))
            .filter(|i| seen.insert(i.to_string()))
            .cloned()
            .collect()
    }

    /// Falls under the namespace filter.
    pub fn matches_namespace(&self, declaration: &TypeDeclaration) -> bool {
        self.options.matches_namespace(&declaration.name)
    }

    /// Whether generated code in the current module can name the type.
    pub fn is_reachable(&self, declaration: &TypeDeclaration) -> bool {
        if self.index.graph().is_current(&declaration.module) {
            declaration.is_reachable_within_module()
        } else {
            declaration.is_publicly_reachable()
        }
    }

    /// Structural injectable check, ignoring reachability.
    pub fn is_injectable_candidate(&self, declaration: &TypeDeclaration) -> bool {
        declaration.is_concrete_class()
            && declaration.type_parameters.is_empty()
            && !declaration.has_marker(|m| {
                matches!(
                    m,
                    Marker::ExemptFromRegistration
                        | Marker::ExemptFromInjection
                        | Marker::DecoratorFor { .. }
                        | Marker::OpenDecoratorFor { .. }
                        | Marker::FactorySource
                        | Marker::ConfigurationSection(_)
                )
            })
            && !self.is_plugin_shaped(declaration)
            && select_constructor(declaration).is_some()
    }

    /// Structural plugin check, ignoring reachability.
    pub fn is_plugin_candidate(&self, declaration: &TypeDeclaration) -> bool {
        declaration.is_concrete_class()
            && declaration.type_parameters.is_empty()
            && !declaration.has_marker(|m| matches!(m, Marker::ExemptFromRegistration))
            && declaration.has_callable_parameterless_constructor()
            && self.is_plugin_shaped(declaration)
    }

    /// Roles the declaration plays, in [`Role`] order. Unreachable and
    /// filtered-out types play none.
    pub fn roles(&self, declaration: &TypeDeclaration) -> Vec<Role> {
        if !self.matches_namespace(declaration) || !self.is_reachable(declaration) {
            return Vec::new();
        }
        let mut roles = Vec::new();
        if self.is_injectable_candidate(declaration) {
            roles.push(Role::Service);
        }
        if self.is_plugin_candidate(declaration) {
            roles.push(Role::Plugin);
        }
        if declaration.has_marker(|m| matches!(m, Marker::DecoratorFor { .. })) && declaration.is_concrete_class() {
            roles.push(Role::Decorator);
        }
        if declaration.has_marker(|m| matches!(m, Marker::OpenDecoratorFor { .. })) && declaration.is_concrete_class() {
            roles.push(Role::OpenDecorator);
        }
        if declaration.has_marker(|m| matches!(m, Marker::FactorySource)) && declaration.is_concrete_class() {
            roles.push(Role::FactorySource);
        }
        if declaration.has_marker(|m| matches!(m, Marker::ConfigurationSection(_))) {
            roles.push(Role::Configuration);
        }
        if roles.contains(&Role::Service) && has_interceptors(declaration) {
            roles.push(Role::Intercepted);
        }
        roles
    }

    /// Classifies every declaration of `module`.
    pub fn classify_module(&self, module: &ModuleDecl) -> ModuleDiscovery {
        let mut discovery = ModuleDiscovery::new(&module.name);
        let planner = BindingPlanner::new(self.index);
        for declaration in &module.types {
            self.unconstructible_decorator(declaration, &mut discovery.diagnostics);
            let roles = self.roles(declaration);
            if roles.is_empty() {
                tracing::trace!(ty = %declaration.name, "no role");
                continue;
            }
            tracing::trace!(ty = %declaration.name, ?roles, "classified");
            for role in roles {
                self.apply(role, declaration, &planner, &mut discovery);
            }
        }
        tracing::debug!(
            module = %module.name,
            services = discovery.services.len(),
            plugins = discovery.plugins.len(),
            decorators = discovery.decorators.len() + discovery.open_decorators.len(),
            bindings = discovery.bindings.len(),
            "classified module"
        );
        discovery
    }

    fn apply(
        &self,
        role: Role,
        declaration: &TypeDeclaration,
        planner: &BindingPlanner<'_, 'g>,
        discovery: &mut ModuleDiscovery,
    ) {
        match role {
            Role::Service => {
                if let Some(service) = self.service(declaration) {
                    discovery.services.push(service);
                }
            }
            Role::Plugin => discovery.plugins.push(self.plugin(declaration)),
            Role::Decorator => self.decorators(declaration, discovery),
            Role::OpenDecorator => self.open_decorators(declaration, discovery),
            Role::FactorySource => {
                let interfaces = self.exposed_interfaces(declaration);
                if let Some(factory) = plan_factory(declaration, interfaces, &mut discovery.diagnostics) {
                    discovery.factories.push(factory);
                }
            }
            Role::Configuration => {
                let bindings = planner.plan(declaration, &mut discovery.diagnostics);
                discovery.bindings.extend(bindings);
            }
            Role::Intercepted => {
                let interfaces = self.exposed_interfaces(declaration);
                if let Some(intercepted) = plan_interception(declaration, &interfaces, &mut discovery.diagnostics) {
                    discovery.intercepted.push(intercepted);
                }
            }
        }
    }

    /// Decorator markers on abstract, static or interface types: the
    /// container could never build them, so no role is assigned.
    fn unconstructible_decorator(&self, declaration: &TypeDeclaration, diagnostics: &mut Vec<Diagnostic>) {
        if declaration.is_concrete_class() || !self.matches_namespace(declaration) || !self.is_reachable(declaration) {
            return;
        }
        for marker in &declaration.markers {
            let (Marker::DecoratorFor { target, .. } | Marker::OpenDecoratorFor { target, .. }) = marker else {
                continue;
            };
            diagnostics.push(Diagnostic::at(
                DiagnosticId::DecoratorNotConstructible,
                vec![declaration.name.clone(), target.to_string()],
                declaration.location.as_ref(),
                &declaration.module,
            ));
        }
    }

    fn service(&self, declaration: &TypeDeclaration) -> Option<DiscoveredService> {
        let constructor = select_constructor(declaration)?;
        let mut keys: Vec<String> = Vec::new();
        for marker in &declaration.markers {
            if let Marker::Keyed(key) = marker {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
        Some(DiscoveredService {
            name: declaration.name.clone(),
            module: declaration.module.clone(),
            constructor,
            lifetime: resolve_lifetime(declaration),
            interfaces: self.exposed_interfaces(declaration),
            keys,
            location: declaration.location.clone(),
        })
    }

    fn plugin(&self, declaration: &TypeDeclaration) -> DiscoveredPlugin {
        let mut seen = BTreeSet::new();
        let interfaces = declaration
            .interfaces
            .iter()
            .filter(|i| self.is_plugin_interface(i))
            .filter(|i| seen.insert(i.to_string()))
            .cloned()
            .collect();
        let order = declaration
            .markers
            .iter()
            .filter_map(|m| match m {
                Marker::Order(order) => Some(*order),
                _ => None,
            })
            .last();
        DiscoveredPlugin {
            name: declaration.name.clone(),
            module: declaration.module.clone(),
            interfaces,
            markers: declaration.markers.iter().map(Marker::label).collect(),
            order,
            location: declaration.location.clone(),
        }
    }

    fn decorators(&self, declaration: &TypeDeclaration, discovery: &mut ModuleDiscovery) {
        for marker in &declaration.markers {
            let Marker::DecoratorFor { target, order } = marker else {
                continue;
            };
            match select_decorator_constructor(declaration, target) {
                Some(constructor) => discovery.decorators.push(DiscoveredDecorator {
                    decorator: declaration.as_type_ref(),
                    target: target.clone(),
                    order: *order,
                    module: declaration.module.clone(),
                    constructor,
                    synthesized: false,
                }),
                None => discovery.diagnostics.push(Diagnostic::at(
                    DiagnosticId::DecoratorMissingInner,
                    vec![declaration.name.clone(), target.to_string()],
                    declaration.location.as_ref(),
                    &declaration.module,
                )),
            }
        }
    }

    fn open_decorators(&self, declaration: &TypeDeclaration, discovery: &mut ModuleDiscovery) {
        for marker in &declaration.markers {
            let Marker::OpenDecoratorFor { target, order } = marker else {
                continue;
            };
            if !target.is_open() {
                discovery.diagnostics.push(Diagnostic::at(
                    DiagnosticId::OpenDecoratorTargetClosed,
                    vec![declaration.name.clone(), target.to_string()],
                    declaration.location.as_ref(),
                    &declaration.module,
                ));
                continue;
            }
            let own_target = open_target_in_scope(declaration, target);
            match select_decorator_constructor(declaration, &own_target) {
                Some(constructor) => discovery.open_decorators.push(DiscoveredOpenDecorator {
                    decorator: declaration.as_type_ref(),
                    target: own_target,
                    order: *order,
                    module: declaration.module.clone(),
                    constructor,
                }),
                None => discovery.diagnostics.push(Diagnostic::at(
                    DiagnosticId::DecoratorMissingInner,
                    vec![declaration.name.clone(), target.to_string()],
                    declaration.location.as_ref(),
                    &declaration.module,
                )),
            }
        }
    }
}
