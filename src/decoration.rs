//! Decorator composition: open-decorator expansion and chain linearization.
//!
//! Decorators wrap every registered implementation of the interface they
//! target. This module turns the decorators found by the classifier into one
//! ordered [`DecoratorChain`] per closed target interface, which the emitter
//! renders as the decorator-application routine.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::classify::DiscoveredService;
use crate::constructor::ChosenConstructor;
use crate::model::{TypeDeclaration, TypeRef};

/// A decorator paired with one closed target interface.
///
/// `order` is the primary sort key inside a chain (lower = applied first =
/// innermost); the decorator name breaks ties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredDecorator {
    pub decorator: TypeRef,
    pub target: TypeRef,
    pub order: i32,
    pub module: String,
    pub constructor: ChosenConstructor,
    /// Produced by expanding an open decorator
    #[serde(default)]
    pub synthesized: bool,
}

/// A decorator declared against an unbound generic interface shape.
///
/// Never emitted directly: [`expand_open_decorators`] turns it into one
/// [`DiscoveredDecorator`] per matching closed service interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredOpenDecorator {
    /// The decorator with its own type parameters as arguments
    pub decorator: TypeRef,
    /// Open target shape written in the decorator's own type parameters,
    /// e.g. `App.IHandler<TMessage>` for `App.Retry<TMessage>`
    pub target: TypeRef,
    pub order: i32,
    pub module: String,
    pub constructor: ChosenConstructor,
}

/// Restates an open marker target in the decorator's own type parameters.
///
/// Markers name the unbound shape (`IHandler<T>`), while the decorator
/// implements and accepts it under its own parameter names
/// (`IHandler<TMessage>`). The decorator's interface of the same shape is
/// preferred, then a constructor parameter of that shape. Falls back to the
/// marker target unchanged.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::decoration::open_target_in_scope;
/// use ferrous_di_codegen::model::{TypeDeclaration, TypeRef};
///
/// let own = TypeRef::interface("App.IHandler").with_arg(TypeRef::type_param("TMessage"));
/// let retry = TypeDeclaration::class("App", "App.Retry")
///     .with_type_parameter("TMessage")
///     .implementing(own.clone());
/// let marker = TypeRef::interface("App.IHandler").with_arg(TypeRef::type_param("T"));
/// assert_eq!(open_target_in_scope(&retry, &marker), own);
/// ```
pub fn open_target_in_scope(declaration: &TypeDeclaration, target: &TypeRef) -> TypeRef {
    let matches = |ty: &TypeRef| ty.is_open() && ty.same_shape(target);
    if let Some(interface) = declaration.interfaces.iter().find(|i| matches(i)) {
        return interface.clone();
    }
    declaration
        .effective_constructors()
        .into_iter()
        .flat_map(|(_, candidate)| candidate.parameters)
        .map(|parameter| parameter.ty)
        .find(|ty| matches(ty))
        .unwrap_or_else(|| target.clone())
}

impl DiscoveredOpenDecorator {
    /// Closes this decorator over `interface` if the shapes match.
    pub fn close_over(&self, interface: &TypeRef) -> Option<DiscoveredDecorator> {
        if interface.is_open() {
            return None;
        }
        let bindings = self.target.bind_against(interface)?;
        Some(DiscoveredDecorator {
            decorator: self.decorator.substitute(&bindings),
            target: interface.clone(),
            order: self.order,
            module: self.module.clone(),
            constructor: ChosenConstructor {
                index: self.constructor.index,
                arguments: self.constructor.arguments.iter().map(|a| a.substitute(&bindings)).collect(),
            },
            synthesized: true,
        })
    }
}

/// Expands open decorators against every closed interface exposed by an
/// injectable service.
///
/// Matching is by erased base name and arity. Each (decorator, target)
/// pairing is produced once however many services expose the target.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::decoration::{expand_open_decorators, DiscoveredOpenDecorator};
/// use ferrous_di_codegen::constructor::{ArgumentPlan, ChosenConstructor};
/// use ferrous_di_codegen::model::TypeRef;
///
/// let open_target = TypeRef::interface("App.IHandler").with_arg(TypeRef::type_param("T"));
/// let open = DiscoveredOpenDecorator {
///     decorator: TypeRef::class("App.LoggingHandler").with_arg(TypeRef::type_param("T")),
///     target: open_target.clone(),
///     order: 1,
///     module: "App".into(),
///     constructor: ChosenConstructor {
///         index: 0,
///         arguments: vec![ArgumentPlan::Inner { name: "inner".into(), ty: open_target }],
///     },
/// };
///
/// let closed = TypeRef::interface("App.IHandler").with_arg(TypeRef::class("App.OrderMsg"));
/// let expanded = expand_open_decorators(&[open], [&closed]);
/// assert_eq!(expanded.len(), 1);
/// assert_eq!(expanded[0].decorator.to_string(), "App.LoggingHandler<App.OrderMsg>");
/// ```
pub fn expand_open_decorators<'a, I>(open: &[DiscoveredOpenDecorator], interfaces: I) -> Vec<DiscoveredDecorator>
where
    I: IntoIterator<Item = &'a TypeRef>,
{
    let closed: BTreeSet<&TypeRef> = interfaces.into_iter().filter(|i| !i.is_open()).collect();
    let mut seen = BTreeSet::new();
    let mut expanded = Vec::new();
    for decorator in open {
        for interface in &closed {
            if let Some(closed_decorator) = decorator.close_over(interface) {
                let key = (closed_decorator.decorator.to_string(), closed_decorator.target.to_string());
                if seen.insert(key) {
                    expanded.push(closed_decorator);
                }
            }
        }
    }
    tracing::debug!(open = open.len(), synthesized = expanded.len(), "expanded open decorators");
    expanded
}

/// One decorator's place in a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
    pub decorator: TypeRef,
    pub order: i32,
    /// 1-based; position 1 wraps the original implementation directly
    pub position: usize,
    pub constructor: ChosenConstructor,
    pub synthesized: bool,
}

/// The ordered decorators applied around every implementation of `target`.
///
/// `links` is stored innermost first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoratorChain {
    pub target: TypeRef,
    /// Implementations that receive the chain, each independently
    pub implementations: Vec<String>,
    pub links: Vec<ChainLink>,
}

impl DecoratorChain {
    /// Decorators from the one wrapping the implementation outwards.
    pub fn innermost_first(&self) -> Vec<&TypeRef> {
        self.links.iter().map(|l| &l.decorator).collect()
    }

    /// Decorators from the outermost wrapper inwards.
    pub fn outermost_first(&self) -> Vec<&TypeRef> {
        self.links.iter().rev().map(|l| &l.decorator).collect()
    }

    /// The full nesting for one implementation, outermost first, ending with
    /// the implementation, e.g. `["D2", "D1", "B"]`.
    pub fn nesting(&self, implementation: &str) -> Vec<String> {
        let mut names: Vec<String> = self.outermost_first().iter().map(|d| d.to_string()).collect();
        names.push(implementation.to_string());
        names
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Builds one chain per closed target.
///
/// Decorators are grouped by target, sorted ascending by (order, decorator
/// name), deduplicated, and numbered 1..N. Implementations are every service
/// exposing the target; a target with none still gets its chain, with an
/// empty implementation list, since it may be registered some other way.
pub fn compose_chains(decorators: Vec<DiscoveredDecorator>, services: &[DiscoveredService]) -> Vec<DecoratorChain> {
    let mut groups: BTreeMap<String, (TypeRef, Vec<DiscoveredDecorator>)> = BTreeMap::new();
    for decorator in decorators {
        groups
            .entry(decorator.target.to_string())
            .or_insert_with(|| (decorator.target.clone(), Vec::new()))
            .1
            .push(decorator);
    }

    groups
        .into_values()
        .map(|(target, mut members)| {
            members.sort_by(|a, b| {
                a.order
                    .cmp(&b.order)
                    .then_with(|| a.decorator.to_string().cmp(&b.decorator.to_string()))
            });
            let mut seen = BTreeSet::new();
            members.retain(|d| seen.insert(d.decorator.clone()));

            let links = members
                .into_iter()
                .enumerate()
                .map(|(i, d)| ChainLink {
                    decorator: d.decorator,
                    order: d.order,
                    position: i + 1,
                    constructor: d.constructor,
                    synthesized: d.synthesized,
                })
                .collect();

            let mut implementations: Vec<String> = services
                .iter()
                .filter(|s| s.interfaces.iter().any(|i| i.same_type(&target)))
                .map(|s| s.name.clone())
                .collect();
            implementations.sort();
            implementations.dedup();

            DecoratorChain {
                target,
                implementations,
                links,
            }
        })
        .collect()
}
