//! Constructor selection for injectable types and factory sources.
//!
//! Selection is a pure function of a declaration's constructor list, so
//! re-running it on an unchanged graph always picks the same constructor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{ConstructorCandidate, Parameter, TypeDeclaration, TypeRef};

/// How one constructor argument is obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgumentPlan {
    /// Resolve the service of this type
    Service { name: String, ty: TypeRef },
    /// Resolve the named instance registered under `key`
    Keyed { name: String, ty: TypeRef, key: String },
    /// Supplied by the caller of a generated factory
    Runtime { name: String, ty: TypeRef },
    /// The decorated instance handed to a decorator
    Inner { name: String, ty: TypeRef },
}

impl ArgumentPlan {
    fn injected(parameter: &Parameter) -> Self {
        match &parameter.key {
            Some(key) => ArgumentPlan::Keyed {
                name: parameter.name.clone(),
                ty: parameter.ty.clone(),
                key: key.clone(),
            },
            None => ArgumentPlan::Service {
                name: parameter.name.clone(),
                ty: parameter.ty.clone(),
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ArgumentPlan::Service { name, .. }
            | ArgumentPlan::Keyed { name, .. }
            | ArgumentPlan::Runtime { name, .. }
            | ArgumentPlan::Inner { name, .. } => name,
        }
    }

    pub fn ty(&self) -> &TypeRef {
        match self {
            ArgumentPlan::Service { ty, .. }
            | ArgumentPlan::Keyed { ty, .. }
            | ArgumentPlan::Runtime { ty, .. }
            | ArgumentPlan::Inner { ty, .. } => ty,
        }
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, ArgumentPlan::Runtime { .. })
    }

    /// Replaces type parameters in the argument type.
    pub fn substitute(&self, bindings: &BTreeMap<String, TypeRef>) -> Self {
        let mut plan = self.clone();
        match &mut plan {
            ArgumentPlan::Service { ty, .. }
            | ArgumentPlan::Keyed { ty, .. }
            | ArgumentPlan::Runtime { ty, .. }
            | ArgumentPlan::Inner { ty, .. } => *ty = ty.substitute(bindings),
        }
        plan
    }
}

/// The constructor a registration invokes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChosenConstructor {
    /// Position in the declaration's constructor list
    pub index: usize,
    pub arguments: Vec<ArgumentPlan>,
}

impl ChosenConstructor {
    pub fn is_parameterless(&self) -> bool {
        self.arguments.is_empty()
    }
}

/// A parameter type the container can supply by itself: a class or
/// interface, not a primitive, string, value type, delegate, array or
/// unbound type parameter.
pub fn is_resolvable(ty: &TypeRef) -> bool {
    ty.is_reference_type() && !ty.is_open()
}

fn references_self(declaration: &TypeDeclaration, ty: &TypeRef) -> bool {
    ty.base_name() == declaration.name
}

/// Whether the container could invoke this constructor.
///
/// Parameterless constructors always qualify. Otherwise every parameter must
/// be resolvable and none may name the declaring type, which rules out the
/// accidental self-dependency of a constructor taking its own type.
pub fn is_injectable_constructor(declaration: &TypeDeclaration, constructor: &ConstructorCandidate) -> bool {
    constructor
        .parameters
        .iter()
        .all(|p| is_resolvable(&p.ty) && !references_self(declaration, &p.ty))
}

/// Selects the constructor for an injectable type.
///
/// Among callable constructors that qualify, the one with the most
/// parameters wins, ties going to the earliest declared. The parameterless
/// constructor therefore only wins when no qualifying constructor with
/// parameters exists. Returns `None` when nothing qualifies.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::select_constructor;
/// use ferrous_di_codegen::model::{ConstructorCandidate, Parameter, TypeDeclaration, TypeRef};
///
/// let decl = TypeDeclaration::class("App", "App.OrderService")
///     .with_constructor(ConstructorCandidate::parameterless())
///     .with_constructor(ConstructorCandidate::with_parameters(vec![
///         Parameter::new("repository", TypeRef::interface("App.IOrderRepository")),
///     ]));
///
/// let chosen = select_constructor(&decl).unwrap();
/// assert_eq!(chosen.index, 1);
/// assert_eq!(chosen.arguments.len(), 1);
/// ```
pub fn select_constructor(declaration: &TypeDeclaration) -> Option<ChosenConstructor> {
    let mut best: Option<(usize, ConstructorCandidate)> = None;
    for (index, candidate) in declaration.effective_constructors() {
        if !is_injectable_constructor(declaration, &candidate) {
            continue;
        }
        let better = match &best {
            None => true,
            Some((_, current)) => candidate.parameters.len() > current.parameters.len(),
        };
        if better {
            best = Some((index, candidate));
        }
    }
    best.map(|(index, candidate)| ChosenConstructor {
        index,
        arguments: candidate.parameters.iter().map(ArgumentPlan::injected).collect(),
    })
}

/// Selects the constructor a generated factory calls.
///
/// The callable constructor with the most parameters wins (earliest on
/// ties). Resolvable parameters are injected; everything else becomes a
/// runtime argument of the factory's `create` method.
pub fn select_factory_constructor(declaration: &TypeDeclaration) -> Option<ChosenConstructor> {
    let mut best: Option<(usize, ConstructorCandidate)> = None;
    for (index, candidate) in declaration.effective_constructors() {
        let better = match &best {
            None => true,
            Some((_, current)) => candidate.parameters.len() > current.parameters.len(),
        };
        if better {
            best = Some((index, candidate));
        }
    }
    best.map(|(index, candidate)| ChosenConstructor {
        index,
        arguments: candidate
            .parameters
            .iter()
            .map(|p| {
                if is_resolvable(&p.ty) && !references_self(declaration, &p.ty) {
                    ArgumentPlan::injected(p)
                } else {
                    ArgumentPlan::Runtime {
                        name: p.name.clone(),
                        ty: p.ty.clone(),
                    }
                }
            })
            .collect(),
    })
}

/// Selects the constructor a decorator is built with.
///
/// The constructor must take the decorated interface (`target`) as one
/// parameter, and every other parameter must be resolvable. Requiring the
/// interface rather than the decorator's own type keeps a decorator from
/// wrapping itself. Most parameters wins, earliest on ties.
pub fn select_decorator_constructor(declaration: &TypeDeclaration, target: &TypeRef) -> Option<ChosenConstructor> {
    let mut best: Option<(usize, ConstructorCandidate, usize)> = None;
    for (index, candidate) in declaration.effective_constructors() {
        let Some(inner) = candidate.parameters.iter().position(|p| p.ty.same_type(target)) else {
            continue;
        };
        let others_resolvable = candidate
            .parameters
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != inner)
            .all(|(_, p)| is_resolvable(&p.ty) && !references_self(declaration, &p.ty));
        if !others_resolvable {
            continue;
        }
        let better = match &best {
            None => true,
            Some((_, current, _)) => candidate.parameters.len() > current.parameters.len(),
        };
        if better {
            best = Some((index, candidate, inner));
        }
    }
    best.map(|(index, candidate, inner)| ChosenConstructor {
        index,
        arguments: candidate
            .parameters
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if i == inner {
                    ArgumentPlan::Inner {
                        name: p.name.clone(),
                        ty: p.ty.clone(),
                    }
                } else {
                    ArgumentPlan::injected(p)
                }
            })
            .collect(),
    })
}
