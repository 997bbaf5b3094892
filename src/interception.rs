//! Interception planning: which interceptors run around which methods.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, DiagnosticId};
use crate::model::{namespace_of, simple_name, Accessibility, Marker, SourceLocation, TypeDeclaration, TypeRef};

/// An interceptor applied to a method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptorRef {
    pub interceptor: TypeRef,
    pub order: i32,
}

/// A proxied method with its interceptors, outermost (lowest order) first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptedMethod {
    pub name: String,
    pub interceptors: Vec<InterceptorRef>,
}

/// A service registered through a generated proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptedService {
    pub service: String,
    pub module: String,
    /// Qualified proxy name, `<SimpleName>Proxy`
    pub proxy_name: String,
    /// Interfaces the proxy implements
    pub interfaces: Vec<TypeRef>,
    pub methods: Vec<InterceptedMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

fn interceptors_of(markers: &[Marker]) -> impl Iterator<Item = InterceptorRef> + '_ {
    markers.iter().filter_map(|m| match m {
        Marker::Intercept { interceptor, order } => Some(InterceptorRef {
            interceptor: interceptor.clone(),
            order: *order,
        }),
        _ => None,
    })
}

/// True when the type or any of its methods carries an intercept marker.
pub fn has_interceptors(declaration: &TypeDeclaration) -> bool {
    interceptors_of(&declaration.markers).next().is_some()
        || declaration.methods.iter().any(|m| interceptors_of(&m.markers).next().is_some())
}

/// Plans the proxy for `declaration`.
///
/// Type-level markers apply to every public instance method; method-level
/// markers add to their method. Returns `None` when no public instance
/// method ends up intercepted, or when there is no interface to proxy (the
/// latter is reported and the type is registered plainly).
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::interception::plan_interception;
/// use ferrous_di_codegen::model::{Marker, MethodDecl, TypeDeclaration, TypeRef};
///
/// let decl = TypeDeclaration::class("App", "App.OrderService")
///     .implementing(TypeRef::interface("App.IOrderService"))
///     .with_marker(Marker::Intercept { interceptor: TypeRef::class("App.Timing"), order: 0 })
///     .with_method(MethodDecl::new("Place"));
///
/// let mut diagnostics = Vec::new();
/// let plan = plan_interception(&decl, &[TypeRef::interface("App.IOrderService")], &mut diagnostics).unwrap();
/// assert_eq!(plan.proxy_name, "App.OrderServiceProxy");
/// assert_eq!(plan.methods[0].interceptors.len(), 1);
/// ```
pub fn plan_interception(
    declaration: &TypeDeclaration,
    interfaces: &[TypeRef],
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<InterceptedService> {
    let type_level: Vec<InterceptorRef> = interceptors_of(&declaration.markers).collect();

    let methods: Vec<InterceptedMethod> = declaration
        .methods
        .iter()
        .filter(|m| m.accessibility == Accessibility::Public && !m.is_static)
        .filter_map(|method| {
            let mut interceptors: Vec<InterceptorRef> =
                type_level.iter().cloned().chain(interceptors_of(&method.markers)).collect();
            if interceptors.is_empty() {
                return None;
            }
            interceptors.sort_by(|a, b| {
                a.order
                    .cmp(&b.order)
                    .then_with(|| a.interceptor.to_string().cmp(&b.interceptor.to_string()))
            });
            let mut seen = BTreeSet::new();
            interceptors.retain(|i| seen.insert(i.interceptor.clone()));
            Some(InterceptedMethod {
                name: method.name.clone(),
                interceptors,
            })
        })
        .collect();

    if methods.is_empty() {
        return None;
    }
    if interfaces.is_empty() {
        diagnostics.push(Diagnostic::at(
            DiagnosticId::InterceptedWithoutInterface,
            vec![declaration.name.clone()],
            declaration.location.as_ref(),
            &declaration.module,
        ));
        return None;
    }

    let simple = simple_name(&declaration.name);
    let proxy_name = match namespace_of(&declaration.name) {
        "" => format!("{simple}Proxy"),
        namespace => format!("{namespace}.{simple}Proxy"),
    };
    Some(InterceptedService {
        service: declaration.name.clone(),
        module: declaration.module.clone(),
        proxy_name,
        interfaces: interfaces.to_vec(),
        methods,
        location: declaration.location.clone(),
    })
}
