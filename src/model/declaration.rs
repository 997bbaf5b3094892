//! Type declarations supplied by the compiler front-end.
//!
//! Everything here is read-only input. The builder-style helpers
//! (`with_marker`, `with_constructor`, ...) exist so front-end adapters and
//! tests can assemble declarations without spelling out every field.

use serde::{Deserialize, Serialize};

use crate::lifetime::Lifetime;
use crate::model::type_ref::{simple_name, TypeRef, TypeRefKind};

/// Declared accessibility of a type or member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Accessibility {
    #[default]
    Public,
    Internal,
    Protected,
    Private,
}

/// What kind of type a declaration introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeclarationKind {
    #[default]
    Class,
    Record,
    Struct,
    Interface,
    Enum,
    Delegate,
}

/// Where a declaration lives in source, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// A constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeRef,
    /// Named-instance discriminator from a parameter-level marker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            key: None,
        }
    }

    pub fn keyed(name: impl Into<String>, ty: TypeRef, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            key: Some(key.into()),
        }
    }
}

/// One constructor of a type, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConstructorCandidate {
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
}

impl ConstructorCandidate {
    pub fn parameterless() -> Self {
        Self::default()
    }

    pub fn with_parameters(parameters: Vec<Parameter>) -> Self {
        Self {
            accessibility: Accessibility::Public,
            parameters,
        }
    }

    pub fn is_parameterless(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// How a property can be assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Setter {
    /// Read-only
    None,
    /// Ordinary setter
    #[default]
    Set,
    /// Assignable during initialization only
    Init,
}

/// A property, as needed for configuration binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDecl {
    pub name: String,
    pub ty: TypeRef,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_indexer: bool,
    #[serde(default)]
    pub setter: Setter,
}

impl PropertyDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            is_static: false,
            is_indexer: false,
            setter: Setter::Set,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.setter = Setter::None;
        self
    }

    pub fn init_only(mut self) -> Self {
        self.setter = Setter::Init;
        self
    }
}

/// A method, as needed for interception and validator discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<TypeRef>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            accessibility: Accessibility::Public,
            is_static: false,
            return_type: None,
            parameters: Vec::new(),
            markers: Vec::new(),
        }
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }
}

/// Arguments of a configuration-section marker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectionMarker {
    /// Explicit section path; inferred from the type name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Named options instance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub validate_on_start: bool,
    /// External validator type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<TypeRef>,
    /// Convention validator method name, `Validate` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validate_method: Option<String>,
}

/// A role marker with its literal arguments.
///
/// The front-end reports markers as plain data; the classifier pattern
/// matches on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    /// Never register this type
    ExemptFromRegistration,
    /// Never construct this type through injection
    ExemptFromInjection,
    Lifetime(Lifetime),
    /// Register under a service key
    Keyed(String),
    DecoratorFor { target: TypeRef, order: i32 },
    OpenDecoratorFor { target: TypeRef, order: i32 },
    FactorySource,
    ConfigurationSection(SectionMarker),
    Intercept { interceptor: TypeRef, order: i32 },
    /// On an interface: implementations are plugins
    PluginContract,
    /// Explicit plugin ordering value
    Order(i32),
}

impl Marker {
    /// Short label for generated metadata, e.g. `Keyed(primary)`.
    pub fn label(&self) -> String {
        match self {
            Marker::ExemptFromRegistration => "ExemptFromRegistration".to_string(),
            Marker::ExemptFromInjection => "ExemptFromInjection".to_string(),
            Marker::Lifetime(lifetime) => format!("Lifetime({lifetime})"),
            Marker::Keyed(key) => format!("Keyed({key})"),
            Marker::DecoratorFor { target, order } => format!("DecoratorFor({target}, {order})"),
            Marker::OpenDecoratorFor { target, order } => format!("OpenDecoratorFor({target}, {order})"),
            Marker::FactorySource => "FactorySource".to_string(),
            Marker::ConfigurationSection(section) => {
                format!("ConfigurationSection({})", section.section.as_deref().unwrap_or("*"))
            }
            Marker::Intercept { interceptor, order } => format!("Intercept({interceptor}, {order})"),
            Marker::PluginContract => "PluginContract".to_string(),
            Marker::Order(order) => format!("Order({order})"),
        }
    }
}

/// A type declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    /// Qualified name, e.g. `App.Services.OrderService`
    pub name: String,
    /// Declaring module
    pub module: String,
    #[serde(default)]
    pub kind: DeclarationKind,
    #[serde(default)]
    pub accessibility: Accessibility,
    /// Accessibility of enclosing types, outermost first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containing: Vec<Accessibility>,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_static: bool,
    /// Open for generated members (e.g. a generated parameterless constructor)
    #[serde(default)]
    pub is_extensible: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_parameters: Vec<String>,
    #[serde(default)]
    pub interfaces: Vec<TypeRef>,
    #[serde(default)]
    pub constructors: Vec<ConstructorCandidate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_members: Vec<String>,
    #[serde(default)]
    pub markers: Vec<Marker>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl TypeDeclaration {
    /// A public concrete class with no members.
    pub fn class(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: module.into(),
            kind: DeclarationKind::Class,
            accessibility: Accessibility::Public,
            containing: Vec::new(),
            is_abstract: false,
            is_static: false,
            is_extensible: false,
            type_parameters: Vec::new(),
            interfaces: Vec::new(),
            constructors: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            enum_members: Vec::new(),
            markers: Vec::new(),
            location: None,
        }
    }

    /// A public interface.
    pub fn interface(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: DeclarationKind::Interface,
            is_abstract: true,
            ..Self::class(module, name)
        }
    }

    /// A public enum with the given members.
    pub fn enumeration(module: impl Into<String>, name: impl Into<String>, members: &[&str]) -> Self {
        Self {
            kind: DeclarationKind::Enum,
            enum_members: members.iter().map(|m| m.to_string()).collect(),
            ..Self::class(module, name)
        }
    }

    pub fn with_kind(mut self, kind: DeclarationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_accessibility(mut self, accessibility: Accessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn nested_in(mut self, containing: Accessibility) -> Self {
        self.containing.push(containing);
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn extensible(mut self) -> Self {
        self.is_extensible = true;
        self
    }

    pub fn with_type_parameter(mut self, name: impl Into<String>) -> Self {
        self.type_parameters.push(name.into());
        self
    }

    pub fn implementing(mut self, interface: TypeRef) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_constructor(mut self, constructor: ConstructorCandidate) -> Self {
        self.constructors.push(constructor);
        self
    }

    pub fn with_property(mut self, property: PropertyDecl) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_method(mut self, method: MethodDecl) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn at(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.location = Some(SourceLocation {
            file: file.into(),
            line,
            column,
        });
        self
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    /// The declaration as a reference, with its own type parameters as
    /// arguments.
    pub fn as_type_ref(&self) -> TypeRef {
        let kind = match self.kind {
            DeclarationKind::Interface => TypeRefKind::Interface,
            DeclarationKind::Struct => TypeRefKind::Struct,
            DeclarationKind::Enum => TypeRefKind::Enum,
            DeclarationKind::Delegate => TypeRefKind::Delegate,
            DeclarationKind::Class | DeclarationKind::Record => TypeRefKind::Class,
        };
        let mut type_ref = TypeRef::new(self.name.clone(), kind);
        type_ref.args = self.type_parameters.iter().map(TypeRef::type_param).collect();
        type_ref
    }

    pub fn has_marker(&self, predicate: impl Fn(&Marker) -> bool) -> bool {
        self.markers.iter().any(predicate)
    }

    /// Concrete class or record.
    pub fn is_concrete_class(&self) -> bool {
        matches!(self.kind, DeclarationKind::Class | DeclarationKind::Record)
            && !self.is_abstract
            && !self.is_static
    }

    /// Accessibility chain contains nothing narrower than `Public`.
    pub fn is_publicly_reachable(&self) -> bool {
        self.accessibility == Accessibility::Public
            && self.containing.iter().all(|a| *a == Accessibility::Public)
    }

    /// Reachable from generated code compiled into the same module.
    pub fn is_reachable_within_module(&self) -> bool {
        std::iter::once(&self.accessibility)
            .chain(self.containing.iter())
            .all(|a| matches!(a, Accessibility::Public | Accessibility::Internal))
    }

    /// Constructors that generated code may call.
    pub fn callable_constructors(&self) -> impl Iterator<Item = (usize, &ConstructorCandidate)> {
        self.constructors
            .iter()
            .enumerate()
            .filter(|(_, c)| matches!(c.accessibility, Accessibility::Public | Accessibility::Internal))
    }

    /// Types without declared constructors get an implicit parameterless one.
    pub fn has_callable_parameterless_constructor(&self) -> bool {
        self.constructors.is_empty() || self.callable_constructors().any(|(_, c)| c.is_parameterless())
    }

    /// Declared constructors, or the implicit parameterless one.
    pub fn effective_constructors(&self) -> Vec<(usize, ConstructorCandidate)> {
        if self.constructors.is_empty() {
            return vec![(0, ConstructorCandidate::parameterless())];
        }
        self.callable_constructors().map(|(i, c)| (i, c.clone())).collect()
    }
}
