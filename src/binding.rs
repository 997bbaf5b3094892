//! Configuration binding planner.
//!
//! Turns configuration-section markers into [`ConfigurationBinding`]s: the
//! section path, a per-property coercion plan, and validator wiring. Types
//! that only appear nested inside another binding are dropped from the
//! top-level set by [`remove_nested`], since binding the parent binds them.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, DiagnosticId};
use crate::model::{
    DeclarationKind, GraphIndex, Marker, PropertyDecl, SectionMarker, Setter, SourceLocation, TypeDeclaration, TypeRef,
    TypeRefKind,
};

static NUMERIC_TYPES: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    [
        "byte", "sbyte", "short", "ushort", "int", "uint", "long", "ulong", "float", "double", "decimal", "i8", "i16",
        "i32", "i64", "i128", "u8", "u16", "u32", "u64", "u128", "isize", "usize", "f32", "f64", "System.Byte",
        "System.SByte", "System.Int16", "System.UInt16", "System.Int32", "System.UInt32", "System.Int64",
        "System.UInt64", "System.Single", "System.Double", "System.Decimal",
    ]
    .into_iter()
    .collect()
});

static BOOLEAN_TYPES: Lazy<BTreeSet<&'static str>> =
    Lazy::new(|| ["bool", "System.Boolean"].into_iter().collect());

static TEMPORAL_TYPES: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    [
        "DateTime",
        "DateTimeOffset",
        "TimeSpan",
        "DateOnly",
        "TimeOnly",
        "System.DateTime",
        "System.DateTimeOffset",
        "System.TimeSpan",
        "System.DateOnly",
        "System.TimeOnly",
    ]
    .into_iter()
    .collect()
});

static GUID_TYPES: Lazy<BTreeSet<&'static str>> = Lazy::new(|| ["Guid", "System.Guid"].into_iter().collect());

const SECTION_SUFFIXES: [&str; 3] = ["Options", "Settings", "Configuration"];

/// How a raw configuration string becomes a property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coercion {
    /// Strings are assigned as-is
    Passthrough,
    /// Try-parse into the named numeric type
    Numeric(String),
    Boolean,
    /// Try-parse into the named date/time type
    Temporal(String),
    Guid,
    /// Case-insensitive member name parse
    Enum { type_name: String, members: Vec<String> },
    /// Bound recursively from the `section:Property` child section
    Nested { type_name: String, properties: Vec<BindableProperty> },
}

/// A property that takes part in binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindableProperty {
    pub name: String,
    pub ty: TypeRef,
    pub nullable: bool,
    /// Assignable only during initialization
    pub init_only: bool,
    pub coercion: Coercion,
}

/// Validator attached to a binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidatorRef {
    /// External validator type
    External(TypeRef),
    /// Instance method on the bound type
    Method(String),
}

impl std::fmt::Display for ValidatorRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidatorRef::External(ty) => write!(f, "{ty}"),
            ValidatorRef::Method(name) => write!(f, "{name}()"),
        }
    }
}

/// One configuration section bound to one type (or named instance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationBinding {
    pub bound_type: String,
    pub module: String,
    pub section: String,
    pub instance_name: Option<String>,
    pub validate_on_start: bool,
    pub validator: Option<ValidatorRef>,
    pub properties: Vec<BindableProperty>,
    /// The type needs a generated parameterless constructor
    pub needs_generated_constructor: bool,
    /// Declared types of settable properties, wrappers removed, whether or
    /// not a coercion rule applies
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

/// Infers a section path from a type's simple name.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::binding::infer_section;
///
/// assert_eq!(infer_section("App.DatabaseOptions"), "Database");
/// assert_eq!(infer_section("App.SmtpSettings"), "Smtp");
/// assert_eq!(infer_section("App.Options"), "Options");
/// assert_eq!(infer_section("App.Retry"), "Retry");
/// ```
pub fn infer_section(type_name: &str) -> String {
    let simple = crate::model::simple_name(type_name);
    SECTION_SUFFIXES
        .iter()
        .find_map(|suffix| simple.strip_suffix(suffix).filter(|rest| !rest.is_empty()))
        .unwrap_or(simple)
        .to_string()
}

/// Plans configuration bindings for declarations.
pub struct BindingPlanner<'a, 'g> {
    index: &'a GraphIndex<'g>,
}

impl<'a, 'g> BindingPlanner<'a, 'g> {
    pub fn new(index: &'a GraphIndex<'g>) -> Self {
        Self { index }
    }

    /// One binding per configuration-section marker on `declaration`.
    pub fn plan(&self, declaration: &TypeDeclaration, diagnostics: &mut Vec<Diagnostic>) -> Vec<ConfigurationBinding> {
        let markers: Vec<&SectionMarker> = declaration
            .markers
            .iter()
            .filter_map(|m| match m {
                Marker::ConfigurationSection(section) => Some(section),
                _ => None,
            })
            .collect();
        if markers.is_empty() {
            return Vec::new();
        }

        let mut visiting = BTreeSet::new();
        visiting.insert(declaration.name.clone());
        let properties = self.bindable_properties(declaration, &mut visiting);
        let property_types: Vec<String> = settable(declaration)
            .map(|p| unwrap_nullable(&p.ty).0.base_name().to_string())
            .filter(|name| *name != declaration.name)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let has_parameterless = declaration.has_callable_parameterless_constructor();
        let needs_generated_constructor = !has_parameterless && declaration.is_extensible;
        if !has_parameterless && !declaration.is_extensible {
            diagnostics.push(Diagnostic::at(
                DiagnosticId::ConfigurationTypeNotExtensible,
                vec![declaration.name.clone()],
                declaration.location.as_ref(),
                &declaration.module,
            ));
        }

        markers
            .into_iter()
            .map(|marker| {
                let section = marker
                    .section
                    .clone()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| infer_section(&declaration.name));
                let available = self.find_validator(declaration, marker);
                let validator = if marker.validate_on_start {
                    available
                } else {
                    if let Some(unused) = &available {
                        let binding_label = match &marker.name {
                            Some(name) => format!("{section} ({name})"),
                            None => section.clone(),
                        };
                        diagnostics.push(Diagnostic::at(
                            DiagnosticId::ValidatorUnused,
                            vec![declaration.name.clone(), unused.to_string(), binding_label],
                            declaration.location.as_ref(),
                            &declaration.module,
                        ));
                    }
                    None
                };
                ConfigurationBinding {
                    bound_type: declaration.name.clone(),
                    module: declaration.module.clone(),
                    section,
                    instance_name: marker.name.clone(),
                    validate_on_start: marker.validate_on_start,
                    validator,
                    properties: properties.clone(),
                    needs_generated_constructor,
                    property_types: property_types.clone(),
                    location: declaration.location.clone(),
                }
            })
            .collect()
    }

    /// Explicit validator type first, then the convention method.
    fn find_validator(&self, declaration: &TypeDeclaration, marker: &SectionMarker) -> Option<ValidatorRef> {
        if let Some(external) = &marker.validator {
            return Some(ValidatorRef::External(external.clone()));
        }
        let method_name = marker.validate_method.as_deref().unwrap_or("Validate");
        declaration
            .methods
            .iter()
            .find(|m| m.name == method_name && !m.is_static && m.parameters.is_empty())
            .map(|m| ValidatorRef::Method(m.name.clone()))
    }

    fn bindable_properties(&self, declaration: &TypeDeclaration, visiting: &mut BTreeSet<String>) -> Vec<BindableProperty> {
        settable(declaration)
            .filter_map(|p| self.bindable(declaration, p, visiting))
            .collect()
    }

    fn bindable(
        &self,
        declaration: &TypeDeclaration,
        property: &PropertyDecl,
        visiting: &mut BTreeSet<String>,
    ) -> Option<BindableProperty> {
        let (ty, nullable) = unwrap_nullable(&property.ty);
        let coercion = match self.coercion_for(ty, visiting) {
            Some(coercion) => coercion,
            None => {
                tracing::trace!(
                    owner = %declaration.name,
                    property = %property.name,
                    ty = %property.ty,
                    "skipping configuration property with no coercion rule"
                );
                return None;
            }
        };
        Some(BindableProperty {
            name: property.name.clone(),
            ty: property.ty.clone(),
            nullable,
            init_only: property.setter == Setter::Init,
            coercion,
        })
    }

    fn coercion_for(&self, ty: &TypeRef, visiting: &mut BTreeSet<String>) -> Option<Coercion> {
        let name = ty.base_name();
        if ty.kind == TypeRefKind::String || name == "string" || name == "System.String" {
            return Some(Coercion::Passthrough);
        }
        if NUMERIC_TYPES.contains(name) {
            return Some(Coercion::Numeric(name.to_string()));
        }
        if BOOLEAN_TYPES.contains(name) {
            return Some(Coercion::Boolean);
        }
        if TEMPORAL_TYPES.contains(name) {
            return Some(Coercion::Temporal(name.to_string()));
        }
        if GUID_TYPES.contains(name) {
            return Some(Coercion::Guid);
        }
        let declared = self.index.resolve(ty);
        if ty.kind == TypeRefKind::Enum || declared.is_some_and(|d| d.kind == DeclarationKind::Enum) {
            let members = declared.map(|d| d.enum_members.clone()).unwrap_or_default();
            return Some(Coercion::Enum {
                type_name: name.to_string(),
                members,
            });
        }
        let nested = declared?;
        let nestable = ty.kind == TypeRefKind::Class
            && ty.args.is_empty()
            && matches!(nested.kind, DeclarationKind::Class | DeclarationKind::Record)
            && !nested.is_abstract
            && (nested.has_callable_parameterless_constructor() || nested.is_extensible);
        if !nestable || !visiting.insert(nested.name.clone()) {
            return None;
        }
        let properties = self.bindable_properties(nested, visiting);
        visiting.remove(&nested.name);
        Some(Coercion::Nested {
            type_name: nested.name.clone(),
            properties,
        })
    }
}

fn settable(declaration: &TypeDeclaration) -> impl Iterator<Item = &PropertyDecl> {
    declaration
        .properties
        .iter()
        .filter(|p| !p.is_static && !p.is_indexer && p.setter != Setter::None)
}

fn unwrap_nullable(ty: &TypeRef) -> (&TypeRef, bool) {
    let wrapper = matches!(ty.base_name(), "Nullable" | "System.Nullable" | "Option");
    if wrapper && ty.args.len() == 1 {
        (&ty.args[0], true)
    } else {
        (ty, ty.nullable)
    }
}

/// Every type bound as a nested property somewhere inside `coercion`.
fn collect_nested<'b>(properties: &'b [BindableProperty], out: &mut BTreeSet<&'b str>) {
    for property in properties {
        if let Coercion::Nested { type_name, properties } = &property.coercion {
            out.insert(type_name.as_str());
            collect_nested(properties, out);
        }
    }
}

/// Removes bindings whose type is bound implicitly as a property of another
/// binding.
///
/// A binding's own property types count even when no coercion applied to
/// them, as do types nested further down through [`Coercion::Nested`]. A
/// type referencing itself does not count as nesting.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::binding::{remove_nested, BindableProperty, Coercion, ConfigurationBinding};
/// use ferrous_di_codegen::model::TypeRef;
///
/// fn binding(ty: &str, properties: Vec<BindableProperty>) -> ConfigurationBinding {
///     ConfigurationBinding {
///         bound_type: ty.into(),
///         module: "App".into(),
///         section: ty.into(),
///         instance_name: None,
///         validate_on_start: false,
///         validator: None,
///         properties,
///         needs_generated_constructor: false,
///         property_types: vec![],
///         location: None,
///     }
/// }
///
/// let child_property = BindableProperty {
///     name: "Retry".into(),
///     ty: TypeRef::class("App.RetryOptions"),
///     nullable: false,
///     init_only: false,
///     coercion: Coercion::Nested { type_name: "App.RetryOptions".into(), properties: vec![] },
/// };
/// let kept = remove_nested(vec![
///     binding("App.HttpOptions", vec![child_property]),
///     binding("App.RetryOptions", vec![]),
/// ]);
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].bound_type, "App.HttpOptions");
/// ```
pub fn remove_nested(bindings: Vec<ConfigurationBinding>) -> Vec<ConfigurationBinding> {
    let nested: BTreeSet<String> = bindings
        .iter()
        .flat_map(|binding| {
            let mut found: BTreeSet<&str> = binding.property_types.iter().map(String::as_str).collect();
            collect_nested(&binding.properties, &mut found);
            found.remove(binding.bound_type.as_str());
            found.into_iter().map(str::to_string).collect::<Vec<_>>()
        })
        .collect();
    let (kept, dropped): (Vec<_>, Vec<_>) = bindings
        .into_iter()
        .partition(|b| !nested.contains(&b.bound_type));
    for binding in &dropped {
        tracing::debug!(ty = %binding.bound_type, section = %binding.section, "dropping nested configuration binding");
    }
    kept
}
