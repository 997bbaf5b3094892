//! References to types as they appear in declarations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Shape of a referenced type, as reported by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TypeRefKind {
    Class,
    Interface,
    Struct,
    Enum,
    Primitive,
    String,
    Delegate,
    TypeParameter,
    Array,
}

/// A (possibly generic) reference to a type.
///
/// `name` is the qualified name without type arguments; the arguments live in
/// `args`. A reference is *open* when any argument is a type parameter,
/// e.g. `App.IHandler<T>`, and *closed* otherwise.
///
/// # Examples
///
/// ```rust
/// use ferrous_di_codegen::model::TypeRef;
///
/// let open = TypeRef::interface("App.IHandler").with_arg(TypeRef::type_param("T"));
/// let closed = TypeRef::interface("App.IHandler").with_arg(TypeRef::class("App.OrderMsg"));
///
/// assert!(open.is_open());
/// assert!(!closed.is_open());
/// assert!(open.same_shape(&closed));
/// assert_eq!(closed.to_string(), "App.IHandler<App.OrderMsg>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
    pub kind: TypeRefKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<TypeRef>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
}

impl TypeRef {
    pub fn new(name: impl Into<String>, kind: TypeRefKind) -> Self {
        Self {
            name: name.into(),
            kind,
            args: Vec::new(),
            nullable: false,
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeRefKind::Class)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeRefKind::Interface)
    }

    pub fn primitive(name: impl Into<String>) -> Self {
        Self::new(name, TypeRefKind::Primitive)
    }

    pub fn string() -> Self {
        Self::new("string", TypeRefKind::String)
    }

    pub fn type_param(name: impl Into<String>) -> Self {
        Self::new(name, TypeRefKind::TypeParameter)
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(name, TypeRefKind::Enum)
    }

    /// Appends a type argument.
    pub fn with_arg(mut self, arg: TypeRef) -> Self {
        self.args.push(arg);
        self
    }

    /// Marks the reference as nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Name with type arguments erased.
    pub fn base_name(&self) -> &str {
        &self.name
    }

    /// Last segment of the qualified name.
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// True when any argument (transitively) is a type parameter.
    pub fn is_open(&self) -> bool {
        self.kind == TypeRefKind::TypeParameter || self.args.iter().any(TypeRef::is_open)
    }

    /// Same erased base name and arity.
    pub fn same_shape(&self, other: &TypeRef) -> bool {
        self.name == other.name && self.arity() == other.arity()
    }

    /// Structural equality ignoring nullability annotations.
    pub fn same_type(&self, other: &TypeRef) -> bool {
        self.name == other.name
            && self.args.len() == other.args.len()
            && self.args.iter().zip(&other.args).all(|(a, b)| a.same_type(b))
    }

    /// True for class and interface references, the shapes a container can
    /// construct or resolve on its own.
    pub fn is_reference_type(&self) -> bool {
        matches!(self.kind, TypeRefKind::Class | TypeRefKind::Interface)
    }

    /// Replaces type parameters according to `bindings`.
    pub fn substitute(&self, bindings: &BTreeMap<String, TypeRef>) -> TypeRef {
        if self.kind == TypeRefKind::TypeParameter {
            if let Some(bound) = bindings.get(&self.name) {
                return bound.clone();
            }
        }
        TypeRef {
            name: self.name.clone(),
            kind: self.kind,
            args: self.args.iter().map(|a| a.substitute(bindings)).collect(),
            nullable: self.nullable,
        }
    }

    /// Binds the type parameters of `self` (an open shape) against a closed
    /// reference of the same shape, position by position.
    pub fn bind_against(&self, closed: &TypeRef) -> Option<BTreeMap<String, TypeRef>> {
        if !self.same_shape(closed) {
            return None;
        }
        let mut bindings = BTreeMap::new();
        for (open, concrete) in self.args.iter().zip(&closed.args) {
            if open.kind == TypeRefKind::TypeParameter {
                match bindings.get(&open.name) {
                    Some(existing) if existing != concrete => return None,
                    _ => {
                        bindings.insert(open.name.clone(), concrete.clone());
                    }
                }
            } else if open.is_open() {
                bindings.extend(open.bind_against(concrete)?);
            } else if !open.same_type(concrete) {
                return None;
            }
        }
        Some(bindings)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(">")?;
        }
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

/// Last `.`-separated segment of a qualified name.
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

/// Everything before the last `.` of a qualified name.
pub fn namespace_of(qualified: &str) -> &str {
    qualified.rsplit_once('.').map(|(ns, _)| ns).unwrap_or("")
}
