//! Input data model: the declaration graph contract between the compiler
//! front-end and the engine.

mod declaration;
mod graph;
mod type_ref;

pub use declaration::{
    Accessibility, ConstructorCandidate, DeclarationKind, Marker, MethodDecl, Parameter, PropertyDecl,
    SectionMarker, Setter, SourceLocation, TypeDeclaration,
};
pub use graph::{GraphIndex, ModuleDecl, TypeGraph};
pub use type_ref::{namespace_of, simple_name, TypeRef, TypeRefKind};
