//! Schema snapshot consumed by the generator.
//!
//! The generator never mutates a schema. Declarations are immutable once a
//! provider hands them out, and providers must return types in the same order
//! on every call within a run.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use serde::{Deserialize, Serialize};

use crate::diagnostics::SourceLocation;

/// Package-qualified type name. The package is a `::`-separated module path
/// relative to the crate root; the root module is the empty package.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeId {
    package: String,
    name: String,
}

impl TypeId {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module path segments of the package.
    pub fn package_segments(&self) -> impl Iterator<Item = &str> {
        self.package.split("::").filter(|segment| !segment.is_empty())
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}::{}", self.package, self.name)
        }
    }
}

/// Named field or tuple-struct position.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldName {
    Named(String),
    Index(usize),
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Resolved identity of a field's type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Primitives, std types, generic parameters and non-path types. Ends recursion.
    Builtin(String),
    /// A record declared in the schema.
    Declared(TypeId),
    /// The provider could not tell what this is. Treated as opaque.
    Unresolved(String),
}

impl FieldType {
    pub fn builtin(name: impl Into<String>) -> Self {
        Self::Builtin(name.into())
    }

    pub fn declared(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Declared(TypeId::new(package, name))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(name) | Self::Unresolved(name) => f.write_str(name),
            Self::Declared(id) => id.fmt(f),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDeclaration {
    pub name: FieldName,
    pub ty: FieldType,
    pub sensitive: bool,
    /// Package the field is visible from, including its child modules. Empty
    /// means visible crate-wide.
    pub visible_in: String,
    pub location: Option<SourceLocation>,
}

impl FieldDeclaration {
    pub fn named(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: FieldName::Named(name.into()),
            ty,
            sensitive: false,
            visible_in: String::new(),
            location: None,
        }
    }

    pub fn indexed(index: usize, ty: FieldType) -> Self {
        Self {
            name: FieldName::Index(index),
            ty,
            sensitive: false,
            visible_in: String::new(),
            location: None,
        }
    }

    /// Marks the field with the sensitive-field marker.
    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Restricts the field to `package` and its descendants.
    #[must_use]
    pub fn visible_in(mut self, package: impl Into<String>) -> Self {
        self.visible_in = package.into();
        self
    }

    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Whether code in `package` can name this field.
    pub fn is_visible_from(&self, package: &str) -> bool {
        self.visible_in.is_empty()
            || package == self.visible_in
            || package
                .strip_prefix(self.visible_in.as_str())
                .is_some_and(|rest| rest.starts_with("::"))
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self.ty, FieldType::Builtin(_))
    }

    pub fn declared_type(&self) -> Option<&TypeId> {
        match &self.ty {
            FieldType::Declared(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDeclaration {
    pub id: TypeId,
    pub fields: Vec<FieldDeclaration>,
    /// Derives and marker traits implemented by the type, by last path segment.
    pub supertypes: BTreeSet<String>,
    /// Names of the type's generic type and const parameters.
    pub generics: Vec<String>,
    /// Lifetime parameters, with their leading `'`.
    pub lifetimes: Vec<String>,
    pub location: Option<SourceLocation>,
}

impl TypeDeclaration {
    pub fn new(id: TypeId) -> Self {
        Self {
            id,
            fields: Vec::new(),
            supertypes: BTreeSet::new(),
            generics: Vec::new(),
            lifetimes: Vec::new(),
            location: None,
        }
    }

    #[must_use]
    pub fn field(mut self, field: FieldDeclaration) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn supertype(mut self, name: impl Into<String>) -> Self {
        self.supertypes.insert(name.into());
        self
    }

    #[must_use]
    pub fn generic(mut self, param: impl Into<String>) -> Self {
        self.generics.push(param.into());
        self
    }

    #[must_use]
    pub fn lifetime(mut self, lifetime: impl Into<String>) -> Self {
        self.lifetimes.push(lifetime.into());
        self
    }

    pub fn is_tuple(&self) -> bool {
        self.fields
            .first()
            .is_some_and(|field| matches!(field.name, FieldName::Index(_)))
    }
}

/// The host's view of declared record types.
pub trait SchemaProvider {
    /// All declared types, in a stable order.
    fn all_declared_types(&self) -> &[TypeDeclaration];

    /// Name of the eligible-model marker (matched against supertypes).
    fn model_marker(&self) -> &str;

    /// Whether the eligible-model marker itself resolves in this round.
    fn resolve_marker(&self) -> bool;

    fn declaration(&self, id: &TypeId) -> Option<&TypeDeclaration> {
        self.all_declared_types().iter().find(|decl| &decl.id == id)
    }

    fn fields(&self, id: &TypeId) -> &[FieldDeclaration] {
        self.declaration(id).map_or(&[], |decl| decl.fields.as_slice())
    }

    fn is_eligible_marker_present(&self, id: &TypeId) -> bool {
        self.declaration(id)
            .is_some_and(|decl| decl.supertypes.contains(self.model_marker()))
    }
}

/// Provider over declarations assembled by hand.
#[derive(Clone, Debug)]
pub struct InMemorySchema {
    marker: String,
    marker_resolved: bool,
    types: Vec<TypeDeclaration>,
    index: BTreeMap<TypeId, usize>,
}

impl InMemorySchema {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            marker_resolved: true,
            types: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// Adds a declaration. A later declaration with the same id replaces the
    /// earlier one in place.
    #[must_use]
    pub fn declare(mut self, decl: TypeDeclaration) -> Self {
        if let Some(&slot) = self.index.get(&decl.id) {
            self.types[slot] = decl;
        } else {
            self.index.insert(decl.id.clone(), self.types.len());
            self.types.push(decl);
        }
        self
    }

    #[must_use]
    pub fn with_marker_resolved(mut self, resolved: bool) -> Self {
        self.marker_resolved = resolved;
        self
    }
}

impl SchemaProvider for InMemorySchema {
    fn all_declared_types(&self) -> &[TypeDeclaration] {
        &self.types
    }

    fn model_marker(&self) -> &str {
        &self.marker
    }

    fn resolve_marker(&self) -> bool {
        self.marker_resolved
    }

    fn declaration(&self, id: &TypeId) -> Option<&TypeDeclaration> {
        self.index.get(id).map(|&slot| &self.types[slot])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_id_display() {
        assert_eq!(TypeId::new("", "Inner").to_string(), "Inner");
        assert_eq!(
            TypeId::new("models::billing", "Card").to_string(),
            "models::billing::Card"
        );
        let id = TypeId::new("models::billing", "Card");
        assert_eq!(id.package_segments().collect::<Vec<_>>(), ["models", "billing"]);
        assert_eq!(TypeId::new("", "Card").package_segments().count(), 0);
    }

    #[test]
    fn marker_presence_uses_supertypes() {
        let schema = InMemorySchema::new("Model")
            .declare(TypeDeclaration::new(TypeId::new("m", "A")).supertype("Model"))
            .declare(TypeDeclaration::new(TypeId::new("m", "B")).supertype("Clone"));
        assert!(schema.is_eligible_marker_present(&TypeId::new("m", "A")));
        assert!(!schema.is_eligible_marker_present(&TypeId::new("m", "B")));
        assert!(!schema.is_eligible_marker_present(&TypeId::new("m", "Missing")));
    }

    #[test]
    fn redeclaring_replaces_in_place() {
        let schema = InMemorySchema::new("Model")
            .declare(TypeDeclaration::new(TypeId::new("m", "A")))
            .declare(TypeDeclaration::new(TypeId::new("m", "B")))
            .declare(
                TypeDeclaration::new(TypeId::new("m", "A"))
                    .field(FieldDeclaration::named("x", FieldType::builtin("u8"))),
            );
        let names: Vec<_> = schema
            .all_declared_types()
            .iter()
            .map(|decl| decl.id.name().to_string())
            .collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(schema.fields(&TypeId::new("m", "A")).len(), 1);
    }

    #[test]
    fn tuple_detection() {
        let tuple = TypeDeclaration::new(TypeId::new("", "T"))
            .field(FieldDeclaration::indexed(0, FieldType::builtin("String")));
        assert!(tuple.is_tuple());
        assert!(!TypeDeclaration::new(TypeId::new("", "U")).is_tuple());
    }

    #[test]
    fn field_visibility_covers_descendant_packages() {
        let public = FieldDeclaration::named("brand", FieldType::builtin("String"));
        assert!(public.is_visible_from(""));
        assert!(public.is_visible_from("models"));

        let private = FieldDeclaration::named("number", FieldType::builtin("String"))
            .visible_in("models::vault");
        assert!(private.is_visible_from("models::vault"));
        assert!(private.is_visible_from("models::vault::audit"));
        assert!(!private.is_visible_from("models"));
        assert!(!private.is_visible_from("models::vaults"));
        assert!(!private.is_visible_from(""));
    }
}
