//! Sensitivity resolution.
//!
//! Walks a type's fields depth-first in declaration order and records the path
//! of every field carrying the sensitive marker. For each field:
//!
//! 1. if it is sensitive, its path is recorded
//! 2. if its type is builtin, traversal stops
//! 3. if its type is already on the current path, traversal stops (cycle guard)
//! 4. otherwise traversal descends into the field's type
//!
//! Unresolved field types contribute nothing and are not descended into. Both
//! unresolved types and cycle cuts are returned alongside the paths so the
//! caller can report them; resolution itself has no side effects.

use std::fmt;

use crate::{
    diagnostics::SourceLocation,
    error::GenerationError,
    schema::{FieldName, FieldType, SchemaProvider, TypeId},
};

/// Field names leading from a root type to a sensitive field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MaskedPath(Vec<FieldName>);

impl MaskedPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a dotted path; numeric segments become tuple positions.
    pub fn parse(dotted: &str) -> Self {
        Self(
            dotted
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(|segment| {
                    segment.parse().map_or_else(
                        |_| FieldName::Named(segment.to_string()),
                        FieldName::Index,
                    )
                })
                .collect(),
        )
    }

    #[must_use]
    pub fn child(&self, name: FieldName) -> Self {
        let mut segments = self.0.clone();
        segments.push(name);
        Self(segments)
    }

    pub fn segments(&self) -> &[FieldName] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The path below `field`, if this path runs through it.
    pub fn strip_field(&self, field: &FieldName) -> Option<Self> {
        match self.0.split_first() {
            Some((head, rest)) if head == field && !rest.is_empty() => Some(Self(rest.to_vec())),
            _ => None,
        }
    }
}

impl fmt::Display for MaskedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Insertion-ordered set of masked paths.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MaskedPaths(Vec<MaskedPath>);

impl MaskedPaths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a path, returning `false` if it was already present.
    pub fn insert(&mut self, path: MaskedPath) -> bool {
        if self.0.contains(&path) {
            return false;
        }
        self.0.push(path);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &MaskedPath> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Paths strictly below `field`, re-rooted at the field's type.
    pub fn below(&self, field: &FieldName) -> Self {
        Self(self.0.iter().filter_map(|p| p.strip_field(field)).collect())
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl<'a> IntoIterator for &'a MaskedPaths {
    type Item = &'a MaskedPath;
    type IntoIter = std::slice::Iter<'a, MaskedPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<MaskedPath> for MaskedPaths {
    fn from_iter<I: IntoIterator<Item = MaskedPath>>(iter: I) -> Self {
        let mut paths = Self::new();
        for path in iter {
            paths.insert(path);
        }
        paths
    }
}

/// A field whose type the provider could not resolve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedField {
    pub owner: TypeId,
    pub path: MaskedPath,
    pub ty: String,
    pub location: Option<SourceLocation>,
}

/// A point where the cycle guard stopped traversal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleCut {
    pub ty: TypeId,
    pub path: MaskedPath,
    pub location: Option<SourceLocation>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub root: TypeId,
    pub paths: MaskedPaths,
    pub unresolved: Vec<UnresolvedField>,
    pub cycles: Vec<CycleCut>,
}

impl Resolution {
    fn new(root: TypeId) -> Self {
        Self {
            root,
            paths: MaskedPaths::new(),
            unresolved: Vec::new(),
            cycles: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    /// Non-fatal conditions met during traversal, ready for a diagnostic sink.
    pub fn issues(&self) -> Vec<(GenerationError, Option<SourceLocation>)> {
        let unresolved = self.unresolved.iter().map(|u| {
            (
                GenerationError::UnresolvedFieldType {
                    owner: u.owner.clone(),
                    field: u.path.to_string(),
                    ty: u.ty.clone(),
                },
                u.location.clone(),
            )
        });
        let cycles = self.cycles.iter().map(|c| {
            (
                GenerationError::CyclicTypeGraph {
                    ty: c.ty.clone(),
                    path: format!("{}.{}", self.root, c.path),
                },
                c.location.clone(),
            )
        });
        unresolved.chain(cycles).collect()
    }
}

pub struct Resolver<'a, P: ?Sized> {
    schema: &'a P,
}

impl<'a, P: SchemaProvider + ?Sized> Resolver<'a, P> {
    pub fn new(schema: &'a P) -> Self {
        Self { schema }
    }

    /// Resolves every masked path reachable from `root`.
    pub fn resolve(&self, root: &TypeId) -> Resolution {
        self.resolve_on_path(root, vec![root.clone()])
    }

    /// Resolves from `ty` with `on_path` already considered visited.
    pub fn resolve_on_path(&self, ty: &TypeId, mut on_path: Vec<TypeId>) -> Resolution {
        let mut resolution = Resolution::new(ty.clone());
        self.walk(ty, &MaskedPath::root(), &mut on_path, &mut resolution);
        resolution
    }

    fn walk(
        &self,
        ty: &TypeId,
        prefix: &MaskedPath,
        on_path: &mut Vec<TypeId>,
        out: &mut Resolution,
    ) {
        for field in self.schema.fields(ty) {
            let path = prefix.child(field.name.clone());
            if field.sensitive {
                out.paths.insert(path.clone());
            }
            match &field.ty {
                FieldType::Builtin(_) => {}
                FieldType::Unresolved(text) => out.unresolved.push(UnresolvedField {
                    owner: ty.clone(),
                    path,
                    ty: text.clone(),
                    location: field.location.clone(),
                }),
                FieldType::Declared(next) => {
                    if on_path.contains(next) {
                        out.cycles.push(CycleCut {
                            ty: next.clone(),
                            path,
                            location: field.location.clone(),
                        });
                    } else if self.schema.declaration(next).is_none() {
                        out.unresolved.push(UnresolvedField {
                            owner: ty.clone(),
                            path,
                            ty: next.to_string(),
                            location: field.location.clone(),
                        });
                    } else {
                        on_path.push(next.clone());
                        self.walk(next, &path, on_path, out);
                        on_path.pop();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDeclaration, InMemorySchema, TypeDeclaration};

    fn text() -> FieldType {
        FieldType::builtin("String")
    }

    fn scenario_two() -> InMemorySchema {
        InMemorySchema::new("Model")
            .declare(
                TypeDeclaration::new(TypeId::new("app", "A1"))
                    .supertype("Model")
                    .field(FieldDeclaration::named("a1", text()).sensitive())
                    .field(FieldDeclaration::named(
                        "b1",
                        FieldType::declared("app", "B1"),
                    ))
                    .field(FieldDeclaration::named(
                        "d1",
                        FieldType::declared("app", "D1"),
                    )),
            )
            .declare(
                TypeDeclaration::new(TypeId::new("app", "B1"))
                    .field(FieldDeclaration::named("b1", text()))
                    .field(FieldDeclaration::named(
                        "c1",
                        FieldType::declared("app", "C1"),
                    )),
            )
            .declare(
                TypeDeclaration::new(TypeId::new("app", "C1"))
                    .field(FieldDeclaration::named("c1", text()).sensitive()),
            )
            .declare(
                TypeDeclaration::new(TypeId::new("app", "D1"))
                    .field(FieldDeclaration::named("d1", text())),
            )
    }

    #[test]
    fn collects_nested_paths_in_declaration_order() {
        let schema = scenario_two();
        let resolution = Resolver::new(&schema).resolve(&TypeId::new("app", "A1"));
        assert_eq!(resolution.paths.to_strings(), ["a1", "b1.c1.c1"]);
        assert!(resolution.is_complete());
        assert!(resolution.cycles.is_empty());
    }

    #[test]
    fn type_without_sensitive_fields_has_no_paths() {
        let schema = scenario_two();
        let resolution = Resolver::new(&schema).resolve(&TypeId::new("app", "D1"));
        assert!(resolution.paths.is_empty());
    }

    #[test]
    fn sensitive_record_field_is_recorded_and_descended() {
        let schema = InMemorySchema::new("Model")
            .declare(
                TypeDeclaration::new(TypeId::new("", "Outer")).field(
                    FieldDeclaration::named("inner", FieldType::declared("", "Inner")).sensitive(),
                ),
            )
            .declare(
                TypeDeclaration::new(TypeId::new("", "Inner"))
                    .field(FieldDeclaration::named("value", text()).sensitive()),
            );
        let resolution = Resolver::new(&schema).resolve(&TypeId::new("", "Outer"));
        assert_eq!(resolution.paths.to_strings(), ["inner", "inner.value"]);
    }

    #[test]
    fn self_reference_terminates() {
        let schema = InMemorySchema::new("Model").declare(
            TypeDeclaration::new(TypeId::new("", "Node"))
                .field(FieldDeclaration::named("secret", text()).sensitive())
                .field(FieldDeclaration::named(
                    "next",
                    FieldType::declared("", "Node"),
                )),
        );
        let resolution = Resolver::new(&schema).resolve(&TypeId::new("", "Node"));
        assert_eq!(resolution.paths.to_strings(), ["secret"]);
        assert_eq!(resolution.cycles.len(), 1);
        assert_eq!(resolution.cycles[0].path.to_string(), "next");
    }

    #[test]
    fn mutual_recursion_terminates() {
        let schema = InMemorySchema::new("Model")
            .declare(
                TypeDeclaration::new(TypeId::new("", "Left"))
                    .field(FieldDeclaration::named("l", text()).sensitive())
                    .field(FieldDeclaration::named(
                        "right",
                        FieldType::declared("", "Right"),
                    )),
            )
            .declare(
                TypeDeclaration::new(TypeId::new("", "Right"))
                    .field(FieldDeclaration::named("r", text()).sensitive())
                    .field(FieldDeclaration::named(
                        "left",
                        FieldType::declared("", "Left"),
                    )),
            );
        let resolution = Resolver::new(&schema).resolve(&TypeId::new("", "Left"));
        assert_eq!(resolution.paths.to_strings(), ["l", "right.r"]);
        assert_eq!(resolution.cycles[0].path.to_string(), "right.left");

        let issues = resolution.issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].0.kind(), "cyclic_type_graph");
    }

    #[test]
    fn unresolved_types_are_opaque() {
        let schema = InMemorySchema::new("Model")
            .declare(
                TypeDeclaration::new(TypeId::new("", "Audit"))
                    .field(FieldDeclaration::named(
                        "stamp",
                        FieldType::Unresolved("Stamp".into()),
                    ))
                    .field(FieldDeclaration::named(
                        "ghost",
                        FieldType::declared("", "Ghost"),
                    ))
                    .field(FieldDeclaration::named("who", text()).sensitive()),
            );
        let resolution = Resolver::new(&schema).resolve(&TypeId::new("", "Audit"));
        assert_eq!(resolution.paths.to_strings(), ["who"]);
        assert!(!resolution.is_complete());
        let kinds: Vec<_> = resolution.issues().iter().map(|(e, _)| e.kind()).collect();
        assert_eq!(kinds, ["unresolved_field_type", "unresolved_field_type"]);
    }

    #[test]
    fn same_type_reached_twice_is_not_a_cycle() {
        let schema = InMemorySchema::new("Model")
            .declare(
                TypeDeclaration::new(TypeId::new("", "Pair"))
                    .field(FieldDeclaration::named("a", FieldType::declared("", "Leaf")))
                    .field(FieldDeclaration::named("b", FieldType::declared("", "Leaf"))),
            )
            .declare(
                TypeDeclaration::new(TypeId::new("", "Leaf"))
                    .field(FieldDeclaration::named("v", text()).sensitive()),
            );
        let resolution = Resolver::new(&schema).resolve(&TypeId::new("", "Pair"));
        assert_eq!(resolution.paths.to_strings(), ["a.v", "b.v"]);
        assert!(resolution.cycles.is_empty());
    }

    #[test]
    fn paths_below_a_field() {
        let paths: MaskedPaths = ["a1", "b1.c1.c1", "b1.b1", "b1"]
            .into_iter()
            .map(MaskedPath::parse)
            .collect();
        let below = paths.below(&FieldName::Named("b1".into()));
        assert_eq!(below.to_strings(), ["c1.c1", "b1"]);
        assert!(paths.below(&FieldName::Named("d1".into())).is_empty());
    }

    #[test]
    fn tuple_positions_in_paths() {
        let path = MaskedPath::parse("0.secret");
        assert_eq!(path.segments()[0], FieldName::Index(0));
        assert_eq!(path.to_string(), "0.secret");
    }

    #[test]
    fn insert_deduplicates() {
        let mut paths = MaskedPaths::new();
        assert!(paths.insert(MaskedPath::parse("a")));
        assert!(!paths.insert(MaskedPath::parse("a")));
        assert_eq!(paths.len(), 1);
    }
}
