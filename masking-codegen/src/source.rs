//! Schema provider backed by Rust source files.
//!
//! Each input file is parsed with `syn` and assigned a package, the module path
//! it is mounted at (`""` for the crate root). Inline `mod` blocks extend the
//! package. Out-of-line `mod foo;` declarations are not followed; add their
//! files explicitly.
//!
//! Recognized markers:
//! - a struct is a model when it derives the model marker or the same package
//!   contains `impl <marker> for <Struct>`
//! - a field is sensitive when it carries the bare sensitive attribute
//!
//! Field types are resolved in this order: builtin shapes (see `types.rs`),
//! items declared in the same package, `use` imports, glob imports, then
//! `crate::`, `self::` and `super::` paths. Paths into other crates are opaque
//! builtins. Type aliases are followed to their target, resolved in the
//! alias's own package. Anything else is unresolved.
//!
//! Field visibility is recorded as the package a field can be named from, so
//! the synthesizer can refuse to rebuild a struct whose fields it cannot see.

use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, PathBuf},
};

use syn::{punctuated::Punctuated, spanned::Spanned, Fields, Item, Token, UseTree};

use crate::{
    config::GeneratorConfig,
    diagnostics::SourceLocation,
    error::{GenerationError, Result},
    schema::{FieldDeclaration, FieldName, FieldType, SchemaProvider, TypeDeclaration, TypeId},
    types::{classify, type_text, TypeShape},
};

struct RawStruct {
    id: TypeId,
    item: syn::ItemStruct,
    file: PathBuf,
}

#[derive(Default)]
struct Scope {
    /// Imported name (or rename) to the full imported path.
    imports: BTreeMap<String, Vec<String>>,
    /// Struct name to marker traits implemented for it in this package.
    impls: BTreeMap<String, BTreeSet<String>>,
    /// Module paths brought in with `use path::*`.
    globs: Vec<Vec<String>>,
}

/// Alias chains longer than this are reported as unresolved.
const MAX_ALIAS_DEPTH: usize = 16;

pub struct SourceSchemaBuilder {
    config: GeneratorConfig,
    structs: Vec<RawStruct>,
    opaque: BTreeSet<TypeId>,
    aliases: BTreeMap<TypeId, syn::ItemType>,
    scopes: BTreeMap<String, Scope>,
    marker_seen: bool,
}

impl SourceSchemaBuilder {
    /// Parses `path` and mounts it at `package`.
    pub fn file(self, package: &str, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let src = fs::read_to_string(path).map_err(|source| GenerationError::io(path, source))?;
        self.source(package, path, &src)
    }

    /// Parses in-memory source, reporting locations against `label`.
    pub fn source(mut self, package: &str, label: impl AsRef<Path>, src: &str) -> Result<Self> {
        let label = label.as_ref();
        let file = syn::parse_file(src).map_err(|source| GenerationError::Parse {
            path: label.to_path_buf(),
            source,
        })?;
        self.collect(package, label, &file.items);
        Ok(self)
    }

    fn collect(&mut self, package: &str, file: &Path, items: &[Item]) {
        self.scopes.entry(package.to_string()).or_default();
        for item in items {
            match item {
                Item::Struct(item) => {
                    if self.derives(&item.attrs).contains(&self.config.model_marker) {
                        self.marker_seen = true;
                    }
                    self.structs.push(RawStruct {
                        id: TypeId::new(package, item.ident.to_string()),
                        item: item.clone(),
                        file: file.to_path_buf(),
                    });
                }
                Item::Enum(item) => {
                    self.opaque.insert(TypeId::new(package, item.ident.to_string()));
                }
                Item::Union(item) => {
                    self.opaque.insert(TypeId::new(package, item.ident.to_string()));
                }
                Item::Type(item) => {
                    self.aliases
                        .insert(TypeId::new(package, item.ident.to_string()), item.clone());
                }
                Item::Use(item) => {
                    let mut imports = Vec::new();
                    let mut globs = Vec::new();
                    flatten_use(&item.tree, &mut Vec::new(), &mut imports, &mut globs);
                    let scope = self.scopes.entry(package.to_string()).or_default();
                    for (alias, full) in imports {
                        if full.last().is_some_and(|leaf| leaf == &self.config.model_marker) {
                            self.marker_seen = true;
                        }
                        scope.imports.insert(alias, full);
                    }
                    scope.globs.extend(globs);
                }
                Item::Impl(item) => self.collect_impl(package, item),
                Item::Mod(item) => {
                    if let Some((_, items)) = &item.content {
                        let child = join_package(package, &item.ident.to_string());
                        self.collect(&child, file, items);
                    }
                }
                _ => {}
            }
        }
    }

    fn collect_impl(&mut self, package: &str, item: &syn::ItemImpl) {
        let Some((None, trait_path, _)) = &item.trait_ else {
            return;
        };
        let syn::Type::Path(self_ty) = item.self_ty.as_ref() else {
            return;
        };
        let (Some(trait_name), Some(self_name)) =
            (last_ident(trait_path), last_ident(&self_ty.path))
        else {
            return;
        };
        if trait_name == self.config.model_marker {
            self.marker_seen = true;
        }
        self.scopes
            .entry(package.to_string())
            .or_default()
            .impls
            .entry(self_name)
            .or_default()
            .insert(trait_name);
    }

    fn derives(&self, attrs: &[syn::Attribute]) -> BTreeSet<String> {
        attrs
            .iter()
            .filter(|attr| attr.path().is_ident("derive"))
            .filter_map(|attr| {
                attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
                    .ok()
            })
            .flatten()
            .filter_map(|path| last_ident(&path))
            .collect()
    }

    pub fn build(self) -> SourceSchema {
        let declared: BTreeSet<TypeId> = self.structs.iter().map(|raw| raw.id.clone()).collect();
        let packages: BTreeSet<&str> = self.scopes.keys().map(String::as_str).collect();
        let resolver = PathResolver {
            declared: &declared,
            opaque: &self.opaque,
            aliases: &self.aliases,
            packages: &packages,
            scopes: &self.scopes,
        };

        let mut types = Vec::with_capacity(self.structs.len());
        for raw in &self.structs {
            types.push(self.declaration(raw, &resolver));
        }
        let index = types
            .iter()
            .enumerate()
            .map(|(slot, decl)| (decl.id.clone(), slot))
            .collect();

        SourceSchema {
            config: self.config,
            types,
            index,
            marker_seen: self.marker_seen,
        }
    }

    fn declaration(&self, raw: &RawStruct, resolver: &PathResolver<'_>) -> TypeDeclaration {
        let package = raw.id.package();
        let generics = type_params(&raw.item.generics);
        let lifetimes: Vec<String> = raw
            .item
            .generics
            .lifetimes()
            .map(|param| param.lifetime.to_string())
            .collect();

        let mut supertypes = self.derives(&raw.item.attrs);
        if let Some(impls) = self
            .scopes
            .get(package)
            .and_then(|scope| scope.impls.get(raw.id.name()))
        {
            supertypes.extend(impls.iter().cloned());
        }

        let fields = match &raw.item.fields {
            Fields::Named(named) => named
                .named
                .iter()
                .filter_map(|field| {
                    let name = FieldName::Named(field.ident.as_ref()?.to_string());
                    Some(self.field(raw, field, name, &generics, resolver))
                })
                .collect(),
            Fields::Unnamed(unnamed) => unnamed
                .unnamed
                .iter()
                .enumerate()
                .map(|(index, field)| {
                    self.field(raw, field, FieldName::Index(index), &generics, resolver)
                })
                .collect(),
            Fields::Unit => Vec::new(),
        };

        TypeDeclaration {
            id: raw.id.clone(),
            fields,
            supertypes,
            generics,
            lifetimes,
            location: Some(location(&raw.file, raw.item.ident.span())),
        }
    }

    fn field(
        &self,
        raw: &RawStruct,
        field: &syn::Field,
        name: FieldName,
        generics: &[String],
        resolver: &PathResolver<'_>,
    ) -> FieldDeclaration {
        let ty = match classify(&field.ty, generics) {
            TypeShape::Builtin(text) => FieldType::Builtin(text),
            TypeShape::Path(path) => resolver.resolve(raw.id.package(), path, &field.ty),
        };
        let sensitive = field
            .attrs
            .iter()
            .any(|attr| attr.path().is_ident(&self.config.sensitive_attribute));
        FieldDeclaration {
            name,
            ty,
            sensitive,
            visible_in: visibility_scope(raw.id.package(), &field.vis),
            location: Some(location(
                &raw.file,
                field
                    .ident
                    .as_ref()
                    .map_or_else(|| field.ty.span(), syn::Ident::span),
            )),
        }
    }
}

struct PathResolver<'a> {
    declared: &'a BTreeSet<TypeId>,
    opaque: &'a BTreeSet<TypeId>,
    aliases: &'a BTreeMap<TypeId, syn::ItemType>,
    packages: &'a BTreeSet<&'a str>,
    scopes: &'a BTreeMap<String, Scope>,
}

impl PathResolver<'_> {
    fn resolve(&self, package: &str, path: &syn::Path, ty: &syn::Type) -> FieldType {
        self.resolve_at(package, path, ty, 0)
    }

    fn resolve_at(
        &self,
        package: &str,
        path: &syn::Path,
        ty: &syn::Type,
        depth: usize,
    ) -> FieldType {
        if path.leading_colon.is_some() {
            return FieldType::Builtin(type_text(ty));
        }
        let segments: Vec<String> = path.segments.iter().map(|s| s.ident.to_string()).collect();
        let imports = self.scopes.get(package).map(|scope| &scope.imports);

        let absolute = match segments.as_slice() {
            [name] => {
                let local = TypeId::new(package, name.clone());
                if self.is_known(&local) {
                    return self.lookup(local, ty, depth);
                }
                match imports.and_then(|imports| imports.get(name)) {
                    Some(full) => full.clone(),
                    None => match self.glob_lookup(package, name) {
                        Some(id) => return self.lookup(id, ty, depth),
                        None => return FieldType::Unresolved(type_text(ty)),
                    },
                }
            }
            [first, rest @ ..] => match imports.and_then(|imports| imports.get(first)) {
                Some(full) => full.iter().chain(rest).cloned().collect(),
                None => segments.clone(),
            },
            [] => return FieldType::Unresolved(type_text(ty)),
        };

        match self.absolute(package, &absolute) {
            Some(id) => self.lookup(id, ty, depth),
            None => FieldType::Builtin(type_text(ty)),
        }
    }

    /// First glob import of `package` that brings a known item named `name`.
    fn glob_lookup(&self, package: &str, name: &str) -> Option<TypeId> {
        let scope = self.scopes.get(package)?;
        scope.globs.iter().find_map(|prefix| {
            let mut full = prefix.clone();
            full.push(name.to_string());
            self.absolute(package, &full).filter(|id| self.is_known(id))
        })
    }

    /// Turns a path into a package-qualified id, or `None` for other crates.
    fn absolute(&self, current: &str, segments: &[String]) -> Option<TypeId> {
        let (name, prefix) = segments.split_last()?;
        if let Some(package) = anchored(current, prefix) {
            return Some(TypeId::new(package, name.clone()));
        }
        // Bare paths name a child module of the current package or an
        // external crate.
        let relative = join_package(current, &prefix.join("::"));
        if self.packages.contains(relative.as_str()) {
            return Some(TypeId::new(relative, name.clone()));
        }
        if self.packages.contains(prefix.join("::").as_str()) && !prefix.is_empty() {
            return Some(TypeId::new(prefix.join("::"), name.clone()));
        }
        None
    }

    fn is_known(&self, id: &TypeId) -> bool {
        self.declared.contains(id) || self.opaque.contains(id) || self.aliases.contains_key(id)
    }

    fn lookup(&self, id: TypeId, ty: &syn::Type, depth: usize) -> FieldType {
        if self.declared.contains(&id) {
            FieldType::Declared(id)
        } else if self.opaque.contains(&id) {
            FieldType::Builtin(type_text(ty))
        } else if let Some(alias) = self.aliases.get(&id) {
            self.follow_alias(&id, alias, ty, depth)
        } else {
            FieldType::Unresolved(type_text(ty))
        }
    }

    /// Resolves the alias target in the alias's package. Declared targets keep
    /// their identity; builtin and unresolved targets report the field's text.
    fn follow_alias(
        &self,
        id: &TypeId,
        alias: &syn::ItemType,
        ty: &syn::Type,
        depth: usize,
    ) -> FieldType {
        if depth >= MAX_ALIAS_DEPTH {
            return FieldType::Unresolved(type_text(ty));
        }
        let target = match classify(&alias.ty, &type_params(&alias.generics)) {
            TypeShape::Builtin(_) => return FieldType::Builtin(type_text(ty)),
            TypeShape::Path(path) => self.resolve_at(id.package(), path, &alias.ty, depth + 1),
        };
        match target {
            FieldType::Declared(target) => FieldType::Declared(target),
            FieldType::Builtin(_) => FieldType::Builtin(type_text(ty)),
            FieldType::Unresolved(_) => FieldType::Unresolved(type_text(ty)),
        }
    }
}

/// `syn`-backed [`SchemaProvider`].
pub struct SourceSchema {
    config: GeneratorConfig,
    types: Vec<TypeDeclaration>,
    index: BTreeMap<TypeId, usize>,
    marker_seen: bool,
}

impl SourceSchema {
    pub fn builder(config: GeneratorConfig) -> SourceSchemaBuilder {
        SourceSchemaBuilder {
            config,
            structs: Vec::new(),
            opaque: BTreeSet::new(),
            aliases: BTreeMap::new(),
            scopes: BTreeMap::new(),
            marker_seen: false,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}

impl SchemaProvider for SourceSchema {
    fn all_declared_types(&self) -> &[TypeDeclaration] {
        &self.types
    }

    fn model_marker(&self) -> &str {
        &self.config.model_marker
    }

    fn resolve_marker(&self) -> bool {
        self.marker_seen
    }

    fn declaration(&self, id: &TypeId) -> Option<&TypeDeclaration> {
        self.index.get(id).map(|&slot| &self.types[slot])
    }
}

fn join_package(package: &str, child: &str) -> String {
    match (package.is_empty(), child.is_empty()) {
        (_, true) => package.to_string(),
        (true, false) => child.to_string(),
        (false, false) => format!("{package}::{child}"),
    }
}

/// Package named by a `crate::`, `self::` or `super::` prefix, or `None` when
/// the prefix is bare.
fn anchored(current: &str, prefix: &[String]) -> Option<String> {
    let mut package: Vec<&str> = Vec::new();
    let mut rest = prefix;
    match prefix.first().map(String::as_str) {
        Some("crate") => rest = &prefix[1..],
        Some("self" | "super") => {
            package.extend(current.split("::").filter(|s| !s.is_empty()));
            while let Some(head) = rest.first() {
                match head.as_str() {
                    "self" => {}
                    "super" => {
                        package.pop();
                    }
                    _ => break,
                }
                rest = &rest[1..];
            }
        }
        _ => return None,
    }
    package.extend(rest.iter().map(String::as_str));
    Some(package.join("::"))
}

/// Package a field with visibility `vis`, declared in `package`, is visible
/// from. `pub` and `pub(crate)` map to the crate root.
fn visibility_scope(package: &str, vis: &syn::Visibility) -> String {
    match vis {
        syn::Visibility::Public(_) => String::new(),
        syn::Visibility::Inherited => package.to_string(),
        syn::Visibility::Restricted(restricted) => {
            let segments: Vec<String> = restricted
                .path
                .segments
                .iter()
                .map(|segment| segment.ident.to_string())
                .collect();
            anchored(package, &segments).unwrap_or_else(|| segments.join("::"))
        }
    }
}

/// Names of type and const parameters. Lifetimes are kept apart.
fn type_params(generics: &syn::Generics) -> Vec<String> {
    generics
        .params
        .iter()
        .filter_map(|param| match param {
            syn::GenericParam::Type(ty) => Some(ty.ident.to_string()),
            syn::GenericParam::Const(c) => Some(c.ident.to_string()),
            syn::GenericParam::Lifetime(_) => None,
        })
        .collect()
}

fn last_ident(path: &syn::Path) -> Option<String> {
    path.segments.last().map(|segment| segment.ident.to_string())
}

fn location(file: &Path, span: proc_macro2::Span) -> SourceLocation {
    let start = span.start();
    SourceLocation {
        file: file.to_path_buf(),
        line: start.line,
        column: start.column + 1,
    }
}

fn flatten_use(
    tree: &UseTree,
    prefix: &mut Vec<String>,
    out: &mut Vec<(String, Vec<String>)>,
    globs: &mut Vec<Vec<String>>,
) {
    match tree {
        UseTree::Path(path) => {
            prefix.push(path.ident.to_string());
            flatten_use(&path.tree, prefix, out, globs);
            prefix.pop();
        }
        UseTree::Name(name) => {
            let ident = name.ident.to_string();
            if ident == "self" {
                if let Some(last) = prefix.last() {
                    out.push((last.clone(), prefix.clone()));
                }
            } else {
                let mut full = prefix.clone();
                full.push(ident.clone());
                out.push((ident, full));
            }
        }
        UseTree::Rename(rename) => {
            let mut full = prefix.clone();
            full.push(rename.ident.to_string());
            out.push((rename.rename.to_string(), full));
        }
        UseTree::Group(group) => {
            for tree in &group.items {
                flatten_use(tree, prefix, out, globs);
            }
        }
        UseTree::Glob(_) => globs.push(prefix.clone()),
    }
}
