//! Redaction synthesis: masked paths to a decision table to Rust source.
//!
//! ## Decision table
//!
//! Each direct field gets exactly one decision. Rules are tried in order and
//! the first match wins:
//!
//! | # | Condition | Decision | Generated value |
//! |---|-----------|----------|-----------------|
//! | 1 | field carries `#[sensitive]` | `Clear` | `Default::default()` |
//! | 2 | field type is a non-generic model and a masked path runs below the field | `Delegate` | `Mask::mask(field)` |
//! | 3 | a masked path runs below the field | `Inline` | field rebuilt with rules 1-4 applied to its own fields |
//! | 4 | otherwise | `PassThrough` | field moved unchanged |
//!
//! Rule 1 fires even when the field's type has its own mask impl; nothing below
//! a cleared field matters.
//!
//! Rule 3 names every field of the nested struct, so each of them must be
//! visible from the model's package. A model that would need to rebuild a
//! struct with hidden fields fails with [`GenerationError::UnsupportedType`].
//!
//! ## Rendering
//!
//! The generated impl destructures `self`, then rebuilds it in declaration
//! order, overriding only fields whose decision is not `PassThrough`:
//!
//! ```ignore
//! impl ::masking::Mask for crate::app::A1 {
//!     fn mask(self) -> Self {
//!         let Self { a1: _, b1, d1 } = self;
//!         Self {
//!             a1: ::core::default::Default::default(),
//!             b1: {
//!                 let crate::app::B1 { b1, c1 } = b1;
//!                 crate::app::B1 { b1, c1: { /* ... */ } }
//!             },
//!             d1,
//!         }
//!     }
//! }
//! ```
//!
//! Rendering is a pure function of the schema snapshot, so the same input
//! always produces byte-identical text.

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};

use crate::{
    config::GeneratorConfig,
    emit::{ArtifactKey, RedactionArtifact},
    error::{GenerationError, Result},
    resolver::MaskedPaths,
    schema::{FieldDeclaration, FieldName, SchemaProvider, TypeDeclaration, TypeId},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RedactionDecision {
    /// Reset to the canonical empty value of the field's type.
    Clear,
    /// Call the nested type's own `Mask::mask`.
    Delegate(TypeId),
    /// Rebuild the nested value with its own decisions.
    Inline(DecisionTable),
    /// Move the field over unchanged.
    PassThrough,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDecision {
    pub field: FieldName,
    pub decision: RedactionDecision,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecisionTable {
    pub ty: TypeId,
    pub fields: Vec<FieldDecision>,
}

impl DecisionTable {
    /// Looks up the decision for a direct field by its display name.
    pub fn decision(&self, field: &str) -> Option<&RedactionDecision> {
        self.fields
            .iter()
            .find(|d| d.field.to_string() == field)
            .map(|d| &d.decision)
    }

    /// Number of fields that are not passed through.
    pub fn overrides(&self) -> usize {
        self.fields
            .iter()
            .filter(|d| d.decision != RedactionDecision::PassThrough)
            .count()
    }
}

#[derive(Clone, Debug)]
pub struct Synthesis {
    pub table: DecisionTable,
    pub artifact: RedactionArtifact,
}

pub struct Synthesizer<'a, P: ?Sized> {
    schema: &'a P,
    config: &'a GeneratorConfig,
}

impl<'a, P: SchemaProvider + ?Sized> Synthesizer<'a, P> {
    pub fn new(schema: &'a P, config: &'a GeneratorConfig) -> Self {
        Self { schema, config }
    }

    /// Builds the decision table and renders the artifact for an eligible type.
    pub fn synthesize(&self, decl: &TypeDeclaration, paths: &MaskedPaths) -> Result<Synthesis> {
        if !decl.generics.is_empty() {
            return Err(GenerationError::UnsupportedType {
                ty: decl.id.clone(),
                reason: "generic types cannot receive a generated mask".to_string(),
            });
        }
        let table = self.decide(&decl.id, paths)?;
        let text = self.render(decl, &table, paths)?;
        let artifact = RedactionArtifact::new(ArtifactKey::for_type(&decl.id), decl.id.clone(), text);
        Ok(Synthesis { table, artifact })
    }

    /// Applies the decision rules to every direct field of `ty`.
    pub fn decide(&self, ty: &TypeId, paths: &MaskedPaths) -> Result<DecisionTable> {
        self.decide_for(ty, ty, paths)
    }

    /// Builds the table for `ty`, reached from the model `root`.
    fn decide_for(
        &self,
        root: &TypeId,
        ty: &TypeId,
        paths: &MaskedPaths,
    ) -> Result<DecisionTable> {
        let decl = self.declaration(ty)?;
        let mut fields = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            let below = paths.below(&field.name);
            let decision = match field.declared_type() {
                _ if field.sensitive => RedactionDecision::Clear,
                Some(nested) if !below.is_empty() => {
                    if self.can_delegate(nested) {
                        RedactionDecision::Delegate(nested.clone())
                    } else {
                        self.check_visible(root, nested)?;
                        RedactionDecision::Inline(self.decide_for(root, nested, &below)?)
                    }
                }
                _ => RedactionDecision::PassThrough,
            };
            fields.push(FieldDecision {
                field: field.name.clone(),
                decision,
            });
        }
        Ok(DecisionTable {
            ty: ty.clone(),
            fields,
        })
    }

    /// Whether the nested type gets its own generated impl.
    fn can_delegate(&self, ty: &TypeId) -> bool {
        self.schema.is_eligible_marker_present(ty)
            && self
                .schema
                .declaration(ty)
                .is_some_and(|decl| decl.generics.is_empty())
    }

    /// Fails unless every field of `nested` can be named from `root`'s package.
    fn check_visible(&self, root: &TypeId, nested: &TypeId) -> Result<()> {
        let decl = self.declaration(nested)?;
        match decl
            .fields
            .iter()
            .find(|field| !field.is_visible_from(root.package()))
        {
            Some(hidden) => Err(GenerationError::UnsupportedType {
                ty: root.clone(),
                reason: format!(
                    "field `{}` of `{nested}` is not visible from the model's package",
                    hidden.name
                ),
            }),
            None => Ok(()),
        }
    }

    fn declaration(&self, ty: &TypeId) -> Result<&'a TypeDeclaration> {
        self.schema
            .declaration(ty)
            .ok_or_else(|| GenerationError::UnknownType { ty: ty.clone() })
    }

    fn render(
        &self,
        decl: &TypeDeclaration,
        table: &DecisionTable,
        paths: &MaskedPaths,
    ) -> Result<String> {
        let runtime = self.parse_path(&self.config.runtime_path, &decl.id)?;
        let self_path = self.type_path(&decl.id)?;
        let lifetimes = decl
            .lifetimes
            .iter()
            .map(|lifetime| {
                syn::parse_str::<syn::Lifetime>(lifetime).map_err(|err| {
                    GenerationError::UnsupportedType {
                        ty: decl.id.clone(),
                        reason: format!("`{lifetime}` is not a lifetime: {err}"),
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let params = if lifetimes.is_empty() {
            quote! {}
        } else {
            quote! { <#(#lifetimes),*> }
        };
        let body = self.rebuild(&quote!(self), &quote!(Self), decl, table, &runtime)?;
        let tokens = quote! {
            #[automatically_derived]
            impl #params #runtime::Mask for #self_path #params {
                fn mask(self) -> Self {
                    #body
                }
            }
        };

        let mut text = format!(
            "// @generated by masking-codegen from {}. Do not edit.\n",
            decl.id
        );
        text.push_str("// masked: ");
        text.push_str(&paths.to_strings().join(", "));
        text.push('\n');
        text.push_str(&tokens.to_string());
        text.push('\n');
        Ok(text)
    }

    /// Destructures `source` as `ctor` and rebuilds it from `table`.
    fn rebuild(
        &self,
        source: &TokenStream,
        ctor: &TokenStream,
        decl: &TypeDeclaration,
        table: &DecisionTable,
        runtime: &syn::Path,
    ) -> Result<TokenStream> {
        let mut patterns = Vec::with_capacity(decl.fields.len());
        let mut values = Vec::with_capacity(decl.fields.len());

        for (field, decision) in decl.fields.iter().zip(&table.fields) {
            let binding = binding(&decl.id, field)?;
            let value = match &decision.decision {
                RedactionDecision::Clear => quote! { ::core::default::Default::default() },
                RedactionDecision::Delegate(_) => quote! { #runtime::Mask::mask(#binding) },
                RedactionDecision::Inline(nested) => {
                    let nested_decl = self.declaration(&nested.ty)?;
                    let nested_path = self.type_path(&nested.ty)?;
                    let inner = self.rebuild(
                        &quote!(#binding),
                        &quote!(#nested_path),
                        nested_decl,
                        nested,
                        runtime,
                    )?;
                    quote! { { #inner } }
                }
                RedactionDecision::PassThrough => quote! { #binding },
            };

            let cleared = decision.decision == RedactionDecision::Clear;
            let passed = decision.decision == RedactionDecision::PassThrough;
            match &field.name {
                FieldName::Named(_) => {
                    patterns.push(if cleared {
                        quote! { #binding: _ }
                    } else {
                        quote! { #binding }
                    });
                    values.push(if passed {
                        quote! { #binding }
                    } else {
                        quote! { #binding: #value }
                    });
                }
                FieldName::Index(index) => {
                    let member = syn::Index::from(*index);
                    patterns.push(if cleared {
                        quote! { #member: _ }
                    } else {
                        quote! { #member: #binding }
                    });
                    values.push(quote! { #member: #value });
                }
            }
        }

        Ok(quote! {
            let #ctor { #(#patterns),* } = #source;
            #ctor { #(#values),* }
        })
    }

    fn type_path(&self, ty: &TypeId) -> Result<syn::Path> {
        let mut path = self.config.crate_root.clone();
        for segment in ty.package_segments() {
            path.push_str("::");
            path.push_str(segment);
        }
        path.push_str("::");
        path.push_str(ty.name());
        self.parse_path(&path, ty)
    }

    fn parse_path(&self, path: &str, ty: &TypeId) -> Result<syn::Path> {
        syn::parse_str(path).map_err(|err| GenerationError::UnsupportedType {
            ty: ty.clone(),
            reason: format!("`{path}` is not a valid path: {err}"),
        })
    }
}

fn binding(owner: &TypeId, field: &FieldDeclaration) -> Result<Ident> {
    match &field.name {
        FieldName::Named(name) => {
            syn::parse_str::<Ident>(name).map_err(|_| GenerationError::UnsupportedType {
                ty: owner.clone(),
                reason: format!("field name `{name}` is not a Rust identifier"),
            })
        }
        FieldName::Index(index) => Ok(format_ident!("field_{}", index)),
    }
}
