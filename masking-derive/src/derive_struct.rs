//! Struct field inspection shared by both derives.
//!
//! Every field's `#[sensitive]` attribute is validated, and each sensitive
//! field with a concrete type gets a compile-time `Default` assertion: the
//! generated mask clears such fields with `Default::default()`, and an error
//! pointing at the field reads better than one inside a build-script artifact.
//! The assertion function declares the struct's lifetimes so borrowed field
//! types such as `&'a str` can be checked too.

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::{spanned::Spanned, DataStruct, Fields, Result};

use crate::{generics::mentions_generics, strategy::parse_field_marker};

pub(crate) struct StructDeriveOutput {
    /// Number of fields carrying `#[sensitive]`.
    pub(crate) sensitive: usize,
    pub(crate) default_assertions: TokenStream,
}

pub(crate) fn derive_struct(data: &DataStruct, generics: &syn::Generics) -> Result<StructDeriveOutput> {
    let fields: Vec<&syn::Field> = match &data.fields {
        Fields::Named(fields) => fields.named.iter().collect(),
        Fields::Unnamed(fields) => fields.unnamed.iter().collect(),
        Fields::Unit => Vec::new(),
    };

    let mut sensitive = 0;
    let mut assertions = Vec::new();
    for field in fields {
        if !parse_field_marker(&field.attrs)?.is_sensitive() {
            continue;
        }
        sensitive += 1;

        let ty = &field.ty;
        if mentions_generics(ty, generics) {
            continue;
        }
        assertions.push(quote_spanned! { ty.span() =>
            __masking_assert_default::<#ty>();
        });
    }

    let default_assertions = if assertions.is_empty() {
        quote! {}
    } else {
        let lifetimes: Vec<_> = generics.lifetimes().collect();
        let params = if lifetimes.is_empty() {
            quote! {}
        } else {
            quote! { <#(#lifetimes),*> }
        };
        quote! {
            #[allow(dead_code)]
            const _: () = {
                fn __masking_assert_default<T: ::core::default::Default>() {}
                fn __masking_assert_fields #params () {
                    #(#assertions)*
                }
            };
        }
    };

    Ok(StructDeriveOutput {
        sensitive,
        default_assertions,
    })
}
