//! Derive macros for `masking`.
//!
//! This crate provides the two source markers the build-time generator looks
//! for. It:
//! - implements the `Model` marker trait for `#[derive(Model)]` structs
//! - registers the `#[sensitive]` field attribute on both derives
//! - validates `#[sensitive]` and asserts that every sensitive field type
//!   implements `Default`
//!
//! It does **not** generate `Mask` implementations. Those are written by
//! `masking-codegen` from a build script, because a mask for one type depends
//! on the declarations of every type nested inside it.

// <https://doc.rust-lang.org/rustc/lints/listing/allowed-by-default.html>
#![warn(
    anonymous_parameters,
    bare_trait_objects,
    elided_lifetimes_in_paths,
    missing_copy_implementations,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_code,
    unused_extern_crates,
    unused_import_braces
)]
// <https://rust-lang.github.io/rust-clippy/stable>
#![warn(
    clippy::all,
    clippy::cargo,
    clippy::dbg_macro,
    clippy::float_cmp_const,
    clippy::get_unwrap,
    clippy::mem_forget,
    clippy::nursery,
    clippy::pedantic,
    clippy::todo,
    clippy::unwrap_used,
    clippy::uninlined_format_args
)]
// Allow some clippy lints
#![allow(
    clippy::default_trait_access,
    clippy::doc_markdown,
    clippy::if_not_else,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::use_self,
    clippy::cargo_common_metadata,
    clippy::missing_errors_doc,
    clippy::enum_glob_use,
    clippy::struct_excessive_bools,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::result_large_err,
    clippy::option_if_let_else
)]
// Allow some lints while testing
#![cfg_attr(test, allow(clippy::non_ascii_literal, clippy::unwrap_used))]

#[allow(unused_extern_crates)]
extern crate proc_macro;

use proc_macro2::TokenStream;
use proc_macro_crate::{crate_name, FoundCrate};
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, Data, DataStruct, DeriveInput, Result};

mod derive_struct;
mod generics;
mod strategy;
use derive_struct::{derive_struct, StructDeriveOutput};
use strategy::reject_container_marker;

/// Marks a struct as an eligible model and implements `masking::Model` for it.
///
/// The build-time generator writes a `Mask` implementation for every model
/// that has at least one `#[sensitive]` field at any depth: directly, or
/// inside a nested struct reached through its fields.
///
/// # Field Attributes
///
/// - **No annotation**: the field is moved into the masked value unchanged,
///   unless a sensitive field is nested somewhere inside it, in which case it
///   is rebuilt (or masked with its own `Mask` impl when its type is a model).
/// - `#[sensitive]`: the field is reset to `Default::default()`. Its type must
///   implement `Default`; this derive asserts that at compile time for fields
///   whose type does not involve the struct's type parameters.
///
/// Enums and unions are rejected at compile time. Generic models get the
/// marker impl, but the generator does not write a mask for them.
#[proc_macro_derive(Model, attributes(sensitive))]
pub fn derive_model(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_model(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

/// Registers `#[sensitive]` on a struct that is not itself a model.
///
/// Such a struct gets no `Mask` impl of its own. Its sensitive fields are
/// still cleared when it is nested inside a model, because the model's mask
/// rebuilds it field by field.
#[proc_macro_derive(Sensitive, attributes(sensitive))]
pub fn derive_sensitive(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_sensitive(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.into_compile_error().into(),
    }
}

/// Returns the token stream to reference the masking crate root.
///
/// Handles crate renaming (e.g., `my_masking = { package = "masking", ... }`).
/// Inside the masking package itself this still resolves to `::masking`, which
/// the runtime crate aliases to itself so doctests and the library agree.
fn crate_root() -> TokenStream {
    match crate_name("masking") {
        Ok(FoundCrate::Itself) => quote! { ::masking },
        Ok(FoundCrate::Name(name)) => {
            let ident = format_ident!("{}", name);
            quote! { ::#ident }
        }
        Err(_) => quote! { ::masking },
    }
}

fn struct_data<'a>(input: &'a DeriveInput, derive: &str) -> Result<&'a DataStruct> {
    match &input.data {
        Data::Struct(data) => Ok(data),
        Data::Enum(data) => Err(syn::Error::new(
            data.enum_token.span(),
            format!("`{derive}` can only be derived for structs"),
        )),
        Data::Union(data) => Err(syn::Error::new(
            data.union_token.span(),
            format!("`{derive}` cannot be derived for unions"),
        )),
    }
}

fn expand_model(input: DeriveInput) -> Result<TokenStream> {
    reject_container_marker(&input.attrs)?;
    let data = struct_data(&input, "Model")?;
    let StructDeriveOutput {
        default_assertions,
        ..
    } = derive_struct(data, &input.generics)?;

    let crate_root = crate_root();
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #crate_root::Model for #ident #ty_generics #where_clause {}

        #default_assertions
    })
}

fn expand_sensitive(input: DeriveInput) -> Result<TokenStream> {
    reject_container_marker(&input.attrs)?;
    let data = struct_data(&input, "Sensitive")?;
    let StructDeriveOutput {
        sensitive,
        default_assertions,
    } = derive_struct(data, &input.generics)?;

    if sensitive == 0 {
        return Err(syn::Error::new(
            input.ident.span(),
            "`Sensitive` has no effect without at least one #[sensitive] field",
        ));
    }
    Ok(default_assertions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(tokens: TokenStream) -> DeriveInput {
        syn::parse2(tokens).expect("should parse as DeriveInput")
    }

    #[test]
    fn model_implements_marker_trait() {
        let output = expand_model(parse(quote! {
            struct Account {
                #[sensitive]
                pin: u32,
                owner: String,
            }
        }))
        .unwrap()
        .to_string();
        assert!(output.contains(&quote!(::masking::Model for Account {}).to_string()));
    }

    #[test]
    fn model_keeps_generics_and_bounds() {
        let output = expand_model(parse(quote! {
            struct Wrapper<T: Clone> where T: Send {
                inner: T,
            }
        }))
        .unwrap()
        .to_string();
        let expected = quote!(impl<T: Clone> ::masking::Model for Wrapper<T> where T: Send {});
        assert!(output.contains(&expected.to_string()));
    }

    #[test]
    fn model_without_sensitive_fields_is_allowed() {
        let output = expand_model(parse(quote! {
            struct NoMaskedProperty {
                value: String,
            }
        }))
        .unwrap();
        assert!(!output.to_string().contains("__masking_assert_default"));
    }

    #[test]
    fn enums_are_rejected() {
        let err = expand_model(parse(quote! {
            enum Status { Active, Closed }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("can only be derived for structs"));
    }

    #[test]
    fn unions_are_rejected() {
        let err = expand_sensitive(parse(quote! {
            union Bits { a: u32, b: f32 }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("cannot be derived for unions"));
    }

    #[test]
    fn sensitive_requires_a_marked_field() {
        let err = expand_sensitive(parse(quote! {
            struct Plain { value: String }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("has no effect"));
    }

    #[test]
    fn sensitive_emits_only_assertions() {
        let output = expand_sensitive(parse(quote! {
            struct Card {
                #[sensitive]
                number: String,
            }
        }))
        .unwrap()
        .to_string();
        assert!(!output.contains("Model"));
        assert!(output.contains("__masking_assert_default"));
    }

    #[test]
    fn container_level_marker_is_rejected() {
        let err = expand_model(parse(quote! {
            #[sensitive]
            struct Account { pin: u32 }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("belongs on fields"));
    }
}
