//! Parsing of the `#[sensitive]` field attribute.
//!
//! Only the bare form is accepted. The build-time generator reads the same
//! attribute from source, so anything it could not interpret is rejected here
//! where the compiler can point at it.

use proc_macro2::Span;
use syn::{spanned::Spanned, Attribute, Meta, Result};

/// Field marker based on the `#[sensitive]` attribute.
///
/// | Attribute | Marker | Generated mask |
/// |-----------|--------|----------------|
/// | None | `Plain` | field kept, or rebuilt if something below it is sensitive |
/// | `#[sensitive]` | `Sensitive` | field reset to `Default::default()` |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Marker {
    Plain,
    Sensitive,
}

impl Marker {
    pub(crate) const fn is_sensitive(self) -> bool {
        matches!(self, Self::Sensitive)
    }
}

fn set_marker(target: &mut Option<Marker>, span: Span) -> Result<()> {
    if target.is_some() {
        return Err(syn::Error::new(
            span,
            "multiple #[sensitive] attributes specified on the same field",
        ));
    }
    *target = Some(Marker::Sensitive);
    Ok(())
}

pub(crate) fn parse_field_marker(attrs: &[Attribute]) -> Result<Marker> {
    let mut marker: Option<Marker> = None;
    for attr in attrs {
        if !attr.path().is_ident("sensitive") {
            continue;
        }

        match &attr.meta {
            Meta::Path(_) => set_marker(&mut marker, attr.span())?,
            Meta::List(_) => {
                return Err(syn::Error::new(
                    attr.span(),
                    "#[sensitive] takes no arguments; masked fields are reset to their default value",
                ));
            }
            Meta::NameValue(_) => {
                return Err(syn::Error::new(
                    attr.span(),
                    "name-value syntax is not supported for #[sensitive]",
                ));
            }
        }
    }

    Ok(marker.unwrap_or(Marker::Plain))
}

/// Rejects `#[sensitive]` on the container itself.
pub(crate) fn reject_container_marker(attrs: &[Attribute]) -> Result<()> {
    match attrs.iter().find(|attr| attr.path().is_ident("sensitive")) {
        Some(attr) => Err(syn::Error::new(
            attr.span(),
            "#[sensitive] belongs on fields, not on the type",
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use quote::quote;
    use syn::DeriveInput;

    use super::*;

    fn parse_attrs(tokens: proc_macro2::TokenStream) -> Vec<Attribute> {
        let input: DeriveInput = syn::parse2(quote! {
            #tokens
            struct Dummy;
        })
        .expect("should parse as DeriveInput");
        input.attrs
    }

    #[test]
    fn no_attribute_is_plain() {
        let attrs = parse_attrs(quote! {});
        assert!(!parse_field_marker(&attrs).unwrap().is_sensitive());
    }

    #[test]
    fn bare_sensitive_is_sensitive() {
        let attrs = parse_attrs(quote! { #[sensitive] });
        assert!(parse_field_marker(&attrs).unwrap().is_sensitive());
    }

    #[test]
    fn arguments_are_rejected() {
        let attrs = parse_attrs(quote! { #[sensitive(Secret)] });
        let err = parse_field_marker(&attrs).unwrap_err();
        assert!(err.to_string().contains("takes no arguments"));
    }

    #[test]
    fn multiple_sensitive_attributes_error() {
        let attrs = parse_attrs(quote! {
            #[sensitive]
            #[sensitive]
        });
        let result = parse_field_marker(&attrs);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("multiple #[sensitive] attributes"));
    }

    #[test]
    fn name_value_syntax_error() {
        let attrs = parse_attrs(quote! { #[sensitive = "value"] });
        let result = parse_field_marker(&attrs);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("name-value syntax is not supported"));
    }

    #[test]
    fn other_attributes_ignored() {
        let attrs = parse_attrs(quote! {
            #[derive(Clone)]
            #[serde(skip)]
        });
        assert!(!parse_field_marker(&attrs).unwrap().is_sensitive());
    }

    #[test]
    fn container_marker_is_rejected() {
        let attrs = parse_attrs(quote! { #[sensitive] });
        assert!(reject_container_marker(&attrs).is_err());
        assert!(reject_container_marker(&parse_attrs(quote! {})).is_ok());
    }
}
