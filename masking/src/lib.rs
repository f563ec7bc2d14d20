//! Masking of sensitive fields in record types.
//!
//! Mark a struct as a model and tag its sensitive fields:
//!
//! ```
//! use masking::{Model, Sensitive};
//!
//! #[derive(Model)]
//! pub struct Account {
//!     #[sensitive]
//!     pub pin: u32,
//!     pub owner: String,
//!     pub card: Card,
//! }
//!
//! #[derive(Sensitive)]
//! pub struct Card {
//!     #[sensitive]
//!     pub number: String,
//!     pub brand: String,
//! }
//! ```
//!
//! A build script running `masking-codegen` over these declarations writes one
//! [`Mask`] implementation per eligible model. The generated `mask` returns a
//! copy in which every sensitive field, at any depth, holds its type's
//! `Default` value, and every other field is moved over unchanged.
//!
//! Key rules:
//! - A model is eligible when at least one `#[sensitive]` field is reachable
//!   from it through its fields. `NoMaskedProperty`-style models get no impl.
//! - A `#[sensitive]` field is cleared as a whole, even when its type is a
//!   model with its own mask.
//! - A nested model is masked by calling its own `Mask::mask`. Any other
//!   nested struct is rebuilt in place.
//!
//! What this crate does:
//! - defines the [`Model`] marker and the [`Mask`] trait
//! - re-exports the `Model` and `Sensitive` derives
//!
//! What it does not do:
//! - generate masks at runtime
//! - mask enums, collections, or generic models

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

pub use masking_derive::{Model, Sensitive};

#[allow(unused_extern_crates)]
extern crate self as masking;

/// Marker for record types the generator considers.
///
/// Implemented by `#[derive(Model)]`, or by hand with `impl Model for T {}`.
pub trait Model {}

/// Produces a copy of a model with every sensitive field cleared.
///
/// Implementations are generated at build time; see the crate docs.
pub trait Mask: Model + Sized {
    /// Consumes `self` and returns it with sensitive fields reset to their
    /// `Default` values.
    #[must_use]
    fn mask(self) -> Self;

    /// Masks a clone, leaving `self` untouched.
    #[must_use]
    fn masked(&self) -> Self
    where
        Self: Clone,
    {
        self.clone().mask()
    }
}
