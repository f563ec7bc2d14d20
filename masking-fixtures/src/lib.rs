//! Fixture crate for `masking-codegen`.
//!
//! `build.rs` runs the generator over [`models`] and the generated `Mask`
//! impls are included back into that module.

pub mod models;

/// The artifact manifest written by the build script, as JSON.
pub const MANIFEST: &str = include_str!(concat!(env!("OUT_DIR"), "/masking/manifest.json"));
