//! Build-time generation of `masking::Mask` implementations.
//!
//! This crate inspects a graph of declared record types and writes, for every
//! eligible type, a source file implementing `Mask` for it. It:
//! - resolves which fields carry `#[sensitive]` at any nesting depth
//! - decides per field whether to clear it, delegate to a nested `Mask` impl,
//!   rebuild it inline, or pass it through
//! - renders the decision to deterministic Rust source
//! - writes each artifact at most once per (package, type) key
//!
//! A type is eligible when it carries the model marker (`#[derive(Model)]` or
//! `impl Model for T {}`) and at least one sensitive field is reachable through
//! its non-builtin fields.
//!
//! It does **not** parse the host crate on its own. Schemas come from a
//! [`SchemaProvider`]; [`SourceSchema`] is the `syn`-backed provider used from
//! build scripts, and [`InMemorySchema`] is available for hosts that already
//! know their types.
//!
//! ## Build script usage
//! ```ignore
//! use masking_codegen::{CargoDrain, EmissionContext, Generator, GeneratorConfig, SlogSink, SourceSchema};
//!
//! let config = GeneratorConfig::default();
//! let schema = SourceSchema::builder(config.clone())
//!     .file("models", "src/models.rs")?
//!     .build();
//! let mut ctx = EmissionContext::new(out_dir.join("masking"));
//! let mut sink = SlogSink::new(slog::Logger::root(CargoDrain::new(), slog::o!()));
//! let report = Generator::new(&config, &schema).run(&mut ctx, &mut sink);
//! ctx.write_index()?;
//! ctx.write_manifest()?;
//! ```

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

mod config;
mod diagnostics;
mod drain;
mod emit;
mod engine;
mod error;
mod resolver;
mod schema;
mod source;
mod synthesizer;
mod types;

pub use config::GeneratorConfig;
pub use diagnostics::{Diagnostic, DiagnosticLog, DiagnosticSink, Severity, SlogSink, SourceLocation};
pub use drain::CargoDrain;
pub use emit::{
    ArtifactKey, EmissionContext, EmitOutcome, Manifest, ManifestEntry, RedactionArtifact,
    INDEX_FILE, MANIFEST_FILE,
};
pub use engine::{Generator, RunReport};
pub use error::{GenerationError, Result};
pub use resolver::{CycleCut, MaskedPath, MaskedPaths, Resolution, Resolver, UnresolvedField};
pub use schema::{
    FieldDeclaration, FieldName, FieldType, InMemorySchema, SchemaProvider, TypeDeclaration, TypeId,
};
pub use source::{SourceSchema, SourceSchemaBuilder};
pub use synthesizer::{DecisionTable, FieldDecision, RedactionDecision, Synthesis, Synthesizer};
