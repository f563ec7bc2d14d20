//! Generates `Mask` impls for `src/models.rs` into `$OUT_DIR/masking`.

use std::{env, error::Error, fs, path::PathBuf};

use masking_codegen::{
    CargoDrain, EmissionContext, Generator, GeneratorConfig, SlogSink, SourceSchema,
};

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/models.rs");

    // Artifacts are never overwritten, so a rebuild after a model change has to
    // start from an empty directory.
    let out = PathBuf::from(env::var("OUT_DIR")?).join("masking");
    if out.exists() {
        fs::remove_dir_all(&out)?;
    }

    let config = GeneratorConfig::default();
    let schema = SourceSchema::builder(config.clone())
        .file("models", "src/models.rs")?
        .build();

    let logger = slog::Logger::root(CargoDrain::new(), slog::o!("crate" => "masking-fixtures"));
    let mut sink = SlogSink::new(logger);
    let mut ctx = EmissionContext::new(&out);
    let report = Generator::new(&config, &schema).run(&mut ctx, &mut sink);

    if report.halted {
        return Err("the `Model` marker is not in scope in src/models.rs".into());
    }
    if !report.failed.is_empty() {
        let failed: Vec<String> = report.failed.iter().map(ToString::to_string).collect();
        return Err(format!("mask generation failed for {}", failed.join(", ")).into());
    }

    ctx.write_index()?;
    ctx.write_manifest()?;
    Ok(())
}
