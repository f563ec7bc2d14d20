//! Emission gatekeeping.
//!
//! An [`EmissionContext`] owns one output directory for one run. Artifacts are
//! keyed by (package, `<Type>Mask`) and written at most once: if a file already
//! exists under the key's path, emission reports [`EmitOutcome::Skipped`] and
//! leaves it untouched.
//!
//! Writes go to a temporary file in the target directory which is then linked
//! into place without clobbering, so a reader sees either the whole artifact
//! or nothing. The temporary file is removed on every exit path.
//!
//! Runs that may execute concurrently must use disjoint output directories.

use std::{
    collections::BTreeMap,
    fmt, fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use proc_macro2::Literal;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::{
    error::{GenerationError, Result},
    schema::TypeId,
};

/// File name of the run manifest, relative to the output root.
pub const MANIFEST_FILE: &str = "manifest.json";
/// File name of the per-package include index.
pub const INDEX_FILE: &str = "masks.rs";

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactKey {
    pub package: String,
    pub name: String,
}

impl ArtifactKey {
    pub fn for_type(ty: &TypeId) -> Self {
        Self {
            package: ty.package().to_string(),
            name: format!("{}Mask", ty.name()),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.rs", self.name)
    }

    /// Path of the artifact relative to the output root.
    pub fn relative_path(&self) -> PathBuf {
        let mut path = package_dir(&self.package);
        path.push(self.file_name());
        path
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}::{}", self.package, self.name)
        }
    }
}

fn package_dir(package: &str) -> PathBuf {
    package
        .split("::")
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Rendered source for one eligible type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedactionArtifact {
    pub key: ArtifactKey,
    pub ty: TypeId,
    pub text: String,
}

impl RedactionArtifact {
    pub fn new(key: ArtifactKey, ty: TypeId, text: String) -> Self {
        Self { key, ty, text }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitOutcome {
    Written,
    Skipped,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub package: String,
    pub type_name: String,
    pub artifact: String,
    /// Artifact path relative to the output root, `/`-separated.
    pub file: String,
    pub outcome: EmitOutcome,
}

/// Keys that have an artifact in the output directory after a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub artifacts: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn entry(&self, package: &str, type_name: &str) -> Option<&ManifestEntry> {
        self.artifacts
            .iter()
            .find(|e| e.package == package && e.type_name == type_name)
    }

    pub fn has_artifact(&self, package: &str, type_name: &str) -> bool {
        self.entry(package, type_name).is_some()
    }

    fn record(&mut self, artifact: &RedactionArtifact, outcome: EmitOutcome) {
        if self
            .artifacts
            .iter()
            .any(|e| e.package == artifact.key.package && e.artifact == artifact.key.name)
        {
            return;
        }
        let file = artifact
            .key
            .relative_path()
            .iter()
            .map(|part| part.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        self.artifacts.push(ManifestEntry {
            package: artifact.key.package.clone(),
            type_name: artifact.ty.name().to_string(),
            artifact: artifact.key.name.clone(),
            file,
            outcome,
        });
    }
}

/// Output directory and bookkeeping for one run.
#[derive(Debug)]
pub struct EmissionContext {
    root: PathBuf,
    manifest: Manifest,
}

impl EmissionContext {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            manifest: Manifest::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn target_path(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Writes the artifact unless one already exists under its key.
    pub fn emit(&mut self, artifact: &RedactionArtifact) -> Result<EmitOutcome> {
        let path = self.target_path(&artifact.key);
        let outcome = if path.exists() {
            EmitOutcome::Skipped
        } else {
            write_new(&path, &artifact.text)?
        };
        self.manifest.record(artifact, outcome);
        Ok(outcome)
    }

    /// Writes one `masks.rs` per package that `include!`s all of its artifacts.
    pub fn write_index(&self) -> Result<Vec<PathBuf>> {
        let mut packages: BTreeMap<&str, Vec<&ManifestEntry>> = BTreeMap::new();
        for entry in &self.manifest.artifacts {
            packages.entry(&entry.package).or_default().push(entry);
        }

        let mut written = Vec::with_capacity(packages.len());
        for (package, entries) in packages {
            let dir = self.root.join(package_dir(package));
            fs::create_dir_all(&dir).map_err(|source| GenerationError::io(&dir, source))?;
            let dir = fs::canonicalize(&dir).map_err(|source| GenerationError::io(&dir, source))?;

            let mut text = String::from("// @generated by masking-codegen. Do not edit.\n");
            for entry in entries {
                let file = dir.join(format!("{}.rs", entry.artifact));
                let literal = Literal::string(&file.to_string_lossy());
                text.push_str(&format!("include!({literal});\n"));
            }
            let path = dir.join(INDEX_FILE);
            write_replace(&path, &text)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Persists the manifest as `manifest.json` at the output root.
    pub fn write_manifest(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.root).map_err(|source| GenerationError::io(&self.root, source))?;
        let path = self.root.join(MANIFEST_FILE);
        write_replace(&path, &self.manifest.to_json()?)?;
        Ok(path)
    }
}

fn staged(path: &Path, text: &str) -> Result<NamedTempFile> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|source| GenerationError::io(dir, source))?;
    let mut file = NamedTempFile::new_in(dir).map_err(|source| GenerationError::io(dir, source))?;
    file.write_all(text.as_bytes())
        .and_then(|()| file.flush())
        .map_err(|source| GenerationError::io(file.path(), source))?;
    Ok(file)
}

fn write_new(path: &Path, text: &str) -> Result<EmitOutcome> {
    let file = staged(path, text)?;
    match file.persist_noclobber(path) {
        Ok(_) => Ok(EmitOutcome::Written),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => Ok(EmitOutcome::Skipped),
        Err(err) => Err(GenerationError::io(path, err.error)),
    }
}

fn write_replace(path: &Path, text: &str) -> Result<()> {
    let file = staged(path, text)?;
    file.persist(path)
        .map(|_| ())
        .map_err(|err| GenerationError::io(path, err.error))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(package: &str, name: &str, text: &str) -> RedactionArtifact {
        let ty = TypeId::new(package, name);
        RedactionArtifact::new(ArtifactKey::for_type(&ty), ty, text.to_string())
    }

    #[test]
    fn key_naming() {
        let key = ArtifactKey::for_type(&TypeId::new("models::billing", "Card"));
        assert_eq!(key.name, "CardMask");
        assert_eq!(key.to_string(), "models::billing::CardMask");
        assert_eq!(
            key.relative_path(),
            Path::new("models").join("billing").join("CardMask.rs")
        );
        let root = ArtifactKey::for_type(&TypeId::new("", "Card"));
        assert_eq!(root.relative_path(), Path::new("CardMask.rs"));
    }

    #[test]
    fn writes_then_skips() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = EmissionContext::new(dir.path());

        let first = artifact("models", "Inner", "// first\n");
        assert_eq!(ctx.emit(&first).unwrap(), EmitOutcome::Written);

        let second = artifact("models", "Inner", "// second\n");
        assert_eq!(ctx.emit(&second).unwrap(), EmitOutcome::Skipped);

        let on_disk = fs::read_to_string(ctx.target_path(&first.key)).unwrap();
        assert_eq!(on_disk, "// first\n");
        assert_eq!(ctx.manifest().artifacts.len(), 1);
        assert_eq!(ctx.manifest().artifacts[0].outcome, EmitOutcome::Written);
    }

    #[test]
    fn pre_existing_file_is_skipped_and_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("models").join("InnerMask.rs");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "// from an earlier run\n").unwrap();

        let mut ctx = EmissionContext::new(dir.path());
        let outcome = ctx.emit(&artifact("models", "Inner", "// new\n")).unwrap();
        assert_eq!(outcome, EmitOutcome::Skipped);
        assert_eq!(fs::read_to_string(&target).unwrap(), "// from an earlier run\n");
        assert!(ctx.manifest().has_artifact("models", "Inner"));
    }

    #[test]
    fn no_temporary_files_are_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = EmissionContext::new(dir.path());
        ctx.emit(&artifact("", "A", "// a\n")).unwrap();
        ctx.emit(&artifact("", "A", "// a again\n")).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["AMask.rs"]);
    }

    #[test]
    fn index_includes_every_artifact_of_a_package() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = EmissionContext::new(dir.path());
        ctx.emit(&artifact("models", "A1", "// a1\n")).unwrap();
        ctx.emit(&artifact("models", "Inner", "// inner\n")).unwrap();
        ctx.emit(&artifact("other", "Card", "// card\n")).unwrap();

        let written = ctx.write_index().unwrap();
        assert_eq!(written.len(), 2);

        let index = fs::read_to_string(dir.path().join("models").join(INDEX_FILE)).unwrap();
        let includes: Vec<_> = index.lines().filter(|l| l.starts_with("include!")).collect();
        assert_eq!(includes.len(), 2);
        assert!(includes[0].contains("A1Mask.rs"));
        assert!(includes[1].contains("InnerMask.rs"));
    }

    #[test]
    fn manifest_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = EmissionContext::new(dir.path());
        ctx.emit(&artifact("models", "A1", "// a1\n")).unwrap();
        let path = ctx.write_manifest().unwrap();

        let manifest = Manifest::from_json_str(&fs::read_to_string(path).unwrap()).unwrap();
        let entry = manifest.entry("models", "A1").unwrap();
        assert_eq!(entry.artifact, "A1Mask");
        assert_eq!(entry.file, "models/A1Mask.rs");
        assert!(!manifest.has_artifact("models", "NoMaskedProperty"));
    }
}
