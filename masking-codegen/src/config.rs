//! Generator configuration.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

/// Names the generator looks for and paths it writes into generated code.
///
/// `model_marker` and `sensitive_attribute` only change what the generator
/// recognizes. The `masking` derives register `Model` and `#[sensitive]` and
/// nothing else, so a crate that renames either one must supply the marker
/// itself: its own derive registering the attribute, or a trait implemented
/// with `impl <marker> for T {}` next to the struct.
///
/// Every field has a default, so a JSON config only needs the keys it changes:
///
/// ```
/// # use masking_codegen::GeneratorConfig;
/// let config = GeneratorConfig::from_json_str(r#"{ "runtime_path": "::my_masking" }"#).unwrap();
/// assert_eq!(config.model_marker, "Model");
/// assert_eq!(config.runtime_path, "::my_masking");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Derive or trait name that marks a type as eligible for a generated mask.
    /// Defaults to the `Model` derive.
    pub model_marker: String,
    /// Field attribute that marks a field as sensitive. Defaults to
    /// `sensitive`, the only attribute `masking-derive` registers.
    pub sensitive_attribute: String,
    /// Path to the runtime crate in generated code.
    pub runtime_path: String,
    /// Path prefix for package-qualified types in generated code.
    pub crate_root: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model_marker: "Model".to_string(),
            sensitive_attribute: "sensitive".to_string(),
            runtime_path: "::masking".to_string(),
            crate_root: "crate".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| GenerationError::io(path, source))?;
        Self::from_json_str(&json)
    }

    #[must_use]
    pub fn with_model_marker(mut self, marker: impl Into<String>) -> Self {
        self.model_marker = marker.into();
        self
    }

    #[must_use]
    pub fn with_sensitive_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.sensitive_attribute = attribute.into();
        self
    }

    #[must_use]
    pub fn with_runtime_path(mut self, path: impl Into<String>) -> Self {
        self.runtime_path = path.into();
        self
    }

    #[must_use]
    pub fn with_crate_root(mut self, root: impl Into<String>) -> Self {
        self.crate_root = root.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_is_default() {
        let config = GeneratorConfig::from_json_str("{}").unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = GeneratorConfig::from_json_str(r#"{ "marker": "Model" }"#);
        assert!(matches!(result, Err(GenerationError::Json(_))));
    }

    #[test]
    fn builders_override_fields() {
        let config = GeneratorConfig::default()
            .with_model_marker("Record")
            .with_sensitive_attribute("secret")
            .with_runtime_path("::mask_rt")
            .with_crate_root("crate::inner");
        assert_eq!(config.model_marker, "Record");
        assert_eq!(config.sensitive_attribute, "secret");
        assert_eq!(config.runtime_path, "::mask_rt");
        assert_eq!(config.crate_root, "crate::inner");
    }

    #[test]
    fn defaults_name_the_shipped_markers() {
        let config = GeneratorConfig::default();
        assert_eq!(config.model_marker, "Model");
        assert_eq!(config.sensitive_attribute, "sensitive");
        assert_eq!(config.runtime_path, "::masking");
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("masking.json");
        fs::write(&path, r#"{ "crate_root": "crate::generated" }"#).unwrap();
        let config = GeneratorConfig::from_path(&path).unwrap();
        assert_eq!(config.crate_root, "crate::generated");
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = GeneratorConfig::from_path("/definitely/not/here.json");
        assert!(matches!(result, Err(GenerationError::Io { .. })));
    }
}
