//! Error taxonomy for a generation run.
//!
//! Only [`GenerationError::MissingRequiredMarkerType`] stops a run. Everything
//! else is scoped to the type being processed and ends up in the diagnostic
//! sink with the severity returned by [`GenerationError::severity`].

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::{diagnostics::Severity, emit::ArtifactKey, schema::TypeId};

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, GenerationError>;

#[derive(Debug, Error)]
pub enum GenerationError {
    /// The eligible-model marker itself is not visible to the provider.
    #[error("model marker `{marker}` could not be resolved; deferring to the next round")]
    MissingRequiredMarkerType { marker: String },

    /// A field's type is neither builtin nor a declared record.
    #[error("field `{field}` of `{owner}` has unresolved type `{ty}`; treating it as opaque")]
    UnresolvedFieldType {
        owner: TypeId,
        field: String,
        ty: String,
    },

    /// Traversal reached a type that is already on the current path.
    #[error("`{ty}` is already on path `{path}`; not descending again")]
    CyclicTypeGraph { ty: TypeId, path: String },

    /// An artifact with the same key already exists in the output directory.
    #[error("artifact `{key}` already exists, skipping generation")]
    DuplicateArtifact { key: ArtifactKey },

    /// The type cannot receive a generated impl.
    #[error("cannot generate a mask for `{ty}`: {reason}")]
    UnsupportedType { ty: TypeId, reason: String },

    /// The provider returned no declaration for a type it referenced.
    #[error("no declaration found for `{ty}`")]
    UnknownType { ty: TypeId },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: syn::Error,
    },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenerationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Severity used when this error is reported to a diagnostic sink.
    pub fn severity(&self) -> Severity {
        match self {
            Self::UnresolvedFieldType { .. } => Severity::Warning,
            Self::CyclicTypeGraph { .. } | Self::DuplicateArtifact { .. } => Severity::Info,
            Self::MissingRequiredMarkerType { .. }
            | Self::UnsupportedType { .. }
            | Self::UnknownType { .. }
            | Self::Parse { .. }
            | Self::Io { .. }
            | Self::Json(_) => Severity::Error,
        }
    }

    /// Stable short name, emitted as the `kind` key of diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingRequiredMarkerType { .. } => "missing_marker",
            Self::UnresolvedFieldType { .. } => "unresolved_field_type",
            Self::CyclicTypeGraph { .. } => "cyclic_type_graph",
            Self::DuplicateArtifact { .. } => "duplicate_artifact",
            Self::UnsupportedType { .. } => "unsupported_type",
            Self::UnknownType { .. } => "unknown_type",
            Self::Parse { .. } => "parse",
            Self::Io { .. } => "io",
            Self::Json(_) => "json",
        }
    }

    /// Only a missing marker aborts the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MissingRequiredMarkerType { .. })
    }
}
