use std::path::PathBuf;

use thiserror::Error;

/// Error kinds surfaced by the conversion pipeline.
///
/// Crates propagate `anyhow::Error`; these kinds are raised at the point of
/// failure so the binary can recover them with `downcast_ref` and pick an
/// exit code.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The input cannot be opened or decoded. Raised before any output exists.
    #[error("Impossible de décoder {path} : {reason}")]
    MediaOpen {
        /// Input path.
        path: PathBuf,
        /// Human-readable cause.
        reason: String,
    },

    /// Malformed preset or out-of-range option.
    #[error("Configuration invalide : {0}")]
    Config(String),

    /// The sink or its codec rejected a frame.
    #[error("Erreur d'encodage : {0}")]
    Encode(String),

    /// Filesystem failure while writing output.
    #[error("Écriture impossible dans {path} : {source}")]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl ConvertError {
    /// Process exit code for this kind. `1` is left to untyped failures.
    ///
    /// # Example
    /// ```
    /// use va_core::error::ConvertError;
    /// assert_eq!(ConvertError::Config("x".into()).exit_code(), 3);
    /// ```
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MediaOpen { .. } => 2,
            Self::Config(_) => 3,
            Self::Encode(_) => 4,
            Self::Write { .. } => 5,
        }
    }

    /// Shorthand for a [`ConvertError::Write`] on `path`.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    /// Shorthand for a [`ConvertError::MediaOpen`] on `path`.
    pub fn media_open(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MediaOpen {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
