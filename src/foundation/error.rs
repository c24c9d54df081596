use std::path::PathBuf;

/// Convenience result type used across nftgen.
pub type NftgenResult<T> = Result<T, NftgenError>;

/// Top-level error taxonomy used by generation APIs.
#[derive(thiserror::Error, Debug)]
pub enum NftgenError {
    /// Invalid user configuration or layer catalog. Raised before any output is produced.
    #[error("configuration error: {0}")]
    Config(String),

    /// A selected layer element image could not be loaded or decoded.
    #[error("asset load error: '{path}': {reason}")]
    AssetLoad {
        /// Path of the element that failed.
        path: PathBuf,
        /// Human readable cause.
        reason: String,
    },

    /// Surface allocation, compositing or encoding failed.
    #[error("render error: {0}")]
    Render(String),

    /// Filesystem failure on a specific path.
    #[error("io error: '{path}': {source}")]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NftgenError {
    /// Build a [`NftgenError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`NftgenError::AssetLoad`] value.
    pub fn asset_load(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::AssetLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`NftgenError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`NftgenError::Io`] value.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a [`NftgenError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether this error belongs to the pre-run configuration class.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
