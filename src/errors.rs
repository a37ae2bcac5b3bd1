//! Error Types
//!
//! The main error type [`LumenError`] covers the failure modes of the
//! animation / LOD core: animation asset loading, malformed binary data and
//! mesh input validation.
//!
//! Missing assets are recoverable by design: callers downgrade them to a
//! warning and fall back to static transforms or the full-resolution mesh.
//! Malformed binary data is a hard error; a partially decoded keyframe tree
//! must never reach the animation pass.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for the Lumen core.
#[derive(Error, Debug)]
pub enum LumenError {
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested animation asset was not found.
    #[error("Animation asset not found: {0:?}")]
    AnimationNotFound(PathBuf),

    /// A keyframe tree blob failed to decode.
    #[error("Malformed animation data: {0}")]
    MalformedAnimation(String),

    /// A `.lod` cache file failed validation.
    #[error("Malformed LOD cache {path:?}: {reason}")]
    MalformedLodCache {
        /// Path of the offending cache file
        path: PathBuf,
        /// What failed to validate
        reason: String,
    },

    /// Mesh input rejected by the simplifier.
    #[error("Invalid mesh input: {0}")]
    InvalidMesh(String),
}

/// Alias for `Result<T, LumenError>`.
pub type Result<T> = std::result::Result<T, LumenError>;
