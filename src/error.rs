//! Error types for the simulation core.

use thiserror::Error;

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors surfaced by the simulation core.
///
/// Pool exhaustion and out-of-field placement are not errors; they are
/// silently dropped at the call site.
#[derive(Error, Debug)]
pub enum SimError {
    /// The snapshot document could not be parsed at all.
    #[error("malformed scene snapshot: {0}")]
    MalformedSnapshot(#[source] serde_json::Error),

    /// The current scene could not be written out as a snapshot.
    #[error("could not encode scene snapshot: {0}")]
    SnapshotEncode(#[source] serde_json::Error),

    /// The snapshot declares a format version this build cannot read.
    #[error("unsupported snapshot version {found} (newest supported is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    /// A material key that has no entry in the material table.
    #[error("unknown material: {0:?}")]
    UnknownMaterial(String),

    /// A single snapshot record is unusable.
    #[error("invalid record #{index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    /// Configuration values that cannot describe a field.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
