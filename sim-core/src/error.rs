//! Error types for strand placement and configuration.

use thiserror::Error;

/// Errors surfaced by the hair core.
///
/// Degenerate vectors met during integration are not errors; they are
/// recovered where they occur by falling back to a fixed direction.
#[derive(Error, Debug)]
pub enum HairError {
    /// The mesh snapshot is absent or malformed.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// The color threshold excludes every triangle of the mesh.
    #[error("no triangle has all vertex colors below threshold {threshold}")]
    NoSpawnRegion {
        /// Threshold that was applied.
        threshold: f32,
    },

    /// A configuration value is out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, HairError>;
