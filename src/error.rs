use thiserror::Error;

/// Result type alias for sampling, persistence and export operations.
pub type Result<T> = std::result::Result<T, SamplingError>;

/// Errors raised by the sampling engine.
#[derive(Error, Debug)]
pub enum SamplingError {
    /// A record write violated the positions/normals/colors length invariant.
    #[error("{field} has {actual} values, expected {expected}")]
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A polygon has no computable area.
    #[error("face {face} has zero area")]
    DegenerateGeometry { face: usize },

    /// The mesh has nothing to sample from.
    #[error("mesh has no sampleable surface")]
    EmptyMesh,

    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    #[error("invalid sampling configuration: {0}")]
    InvalidConfig(String),

    /// Volume sampling gave up after the configured number of candidates.
    #[error("accepted {accepted} of {target} points after {attempts} attempts")]
    Incomplete {
        accepted: usize,
        target: usize,
        attempts: u64,
    },

    /// The run was cancelled or superseded by a newer one before it finished.
    #[error("sampling run was cancelled")]
    Cancelled,

    /// An encoded record field could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<base64::DecodeError> for SamplingError {
    fn from(err: base64::DecodeError) -> Self {
        SamplingError::Decode(err.to_string())
    }
}
