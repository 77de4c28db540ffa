use std::fmt;

/// Recoverable failures caused by data that originates outside the engine:
/// persisted weight dumps, serialized networks, externally supplied datasets.
///
/// Shape mismatches inside the engine itself (e.g. adding two differently
/// sized matrices) are programmer errors and panic instead; see the matrix
/// and network modules.
#[derive(Debug)]
pub enum EngineError {
    /// A network description is structurally invalid (too few layers,
    /// activation list of the wrong length, inconsistent layer shapes).
    InvalidSpec(String),

    /// A persisted flat dump disagrees with its declared layer sizes.
    CountMismatch {
        /// What was being counted (e.g. "weights", "biases").
        what: &'static str,
        /// Observed element count.
        got: usize,
        /// Count implied by the declared layer sizes.
        expected: usize,
    },

    /// An activation name not in the closed {identity, sigmoid, relu} set.
    UnknownActivation(String),

    /// A dataset handed to the trainer disagrees with the network contract.
    DatasetMismatch(String),

    /// Underlying I/O failure while reading or writing a persisted network.
    Io(std::io::Error),

    /// Malformed JSON while reading a persisted network.
    Json(serde_json::Error),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::InvalidSpec(msg) => write!(f, "invalid network spec: {msg}"),
            EngineError::CountMismatch { what, got, expected } => {
                write!(f, "count mismatch for {what}: got {got}, expected {expected}")
            }
            EngineError::UnknownActivation(name) => {
                write!(f, "unknown activation name: {name:?}")
            }
            EngineError::DatasetMismatch(msg) => write!(f, "dataset mismatch: {msg}"),
            EngineError::Io(e) => write!(f, "io error: {e}"),
            EngineError::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Io(e) => Some(e),
            EngineError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e)
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Json(e)
    }
}
