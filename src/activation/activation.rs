use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// The closed set of elementwise activations. Each variant carries a value
/// function and its derivative; there is deliberately no trait object or
/// user extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Identity,
    Sigmoid,
    ReLU,
}

impl Activation {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            Activation::Identity => x,
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::ReLU => {
                if x > 0.0 {
                    x
                } else {
                    0.0
                }
            }
        }
    }

    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            Activation::Identity => 1.0,
            Activation::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            }
            Activation::ReLU => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Stable name used by the persistence collaborator.
    pub fn name(&self) -> &'static str {
        match self {
            Activation::Identity => "identity",
            Activation::Sigmoid => "sigmoid",
            Activation::ReLU => "relu",
        }
    }

    /// Parses a persisted activation name. The name list comes from storage
    /// or the network, so an unknown name is a recoverable error rather than
    /// a panic.
    pub fn from_name(name: &str) -> Result<Activation, EngineError> {
        match name {
            "identity" => Ok(Activation::Identity),
            "sigmoid" => Ok(Activation::Sigmoid),
            "relu" => Ok(Activation::ReLU),
            other => Err(EngineError::UnknownActivation(other.to_string())),
        }
    }
}
