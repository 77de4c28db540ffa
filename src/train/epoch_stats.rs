use serde::{Deserialize, Serialize};

/// Per-epoch training statistics emitted by `train_loop`.
///
/// When a `progress_tx` channel is configured in `TrainConfig`, the training
/// loop sends one `EpochStats` value at the end of every completed epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Mean squared error over the full training set after this epoch.
    pub cost: f64,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}
