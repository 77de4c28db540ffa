use std::sync::mpsc;
use std::sync::{atomic::AtomicBool, Arc};

use crate::train::epoch_stats::EpochStats;

/// Hyperparameters for a training run. The engine holds no global
/// configuration; everything it needs arrives through this struct.
///
/// # Fields
/// - `epochs`        — full passes over the shuffled training set
/// - `batch_size`    — samples per worker per round; gradients are averaged
///                     over each batch before a parameter update
/// - `threads`       — worker threads in the pool
/// - `learning_rate` — gradient-descent step size
/// - `seed`          — optional RNG seed; a fixed seed plus a fixed thread
///                     count makes the whole weight trajectory reproducible
/// - `progress_tx`   — optional channel sender; one `EpochStats` is sent per
///                     completed epoch. If the receiver is dropped the loop
///                     terminates early (clean shutdown).
/// - `stop_flag`     — optional atomic flag checked between epochs; there is
///                     no mid-round cancellation
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub threads: usize,
    pub learning_rate: f64,
    pub seed: Option<u64>,
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a minimal `TrainConfig` with no seed, no progress channel and
    /// no stop flag.
    pub fn new(epochs: usize, batch_size: usize, threads: usize, learning_rate: f64) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            threads,
            learning_rate,
            seed: None,
            progress_tx: None,
            stop_flag: None,
        }
    }
}
