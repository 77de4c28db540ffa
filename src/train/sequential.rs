use rand::seq::SliceRandom;
use rand::Rng;

use crate::math::matrix::Matrix;
use crate::network::network::Network;

/// One epoch of plain, single-threaded mini-batch SGD.
///
/// The sample order is reshuffled with `rng`, then each batch is assembled
/// from column samples, run through `backprop_batch` and applied
/// immediately. `TrainPool` with one worker thread and the same seed walks
/// the exact same weight trajectory, which makes this loop the oracle for
/// the pool's determinism test and a reasonable choice for small problems
/// where thread orchestration costs more than it saves.
///
/// # Panics
/// Panics if the dataset is empty, lengths mismatch, or `batch_size == 0`.
pub fn train_epoch<R: Rng>(
    network: &mut Network,
    inputs: &[Matrix],
    targets: &[Matrix],
    batch_size: usize,
    learning_rate: f64,
    rng: &mut R,
) {
    assert!(!inputs.is_empty(), "inputs must not be empty");
    assert_eq!(
        inputs.len(),
        targets.len(),
        "inputs and targets must have equal length"
    );
    assert!(batch_size > 0, "batch_size must be at least 1");

    let n = inputs.len();
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    for batch_start in (0..n).step_by(batch_size) {
        let batch_end = (batch_start + batch_size).min(n);
        let shard = &indices[batch_start..batch_end];

        let input_cols: Vec<&Matrix> = shard.iter().map(|&idx| &inputs[idx]).collect();
        let target_cols: Vec<&Matrix> = shard.iter().map(|&idx| &targets[idx]).collect();
        let batch_inputs = Matrix::from_columns(&input_cols);
        let batch_targets = Matrix::from_columns(&target_cols);

        let gradients = network.backprop_batch(&batch_inputs, &batch_targets);
        network.apply_gradients(&gradients, learning_rate);
    }
}
