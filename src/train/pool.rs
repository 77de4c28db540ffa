use std::sync::{Arc, RwLock};
use std::thread::{self, JoinHandle};

use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::channel::channel::{channel, Receiver, Sender};
use crate::error::EngineError;
use crate::math::matrix::Matrix;
use crate::network::gradients::Gradients;
use crate::network::network::Network;
use crate::train::config::TrainConfig;

/// Everything a worker needs to compute gradients for its shard of a round.
///
/// The datasets are immutable and shared by reference. The network and the
/// index permutation are only ever written by the coordinator, and only
/// while every worker is parked at the round barrier, so workers take
/// uncontended read locks on the hot path.
struct TrainState {
    network: RwLock<Network>,
    inputs: Vec<Matrix>,
    targets: Vec<Matrix>,
    batch_idxs: RwLock<Vec<usize>>,
    batch_size: usize,
}

/// One worker's result for one round: its batch gradient (already averaged
/// over its own samples) and how many samples that average covers.
struct WorkerReport {
    gradients: Gradients,
    samples: usize,
}

/// A fixed pool of persistent worker threads driven by hand-built channels.
///
/// Each worker owns a dedicated `(start-Receiver, done-Sender)` pair; the
/// pool holds the matching `(start-Sender, done-Receiver)`. A training epoch
/// is a sequence of barrier-synchronized rounds: the coordinator sends one
/// start token per worker, blocks until every active worker has reported its
/// gradients, folds the reports in worker-index order into one aggregate and
/// applies it once. Workers never write the network, so the weight
/// trajectory is deterministic for a fixed seed and thread count.
///
/// Dropping the pool drops every start sender; each worker's next `recv`
/// observes the closed channel, its loop exits, and the threads are joined.
pub struct TrainPool {
    state: Arc<TrainState>,
    send_start: Vec<Sender<usize>>,
    recv_done: Vec<Receiver<WorkerReport>>,
    workers: Vec<JoinHandle<()>>,
    rng: StdRng,
}

impl std::fmt::Debug for TrainPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainPool")
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

fn worker_loop(state: Arc<TrainState>, start: Receiver<usize>, done: Sender<WorkerReport>) {
    // A start token is this worker's offset into the current permutation;
    // channel closure is the shutdown signal.
    while let Some(offset) = start.recv() {
        let (batch_inputs, batch_targets, samples) = {
            let idxs = state.batch_idxs.read().unwrap();
            let end = (offset + state.batch_size).min(idxs.len());
            let shard = &idxs[offset..end];

            let input_cols: Vec<&Matrix> = shard.iter().map(|&idx| &state.inputs[idx]).collect();
            let target_cols: Vec<&Matrix> = shard.iter().map(|&idx| &state.targets[idx]).collect();
            (
                Matrix::from_columns(&input_cols),
                Matrix::from_columns(&target_cols),
                shard.len(),
            )
        };

        let gradients = {
            let network = state.network.read().unwrap();
            network.backprop_batch(&batch_inputs, &batch_targets)
        };

        done.send(WorkerReport { gradients, samples });
    }
}

impl TrainPool {
    /// Spawns `config.threads` persistent workers over the given network and
    /// dataset. The dataset comes from an external loader, so disagreements
    /// with the network contract are rejected rather than aborted on.
    pub fn new(
        network: Network,
        inputs: Vec<Matrix>,
        targets: Vec<Matrix>,
        config: &TrainConfig,
    ) -> Result<TrainPool, EngineError> {
        assert!(config.threads > 0, "thread count must be at least 1");
        assert!(config.batch_size > 0, "batch_size must be at least 1");

        if inputs.is_empty() {
            return Err(EngineError::DatasetMismatch("dataset is empty".to_string()));
        }
        if inputs.len() != targets.len() {
            return Err(EngineError::DatasetMismatch(format!(
                "{} inputs but {} targets",
                inputs.len(),
                targets.len()
            )));
        }
        for (idx, (input, target)) in inputs.iter().zip(targets.iter()).enumerate() {
            if input.cols != 1 || input.rows != network.input_size() {
                return Err(EngineError::DatasetMismatch(format!(
                    "input {idx} has size ({} {}), expected ({} 1)",
                    input.rows,
                    input.cols,
                    network.input_size()
                )));
            }
            if target.cols != 1 || target.rows != network.output_size() {
                return Err(EngineError::DatasetMismatch(format!(
                    "target {idx} has size ({} {}), expected ({} 1)",
                    target.rows,
                    target.cols,
                    network.output_size()
                )));
            }
        }

        let sample_count = inputs.len();
        let state = Arc::new(TrainState {
            network: RwLock::new(network),
            inputs,
            targets,
            batch_idxs: RwLock::new((0..sample_count).collect()),
            batch_size: config.batch_size,
        });

        let mut send_start = Vec::with_capacity(config.threads);
        let mut recv_done = Vec::with_capacity(config.threads);
        let mut workers = Vec::with_capacity(config.threads);
        for _ in 0..config.threads {
            let (tx_start, rx_start) = channel();
            let (tx_done, rx_done) = channel();
            send_start.push(tx_start);
            recv_done.push(rx_done);

            let state = Arc::clone(&state);
            workers.push(thread::spawn(move || worker_loop(state, rx_start, tx_done)));
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(TrainPool {
            state,
            send_start,
            recv_done,
            workers,
            rng,
        })
    }

    /// One full pass over the training set.
    ///
    /// Reshuffles the sample permutation, then covers it in
    /// `threads * batch_size` strides. Each round sends one start token to
    /// every worker with a non-empty shard, waits for all of them (a full
    /// barrier), folds their reports into a sample-count-weighted mean
    /// gradient and applies it once under the write lock.
    pub fn train_epoch(&mut self, learning_rate: f64) {
        let n = {
            let mut idxs = self.state.batch_idxs.write().unwrap();
            *idxs = (0..self.state.inputs.len()).collect();
            idxs.shuffle(&mut self.rng);
            idxs.len()
        };

        let stride = self.send_start.len() * self.state.batch_size;
        let mut round_start = 0;
        while round_start < n {
            let mut active = 0;
            for (worker_idx, start) in self.send_start.iter().enumerate() {
                let offset = round_start + worker_idx * self.state.batch_size;
                if offset >= n {
                    break;
                }
                start.send(offset);
                active += 1;
            }

            // Round barrier. Reports are folded in worker-index order so the
            // aggregate is independent of thread scheduling.
            let reports: Vec<WorkerReport> = self.recv_done[..active]
                .iter()
                .map(|done| done.recv().expect("worker exited mid-round"))
                .collect();

            let total: usize = reports.iter().map(|report| report.samples).sum();
            let mut aggregate: Option<Gradients> = None;
            for report in reports {
                let mut gradients = report.gradients;
                gradients.scale(report.samples as f64 / total as f64);
                match aggregate.as_mut() {
                    Some(acc) => acc.add_assign(&gradients),
                    None => aggregate = Some(gradients),
                }
            }
            if let Some(gradients) = aggregate {
                self.state
                    .network
                    .write()
                    .unwrap()
                    .apply_gradients(&gradients, learning_rate);
            }

            debug!(
                "round at offset {round_start}: {active} workers, {total} samples"
            );
            round_start += stride;
        }
    }

    /// Mean squared error of the current network over the full training set.
    pub fn cost(&self) -> f64 {
        self.state
            .network
            .read()
            .unwrap()
            .cost(&self.state.inputs, &self.state.targets)
    }

    /// A copy of the network as of the last completed round.
    pub fn snapshot(&self) -> Network {
        self.state.network.read().unwrap().clone()
    }

    pub fn threads(&self) -> usize {
        self.send_start.len()
    }

    /// Shuts the pool down and returns the trained network.
    pub fn into_network(mut self) -> Network {
        self.shutdown();
        let state = Arc::clone(&self.state);
        drop(self);
        match Arc::try_unwrap(state) {
            Ok(state) => state.network.into_inner().unwrap(),
            // A worker leaked its Arc clone; fall back to copying.
            Err(state) => state.network.read().unwrap().clone(),
        }
    }

    fn shutdown(&mut self) {
        // Dropping the start senders closes every worker's channel; their
        // loops observe `None` and return.
        self.send_start.clear();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for TrainPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
