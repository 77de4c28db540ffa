use std::sync::atomic::Ordering;
use std::time::Instant;

use log::info;

use crate::train::config::TrainConfig;
use crate::train::epoch_stats::EpochStats;
use crate::train::pool::TrainPool;

/// Runs `config.epochs` epochs on the pool and returns the cost over the
/// training set after the last completed epoch.
///
/// # Early termination
/// The loop breaks early if:
/// - the `progress_tx` receiver has been dropped (the listener went away), or
/// - `config.stop_flag` is set to `true`.
///
/// Both are checked between epochs only; a started round always runs to
/// completion for every worker.
pub fn train_loop(pool: &mut TrainPool, config: &TrainConfig) -> f64 {
    let mut last_cost = pool.cost();

    for epoch in 1..=config.epochs {
        if let Some(ref flag) = config.stop_flag {
            if flag.load(Ordering::Relaxed) {
                break;
            }
        }

        let t_start = Instant::now();
        pool.train_epoch(config.learning_rate);
        let elapsed_ms = t_start.elapsed().as_millis() as u64;

        let cost = pool.cost();
        last_cost = cost;
        info!(
            "epoch {epoch}/{}: cost {cost:.6} ({elapsed_ms} ms)",
            config.epochs
        );

        if let Some(ref tx) = config.progress_tx {
            let stats = EpochStats {
                epoch,
                total_epochs: config.epochs,
                cost,
                elapsed_ms,
            };
            // If the receiver has been dropped, stop training.
            if tx.send(stats).is_err() {
                break;
            }
        }

        if let Some(ref flag) = config.stop_flag {
            if flag.load(Ordering::Relaxed) {
                break;
            }
        }
    }

    last_cost
}
