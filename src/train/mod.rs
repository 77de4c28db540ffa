pub mod pool;
pub mod sequential;
pub mod config;
pub mod epoch_stats;
pub mod loop_fn;

pub use pool::TrainPool;
pub use sequential::train_epoch;
pub use config::TrainConfig;
pub use epoch_stats::EpochStats;
pub use loop_fn::train_loop;
