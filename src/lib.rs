pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod channel;
pub mod train;
pub mod error;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::Activation;
pub use layers::dense::Layer;
pub use network::network::Network;
pub use network::gradients::Gradients;
pub use channel::channel::{channel, Receiver, Sender};
pub use error::EngineError;
pub use train::pool::TrainPool;
pub use train::config::TrainConfig;
pub use train::epoch_stats::EpochStats;
pub use train::loop_fn::train_loop;
pub use train::sequential::train_epoch;
