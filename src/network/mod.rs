pub mod network;
pub mod gradients;
pub mod dump;

pub use gradients::Gradients;
pub use network::Network;
