pub mod channel;

pub use channel::{channel, Receiver, Sender};
