pub mod channel;

pub use channel::ChannelState;
