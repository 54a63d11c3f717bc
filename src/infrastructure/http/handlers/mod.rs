//! HTTP Handlers

mod channel;
mod ping;
mod speak;
mod stats;
mod websocket;

pub use channel::*;
pub use ping::*;
pub use speak::*;
pub use stats::*;
pub use websocket::*;
