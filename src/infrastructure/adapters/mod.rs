//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod playback;
pub mod tts;

pub use playback::*;
pub use tts::*;
