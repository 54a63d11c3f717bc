//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 合成参数（VoiceSettings）定义与校验

mod errors;
mod value_objects;

pub use errors::VoiceError;
pub use value_objects::VoiceSettings;
