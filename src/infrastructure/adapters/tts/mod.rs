//! TTS Adapter - Style-Bert-VITS2 HTTP 客户端与测试用实现

mod fake_tts_client;
mod http_tts_client;

pub use fake_tts_client::{FakeTtsClient, FakeTtsClientConfig, FAKE_AUDIO_HEADER};
pub use http_tts_client::{HttpTtsClient, HttpTtsClientConfig};
