//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};

use super::VoiceError;

/// 语音合成参数
///
/// 值对象：字段相同的两个实例在缓存意义上完全等价。
/// 序列化为 JSON 时字段按 key 排序，与构造顺序无关。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// 模型 ID
    #[serde(default = "default_model_id")]
    pub model_id: u32,

    /// 说话人 ID
    #[serde(default)]
    pub speaker_id: u32,

    /// 风格
    #[serde(default = "default_style")]
    pub style: String,

    /// SDP/DP 混合比 (0.0 - 1.0)
    #[serde(default = "default_sdp_ratio")]
    pub sdp_ratio: f64,

    /// 噪声
    #[serde(default = "default_noise")]
    pub noise: f64,

    /// 噪声 w
    #[serde(default = "default_noisew")]
    pub noisew: f64,

    /// 语速倍率（越大越慢）
    #[serde(default = "default_length")]
    pub length: f64,

    /// 语言
    #[serde(default = "default_language")]
    pub language: String,

    /// 是否按换行自动分割
    #[serde(default = "default_auto_split")]
    pub auto_split: bool,

    /// 分割间隔（秒）
    #[serde(default = "default_split_interval")]
    pub split_interval: f64,
}

fn default_model_id() -> u32 {
    7
}

fn default_style() -> String {
    "Neutral".to_string()
}

fn default_sdp_ratio() -> f64 {
    0.2
}

fn default_noise() -> f64 {
    0.6
}

fn default_noisew() -> f64 {
    0.8
}

fn default_length() -> f64 {
    1.0
}

fn default_language() -> String {
    "JP".to_string()
}

fn default_auto_split() -> bool {
    true
}

fn default_split_interval() -> f64 {
    0.5
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            model_id: default_model_id(),
            speaker_id: 0,
            style: default_style(),
            sdp_ratio: default_sdp_ratio(),
            noise: default_noise(),
            noisew: default_noisew(),
            length: default_length(),
            language: default_language(),
            auto_split: default_auto_split(),
            split_interval: default_split_interval(),
        }
    }
}

impl VoiceSettings {
    pub fn validate(&self) -> Result<(), VoiceError> {
        if !(0.0..=1.0).contains(&self.sdp_ratio) {
            return Err(VoiceError::InvalidSetting(
                "sdp_ratio 必须在 0.0 到 1.0 之间".to_string(),
            ));
        }
        if self.noise < 0.0 || self.noisew < 0.0 {
            return Err(VoiceError::InvalidSetting("noise 不能为负数".to_string()));
        }
        if self.length <= 0.0 {
            return Err(VoiceError::InvalidSetting("length 必须大于 0".to_string()));
        }
        if self.split_interval < 0.0 {
            return Err(VoiceError::InvalidSetting(
                "split_interval 不能为负数".to_string(),
            ));
        }
        if self.style.is_empty() || self.language.is_empty() {
            return Err(VoiceError::InvalidSetting(
                "style 和 language 不能为空".to_string(),
            ));
        }
        Ok(())
    }

    /// 规范化表示（key 排序后的 JSON 对象）
    pub fn canonical_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// 转换为 HTTP 查询参数
    ///
    /// 布尔值以小写字符串传递
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("model_id", self.model_id.to_string()),
            ("speaker_id", self.speaker_id.to_string()),
            ("style", self.style.clone()),
            ("sdp_ratio", self.sdp_ratio.to_string()),
            ("noise", self.noise.to_string()),
            ("noisew", self.noisew.to_string()),
            ("length", self.length.to_string()),
            ("language", self.language.clone()),
            ("auto_split", self.auto_split.to_string()),
            ("split_interval", self.split_interval.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = VoiceSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.model_id, 7);
        assert_eq!(settings.style, "Neutral");
        assert_eq!(settings.language, "JP");
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut settings = VoiceSettings::default();
        settings.sdp_ratio = 1.5;
        assert!(settings.validate().is_err());

        let mut settings = VoiceSettings::default();
        settings.length = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_canonical_value_has_sorted_keys() {
        let value = VoiceSettings::default().canonical_value();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_construction_order_does_not_matter() {
        let a: VoiceSettings =
            serde_json::from_str(r#"{"style":"Happy","model_id":3,"speaker_id":1}"#).unwrap();
        let b: VoiceSettings =
            serde_json::from_str(r#"{"speaker_id":1,"model_id":3,"style":"Happy"}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.canonical_value(), b.canonical_value());
    }

    #[test]
    fn test_query_pairs_lowercase_bool() {
        let pairs = VoiceSettings::default().to_query_pairs();
        let auto_split = pairs.iter().find(|(k, _)| *k == "auto_split").unwrap();
        assert_eq!(auto_split.1, "true");
    }
}
