//! Stats Queries - 缓存、音色与错误统计

/// 查询缓存统计
#[derive(Debug, Clone, Default)]
pub struct GetCacheStats;

/// 查询当前合成参数
#[derive(Debug, Clone, Default)]
pub struct GetVoiceSettings;

/// 查询错误统计
#[derive(Debug, Clone, Default)]
pub struct GetErrorStats;
