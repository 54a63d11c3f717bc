//! Pipeline error counters

use dashmap::DashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::error::{ErrorCategory, PipelineError};

/// 错误统计快照
#[derive(Debug, Clone, Serialize)]
pub struct ErrorStatsSnapshot {
    pub total: u64,
    pub by_category: BTreeMap<&'static str, u64>,
    /// 各分类占比（百分比，保留一位小数）
    pub percentages: BTreeMap<&'static str, f64>,
}

/// 按分类累计的错误计数
#[derive(Default)]
pub struct ErrorStats {
    counts: DashMap<ErrorCategory, u64>,
}

impl ErrorStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn record(&self, error: &PipelineError) {
        self.record_category(error.category());
    }

    fn record_category(&self, category: ErrorCategory) {
        *self.counts.entry(category).or_insert(0) += 1;
    }

    pub fn count(&self, category: ErrorCategory) -> u64 {
        self.counts.get(&category).map_or(0, |c| *c)
    }

    pub fn snapshot(&self) -> ErrorStatsSnapshot {
        let by_category: BTreeMap<&'static str, u64> = ErrorCategory::ALL
            .iter()
            .map(|c| (c.as_str(), self.count(*c)))
            .collect();
        let total: u64 = by_category.values().sum();

        let percentages = by_category
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(name, count)| {
                let pct = (*count as f64 / total as f64 * 1000.0).round() / 10.0;
                (*name, pct)
            })
            .collect();

        ErrorStatsSnapshot {
            total,
            by_category,
            percentages,
        }
    }

    pub fn reset(&self) {
        self.counts.clear();
        tracing::info!("Error statistics reset");
    }
}
