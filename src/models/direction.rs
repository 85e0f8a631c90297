use serde::{Deserialize, Serialize};
use std::fmt;

/// 指标名中出现这些子串（不区分大小写）时，该指标越大越好
pub const MAXIMIZE_KEYWORDS: [&str; 4] = ["acc", "auc", "precision", "recall"];

/// 监控指标的优化方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Maximize, // 越大越好，例如 val_accuracy
    Minimize, // 越小越好，例如 val_loss
}

impl Direction {
    /// 根据指标名推断优化方向
    ///
    /// 空字符串或不含关键字的指标名一律视为 `Minimize`
    pub fn from_monitor(monitor: &str) -> Self {
        let monitor_lower = monitor.to_lowercase();
        if MAXIMIZE_KEYWORDS.iter().any(|k| monitor_lower.contains(k)) {
            Direction::Maximize
        } else {
            Direction::Minimize
        }
    }

    /// 尚无任何观测值时的“最优值”初值
    pub fn worst_value(&self) -> f64 {
        match self {
            Direction::Maximize => f64::NEG_INFINITY,
            Direction::Minimize => f64::INFINITY,
        }
    }

    /// `current` 是否比 `best` 至少好 `min_delta`
    pub fn is_improvement(&self, current: f64, best: f64, min_delta: f64) -> bool {
        match self {
            Direction::Maximize => current > best + min_delta,
            Direction::Minimize => current < best - min_delta,
        }
    }

    pub fn as_mode(&self) -> &'static str {
        match self {
            Direction::Maximize => "max",
            Direction::Minimize => "min",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_mode())
    }
}
