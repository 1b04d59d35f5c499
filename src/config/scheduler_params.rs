use crate::domain::types::{CriticalityLevel, WindowType};
use serde::{Deserialize, Serialize};

/// 工期范围（天）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationRange {
    pub min_days: f64,
    pub max_days: f64,
}

impl DurationRange {
    pub const fn new(min_days: f64, max_days: f64) -> Self {
        Self { min_days, max_days }
    }

    /// 将工期夹在范围内
    pub fn clamp(&self, days: f64) -> f64 {
        days.max(self.min_days).min(self.max_days)
    }
}

/// 排程参数
///
/// 存储位置：config_kv（scope_id='global'，key='scheduler/{field}'）
/// 未配置的字段使用默认值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerParams {
    /// 严重度权重
    pub weight_critical: f64,
    pub weight_high: f64,
    pub weight_normal: f64,
    pub weight_low: f64,

    /// 关联设备时的紧迫度系数
    pub equipment_factor: f64,

    /// 无行动计划时的处理工期（天）
    pub default_processing_days: f64,

    /// 目标利用率（%），效率评分在此处取满分
    pub target_utilization_pct: f64,

    /// 超载阈值（%），利用率严格大于该值视为超载
    pub overload_threshold_pct: f64,

    /// 低利用阈值（%），利用率严格小于该值视为低利用
    pub underutilized_threshold_pct: f64,

    /// 每出现一种严重度等级的均衡分
    pub balance_points_per_level: f64,

    /// 窗口类型工期范围
    pub force_range: DurationRange,
    pub minor_range: DurationRange,
    pub major_range: DurationRange,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            weight_critical: 10.0,
            weight_high: 7.0,
            weight_normal: 4.0,
            weight_low: 1.0,
            equipment_factor: 1.2,
            default_processing_days: 1.0,
            target_utilization_pct: 85.0,
            overload_threshold_pct: 100.0,
            underutilized_threshold_pct: 50.0,
            balance_points_per_level: 10.0,
            force_range: DurationRange::new(1.0, 3.0),
            minor_range: DurationRange::new(3.0, 7.0),
            major_range: DurationRange::new(14.0, 42.0),
        }
    }
}

impl SchedulerParams {
    /// 严重度权重
    pub fn criticality_weight(&self, level: CriticalityLevel) -> f64 {
        match level {
            CriticalityLevel::Critical => self.weight_critical,
            CriticalityLevel::High => self.weight_high,
            CriticalityLevel::Normal => self.weight_normal,
            CriticalityLevel::Low => self.weight_low,
        }
    }

    /// 窗口类型对应的工期范围
    pub fn duration_range(&self, window_type: WindowType) -> DurationRange {
        match window_type {
            WindowType::Force => self.force_range,
            WindowType::Minor => self.minor_range,
            WindowType::Major => self.major_range,
        }
    }

    /// 能容纳所需工期的最小窗口类型（超出大修上限时仍返回 Major）
    pub fn window_type_for(&self, required_days: f64) -> WindowType {
        if required_days <= self.force_range.max_days {
            WindowType::Force
        } else if required_days <= self.minor_range.max_days {
            WindowType::Minor
        } else {
            WindowType::Major
        }
    }
}
