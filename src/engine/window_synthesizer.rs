// ==========================================
// 设备异常检修排程引擎 - 窗口合成器
// ==========================================
// 职责: 按一组异常的所需工期生成合适类型与工期的新窗口
// 输入: 异常ID列表 + 行动计划 + 已有窗口（供落位策略参考）
// 输出: WindowSynthesis（窗口 + 所需工期 + 溢出工期）
// 红线: 不分配异常，不做持久化
// ==========================================

use crate::config::scheduler_params::SchedulerParams;
use crate::domain::action_plan::ActionPlanMap;
use crate::domain::maintenance_window::{MaintenanceWindow, CAPACITY_EPSILON};
use crate::engine::clock::{Clock, SystemClock};
use crate::engine::placement::{ImmediatePlacement, WindowPlacement};
use crate::engine::scoring::workload_days;
use crate::i18n::t_with_args;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 窗口合成结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSynthesis {
    pub window: MaintenanceWindow,
    /// 调用方应分配到新窗口的异常
    pub anomaly_ids: Vec<String>,
    /// 所需工期（天）
    pub required_days: f64,
    /// 超出大修工期上限的部分（天），未超出为 0
    pub overflow_days: f64,
}

impl WindowSynthesis {
    pub fn has_overflow(&self) -> bool {
        self.overflow_days > CAPACITY_EPSILON
    }
}

// ==========================================
// WindowSynthesizer - 窗口合成器
// ==========================================
pub struct WindowSynthesizer {
    params: SchedulerParams,
    clock: Arc<dyn Clock>,
    placement: Arc<dyn WindowPlacement>,
}

impl WindowSynthesizer {
    /// 默认参数、系统时钟、立即开始
    pub fn new() -> Self {
        Self::with_params(SchedulerParams::default())
    }

    pub fn with_params(params: SchedulerParams) -> Self {
        Self {
            params,
            clock: Arc::new(SystemClock),
            placement: Arc::new(ImmediatePlacement),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_placement(mut self, placement: Arc<dyn WindowPlacement>) -> Self {
        self.placement = placement;
        self
    }

    /// 所需工期 = Σ 各异常计划工期（无计划按默认工期），重复ID只计一次
    pub fn required_days(&self, anomaly_ids: &[String], plans: &ActionPlanMap) -> f64 {
        distinct_ids(anomaly_ids)
            .iter()
            .map(|id| workload_days(plans.get(id), self.params.default_processing_days))
            .sum()
    }

    /// 生成最优窗口
    ///
    /// 规则:
    /// 1) 选择能容纳所需工期的最小窗口类型
    /// 2) 工期 = 所需工期夹在该类型范围内
    /// 3) 超出大修上限时按上限建窗，溢出部分记入 overflow_days
    #[instrument(skip(self, anomaly_ids, plans, existing), fields(
        anomalies_count = anomaly_ids.len(),
        placement = self.placement.name()
    ))]
    pub fn create_optimal_window(
        &self,
        anomaly_ids: &[String],
        plans: &ActionPlanMap,
        existing: &[MaintenanceWindow],
    ) -> WindowSynthesis {
        let anomaly_ids = distinct_ids(anomaly_ids);
        let required_days = self.required_days(&anomaly_ids, plans);
        let window_type = self.params.window_type_for(required_days);
        let range = self.params.duration_range(window_type);
        let duration_days = range.clamp(required_days);
        let overflow_days = (required_days - range.max_days).max(0.0);

        if overflow_days > CAPACITY_EPSILON {
            warn!(
                required_days,
                capacity_days = duration_days,
                overflow_days,
                "所需工期超出大修窗口上限，已按上限建窗"
            );
        }

        let now = self.clock.now();
        let start_date = self.placement.start_date(now, existing);

        let count = anomaly_ids.len().to_string();
        let title = t_with_args(
            "window.auto_title",
            &[("type", window_type.to_db_str()), ("count", count.as_str())],
        );

        let mut window = MaintenanceWindow::planned(title, window_type, duration_days, start_date, true);
        window.created_at = now;
        window.updated_at = now;

        info!(
            window_id = %window.window_id,
            window_type = %window_type,
            duration_days,
            required_days,
            "已生成检修窗口"
        );

        WindowSynthesis {
            window,
            anomaly_ids,
            required_days,
            overflow_days,
        }
    }
}

/// 去重并保持首次出现顺序
fn distinct_ids(anomaly_ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    anomaly_ids
        .iter()
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

impl Default for WindowSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}
