// ==========================================
// 设备异常检修排程引擎 - 窗口利用率分析
// ==========================================
// 职责: 计算窗口的工作量、利用率、严重度均衡与综合评分
// 输入: 窗口 + 已分配异常 + 行动计划
// 输出: WindowAnalysis / SchedulingSummary
// ==========================================

use crate::config::scheduler_params::SchedulerParams;
use crate::domain::action_plan::ActionPlanMap;
use crate::domain::anomaly::Anomaly;
use crate::domain::maintenance_window::MaintenanceWindow;
use crate::domain::types::CriticalityLevel;
use crate::engine::scoring::workload_days;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

// ==========================================
// WindowAnalysis - 窗口分析结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowAnalysis {
    pub window_id: String,
    pub capacity_days: f64,  // 窗口工期
    pub total_workload: f64, // 已分配工作量（天）
    pub utilization: f64,    // 利用率（%），工期非正时为 0
    pub criticality_balance: BTreeMap<CriticalityLevel, usize>,
    pub balance_score: f64,
    pub efficiency_score: f64,
    pub overall_score: f64,
    pub anomaly_count: usize,
}

impl WindowAnalysis {
    /// 剩余容量（天），不小于 0
    pub fn remaining_capacity_days(&self) -> f64 {
        (self.capacity_days - self.total_workload).max(0.0)
    }
}

// ==========================================
// SchedulingSummary - 全部窗口汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchedulingSummary {
    pub window_count: usize,
    pub overloaded_count: usize,
    pub underutilized_count: usize,
    pub average_utilization: f64,
    pub total_overall_score: f64,
}

// ==========================================
// WindowUtilizationAnalyzer - 利用率分析器
// ==========================================
pub struct WindowUtilizationAnalyzer {
    params: SchedulerParams,
}

impl WindowUtilizationAnalyzer {
    pub fn new() -> Self {
        Self::with_params(SchedulerParams::default())
    }

    pub fn with_params(params: SchedulerParams) -> Self {
        Self { params }
    }

    /// 效率评分: 以目标利用率为峰值的三角评分，不小于 0
    pub fn efficiency_score(&self, utilization: f64) -> f64 {
        (100.0 - (self.params.target_utilization_pct - utilization).abs()).max(0.0)
    }

    /// 分析单个窗口
    ///
    /// `assigned` 由调用方按窗口分配关系筛选。
    pub fn analyze(
        &self,
        window: &MaintenanceWindow,
        assigned: &[&Anomaly],
        plans: &ActionPlanMap,
    ) -> WindowAnalysis {
        let members: Vec<(CriticalityLevel, f64)> = assigned
            .iter()
            .map(|a| {
                (
                    a.criticality_level,
                    workload_days(plans.get(&a.anomaly_id), self.params.default_processing_days),
                )
            })
            .collect();

        self.analyze_load(&window.window_id, window.duration_days, &members)
    }

    /// 按 (严重度, 工期) 列表分析窗口
    ///
    /// 优化器用它评估假设的移动方案。
    pub fn analyze_load(
        &self,
        window_id: &str,
        capacity_days: f64,
        members: &[(CriticalityLevel, f64)],
    ) -> WindowAnalysis {
        let total_workload: f64 = members.iter().map(|(_, days)| days).sum();

        let utilization = if capacity_days > 0.0 {
            total_workload / capacity_days * 100.0
        } else {
            0.0
        };

        let mut criticality_balance = BTreeMap::new();
        for (level, _) in members {
            *criticality_balance.entry(*level).or_insert(0) += 1;
        }

        let balance_score = criticality_balance.len() as f64 * self.params.balance_points_per_level;
        let efficiency_score = self.efficiency_score(utilization);

        WindowAnalysis {
            window_id: window_id.to_string(),
            capacity_days,
            total_workload,
            utilization,
            criticality_balance,
            balance_score,
            efficiency_score,
            overall_score: (balance_score + efficiency_score) / 2.0,
            anomaly_count: members.len(),
        }
    }

    /// 分析全部窗口（输出顺序与窗口输入顺序一致）
    #[instrument(skip_all, fields(windows_count = windows.len(), anomalies_count = anomalies.len()))]
    pub fn analyze_all(
        &self,
        windows: &[MaintenanceWindow],
        anomalies: &[Anomaly],
        plans: &ActionPlanMap,
    ) -> Vec<WindowAnalysis> {
        windows
            .iter()
            .map(|w| {
                let assigned: Vec<&Anomaly> = anomalies
                    .iter()
                    .filter(|a| a.is_assigned_to(&w.window_id))
                    .collect();
                self.analyze(w, &assigned, plans)
            })
            .collect()
    }

    /// 利用率严格大于超载阈值
    pub fn is_overloaded(&self, analysis: &WindowAnalysis) -> bool {
        analysis.utilization > self.params.overload_threshold_pct
    }

    /// 利用率在 (0, 低利用阈值) 区间（空窗口不计入）
    pub fn is_underutilized(&self, analysis: &WindowAnalysis) -> bool {
        analysis.utilization > 0.0 && analysis.utilization < self.params.underutilized_threshold_pct
    }

    /// 可作为迁入目标: 利用率低于低利用阈值（含空窗口）
    pub fn is_relocation_target(&self, analysis: &WindowAnalysis) -> bool {
        analysis.utilization < self.params.underutilized_threshold_pct
    }

    /// 汇总
    pub fn summarize(&self, analyses: &[WindowAnalysis]) -> SchedulingSummary {
        if analyses.is_empty() {
            return SchedulingSummary::default();
        }

        let total_utilization: f64 = analyses.iter().map(|a| a.utilization).sum();

        SchedulingSummary {
            window_count: analyses.len(),
            overloaded_count: analyses.iter().filter(|a| self.is_overloaded(a)).count(),
            underutilized_count: analyses.iter().filter(|a| self.is_underutilized(a)).count(),
            average_utilization: total_utilization / analyses.len() as f64,
            total_overall_score: analyses.iter().map(|a| a.overall_score).sum(),
        }
    }
}

impl Default for WindowUtilizationAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
