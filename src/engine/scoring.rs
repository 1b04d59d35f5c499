// ==========================================
// 设备异常检修排程引擎 - 评分模型
// ==========================================
// 职责: 计算异常的紧迫度、处理工期与效率比
// 输入: 异常 + 行动计划（可缺失）
// 输出: AnomalyScore
// 红线: 纯函数，无副作用，所有缺失数据均有默认值
// ==========================================

use crate::config::scheduler_params::SchedulerParams;
use crate::domain::action_plan::{ActionPlan, ActionPlanMap};
use crate::domain::anomaly::Anomaly;
use crate::domain::types::CriticalityLevel;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// 处理工期下限（天），保证效率计算不会除零
pub const MIN_PROCESSING_DAYS: f64 = 1.0;

/// 处理工期（天）
///
/// 有行动计划时取计划总工期，否则取默认工期；结果不小于 1 天。
/// 用于效率计算与自动排程的容量判断。
pub fn processing_days(plan: Option<&ActionPlan>, default_days: f64) -> f64 {
    let days = plan.map(|p| p.total_duration_days).unwrap_or(default_days);
    if days.is_finite() {
        days.max(MIN_PROCESSING_DAYS)
    } else {
        MIN_PROCESSING_DAYS
    }
}

/// 工作量（天）
///
/// 有行动计划时取计划总工期（允许小于 1 天），仅在缺少计划时取默认工期。
/// 用于窗口利用率、优化器迁移与合成窗口的所需工期。
pub fn workload_days(plan: Option<&ActionPlan>, default_days: f64) -> f64 {
    match plan {
        Some(p) if p.total_duration_days.is_finite() => p.total_duration_days.max(0.0),
        Some(_) => 0.0,
        None => default_days,
    }
}

// ==========================================
// AnomalyScore - 异常评分结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyScore {
    pub anomaly_id: String,
    pub criticality_level: CriticalityLevel,
    pub urgency_score: f64,   // 严重度权重 × 设备系数
    pub processing_time: f64, // 处理工期（天）
    pub efficiency: f64,      // 紧迫度 / 工期，排程优先级唯一排序键
}

// ==========================================
// ScoringModel - 评分模型
// ==========================================
pub struct ScoringModel {
    params: SchedulerParams,
}

impl ScoringModel {
    /// 使用默认参数构造
    pub fn new() -> Self {
        Self::with_params(SchedulerParams::default())
    }

    /// 使用指定参数构造
    pub fn with_params(params: SchedulerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SchedulerParams {
        &self.params
    }

    /// 紧迫度 = 严重度权重 × 设备系数（关联设备时为 equipment_factor，否则为 1）
    pub fn urgency_score(&self, anomaly: &Anomaly) -> f64 {
        let weight = self.params.criticality_weight(anomaly.criticality_level);
        let factor = if anomaly.has_equipment() {
            self.params.equipment_factor
        } else {
            1.0
        };
        weight * factor
    }

    /// 处理工期（天）
    pub fn processing_time(&self, plan: Option<&ActionPlan>) -> f64 {
        processing_days(plan, self.params.default_processing_days)
    }

    /// 对单个异常评分
    pub fn score(&self, anomaly: &Anomaly, plan: Option<&ActionPlan>) -> AnomalyScore {
        let urgency_score = self.urgency_score(anomaly);
        let processing_time = self.processing_time(plan);

        AnomalyScore {
            anomaly_id: anomaly.anomaly_id.clone(),
            criticality_level: anomaly.criticality_level,
            urgency_score,
            processing_time,
            efficiency: urgency_score / processing_time,
        }
    }

    /// 批量评分（保持输入顺序）
    pub fn score_all(&self, anomalies: &[Anomaly], plans: &ActionPlanMap) -> Vec<AnomalyScore> {
        anomalies
            .iter()
            .map(|a| self.score(a, plans.get(&a.anomaly_id)))
            .collect()
    }

    /// 按效率降序排列
    ///
    /// 使用稳定排序：效率相同的异常保持输入顺序。
    #[instrument(skip(self, anomalies, plans), fields(candidates_count = anomalies.len()))]
    pub fn rank(&self, anomalies: &[Anomaly], plans: &ActionPlanMap) -> Vec<AnomalyScore> {
        let mut scores = self.score_all(anomalies, plans);
        scores.sort_by(|a, b| b.efficiency.total_cmp(&a.efficiency));
        scores
    }
}

impl Default for ScoringModel {
    fn default() -> Self {
        Self::new()
    }
}
