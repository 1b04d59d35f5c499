// ==========================================
// 设备异常检修排程引擎 - 排程建议生成
// ==========================================
// 职责: 根据窗口分析与异常排程状态生成建议（仅提示，不改变分配）
// 输出顺序: overloaded → underutilized → unscheduled-critical
// ==========================================

use crate::config::scheduler_params::SchedulerParams;
use crate::domain::anomaly::Anomaly;
use crate::domain::types::CriticalityLevel;
use crate::engine::utilization::{WindowAnalysis, WindowUtilizationAnalyzer};
use crate::i18n::{t, t_with_args};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 建议类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecommendationKind {
    Overloaded,
    Underutilized,
    UnscheduledCritical,
}

impl RecommendationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationKind::Overloaded => "overloaded",
            RecommendationKind::Underutilized => "underutilized",
            RecommendationKind::UnscheduledCritical => "unscheduled-critical",
        }
    }
}

impl fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 建议级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSeverity {
    Info,
    Warning,
    Error,
}

/// 排程建议
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub severity: RecommendationSeverity,
    pub title: String,
    pub message: String,
    pub count: usize,
    pub window_ids: Vec<String>,
    pub anomaly_ids: Vec<String>,
}

// ==========================================
// RecommendationGenerator - 建议生成器
// ==========================================
pub struct RecommendationGenerator {
    analyzer: WindowUtilizationAnalyzer,
}

impl RecommendationGenerator {
    pub fn new() -> Self {
        Self::with_params(SchedulerParams::default())
    }

    pub fn with_params(params: SchedulerParams) -> Self {
        Self {
            analyzer: WindowUtilizationAnalyzer::with_params(params),
        }
    }

    /// 生成建议
    ///
    /// # 参数
    /// - `analyses`: 各窗口分析结果
    /// - `anomalies`: 参与检查的异常（通常为全部已处置异常）
    pub fn generate(&self, analyses: &[WindowAnalysis], anomalies: &[Anomaly]) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        let overloaded: Vec<String> = analyses
            .iter()
            .filter(|a| self.analyzer.is_overloaded(a))
            .map(|a| a.window_id.clone())
            .collect();
        if !overloaded.is_empty() {
            recommendations.push(self.build(
                RecommendationKind::Overloaded,
                RecommendationSeverity::Warning,
                overloaded,
                Vec::new(),
            ));
        }

        let underutilized: Vec<String> = analyses
            .iter()
            .filter(|a| self.analyzer.is_underutilized(a))
            .map(|a| a.window_id.clone())
            .collect();
        if !underutilized.is_empty() {
            recommendations.push(self.build(
                RecommendationKind::Underutilized,
                RecommendationSeverity::Info,
                underutilized,
                Vec::new(),
            ));
        }

        let unscheduled_critical: Vec<String> = anomalies
            .iter()
            .filter(|a| a.criticality_level == CriticalityLevel::Critical && !a.is_assigned())
            .map(|a| a.anomaly_id.clone())
            .collect();
        if !unscheduled_critical.is_empty() {
            recommendations.push(self.build(
                RecommendationKind::UnscheduledCritical,
                RecommendationSeverity::Error,
                Vec::new(),
                unscheduled_critical,
            ));
        }

        recommendations
    }

    fn build(
        &self,
        kind: RecommendationKind,
        severity: RecommendationSeverity,
        window_ids: Vec<String>,
        anomaly_ids: Vec<String>,
    ) -> Recommendation {
        let count = window_ids.len() + anomaly_ids.len();
        let count_str = count.to_string();

        Recommendation {
            kind,
            severity,
            title: t(&format!("recommendation.{}.title", kind.as_str())),
            message: t_with_args(
                &format!("recommendation.{}.message", kind.as_str()),
                &[("count", count_str.as_str())],
            ),
            count,
            window_ids,
            anomaly_ids,
        }
    }
}

impl Default for RecommendationGenerator {
    fn default() -> Self {
        Self::new()
    }
}
