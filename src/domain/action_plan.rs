// ==========================================
// 设备异常检修排程引擎 - 行动计划领域模型
// ==========================================
// 职责: 行动计划与行动项
// 约束: total_duration_days = Σ 行动项工期
// ==========================================

use crate::domain::types::ActionPlanStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// 行动项（有序）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub item_id: String,
    pub seq_no: i32,
    pub description: String,
    pub duration_days: f64,
}

impl ActionItem {
    pub fn new(seq_no: i32, description: impl Into<String>, duration_days: f64) -> Self {
        Self {
            item_id: Uuid::new_v4().to_string(),
            seq_no,
            description: description.into(),
            duration_days,
        }
    }
}

// ==========================================
// ActionPlan - 行动计划（每个异常至多一个）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub plan_id: String,
    pub anomaly_id: String,
    pub status: ActionPlanStatus,
    pub items: Vec<ActionItem>,
    pub total_duration_days: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ActionPlan {
    /// 创建行动计划（草稿状态，自动汇总工期）
    pub fn new(anomaly_id: impl Into<String>, items: Vec<ActionItem>) -> Self {
        let now = Utc::now();
        let mut plan = Self {
            plan_id: Uuid::new_v4().to_string(),
            anomaly_id: anomaly_id.into(),
            status: ActionPlanStatus::Draft,
            items,
            total_duration_days: 0.0,
            created_at: now,
            updated_at: now,
        };
        plan.recalculate_total();
        plan
    }

    /// 按行动项重算总工期，并按 seq_no 排序
    pub fn recalculate_total(&mut self) {
        self.items.sort_by_key(|item| item.seq_no);
        self.total_duration_days = self
            .items
            .iter()
            .map(|item| item.duration_days)
            .filter(|d| d.is_finite() && *d > 0.0)
            .sum();
    }
}

/// 按异常ID索引的行动计划
pub type ActionPlanMap = HashMap<String, ActionPlan>;

/// 构建按异常ID索引的行动计划表
///
/// 同一异常出现多个计划时，以最后一个为准
pub fn index_by_anomaly(plans: impl IntoIterator<Item = ActionPlan>) -> ActionPlanMap {
    plans
        .into_iter()
        .map(|plan| (plan.anomaly_id.clone(), plan))
        .collect()
}
