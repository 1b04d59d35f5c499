// ==========================================
// 设备异常检修排程引擎 - 异常领域模型
// ==========================================
// 职责: 异常实体、风险子评分、严重度判定
// 红线: 排程核心只修改 maintenance_window_id 字段
// ==========================================

use crate::domain::types::{AnomalyStatus, CriticalityLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// CriticalityScores - 风险子评分
// ==========================================
// 缺失的子评分按 0 计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalityScores {
    pub reliability_integrity: Option<i32>, // 可靠性/完整性
    pub availability: Option<i32>,          // 可用性
    pub process_safety: Option<i32>,        // 工艺安全
}

impl CriticalityScores {
    pub fn new(reliability_integrity: i32, availability: i32, process_safety: i32) -> Self {
        Self {
            reliability_integrity: Some(reliability_integrity),
            availability: Some(availability),
            process_safety: Some(process_safety),
        }
    }

    /// 子评分总和
    pub fn total(&self) -> i32 {
        self.reliability_integrity.unwrap_or(0)
            + self.availability.unwrap_or(0)
            + self.process_safety.unwrap_or(0)
    }
}

/// 根据子评分总分计算严重度等级
pub fn calculate_criticality_level(scores: &CriticalityScores) -> CriticalityLevel {
    CriticalityLevel::from_total_score(scores.total())
}

// ==========================================
// Anomaly - 设备异常
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    // ===== 主键 =====
    pub anomaly_id: String,

    // ===== 基本信息 =====
    pub title: String,
    pub equipment_id: Option<String>, // 关联设备编号
    pub status: AnomalyStatus,

    // ===== 严重度 =====
    pub scores: CriticalityScores,
    pub criticality_level: CriticalityLevel,

    // ===== 排程结果 =====
    pub maintenance_window_id: Option<String>,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Anomaly {
    /// 创建新异常（状态为 new，严重度由子评分计算）
    pub fn new(
        anomaly_id: impl Into<String>,
        title: impl Into<String>,
        equipment_id: Option<String>,
        scores: CriticalityScores,
    ) -> Self {
        let now = Utc::now();
        Self {
            anomaly_id: anomaly_id.into(),
            title: title.into(),
            equipment_id,
            status: AnomalyStatus::New,
            criticality_level: calculate_criticality_level(&scores),
            scores,
            maintenance_window_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 更新子评分并同步重算严重度
    pub fn set_scores(&mut self, scores: CriticalityScores) {
        self.scores = scores;
        self.criticality_level = calculate_criticality_level(&scores);
        self.updated_at = Utc::now();
    }

    /// 是否关联了有效的设备编号
    pub fn has_equipment(&self) -> bool {
        self.equipment_id
            .as_deref()
            .map(|id| !id.trim().is_empty())
            .unwrap_or(false)
    }

    /// 是否已分配检修窗口
    pub fn is_assigned(&self) -> bool {
        self.maintenance_window_id.is_some()
    }

    /// 是否属于"已处置且未排程"（自动排程的候选集）
    pub fn is_unscheduled_treated(&self) -> bool {
        self.status == AnomalyStatus::Treated && !self.is_assigned()
    }

    /// 是否分配在指定窗口
    pub fn is_assigned_to(&self, window_id: &str) -> bool {
        self.maintenance_window_id.as_deref() == Some(window_id)
    }
}
