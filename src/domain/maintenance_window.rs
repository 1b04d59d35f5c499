// ==========================================
// 设备异常检修排程引擎 - 检修窗口领域模型
// ==========================================
// 红线: 窗口工作量超出工期属于可报告状态，不是硬约束
// 约束: 删除窗口前必须先解除全部异常分配
// ==========================================

use crate::domain::types::{WindowStatus, WindowType};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==========================================
// MaintenanceWindow - 检修窗口
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceWindow {
    // ===== 主键 =====
    pub window_id: String,

    // ===== 基本信息 =====
    pub title: String,
    pub window_type: WindowType,
    pub duration_days: f64, // 工期容量（天）
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: WindowStatus,
    pub auto_created: bool, // 是否由窗口合成器自动生成

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaintenanceWindow {
    /// 创建已计划状态的窗口，结束时间 = 开始时间 + 工期
    pub fn planned(
        title: impl Into<String>,
        window_type: WindowType,
        duration_days: f64,
        start_date: DateTime<Utc>,
        auto_created: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            window_id: Uuid::new_v4().to_string(),
            title: title.into(),
            window_type,
            duration_days,
            start_date,
            end_date: start_date + days_to_duration(duration_days),
            status: WindowStatus::Planned,
            auto_created,
            created_at: now,
            updated_at: now,
        }
    }

    /// 是否可参与自动排程（已计划 + 开始时间在未来）
    pub fn is_schedulable(&self, now: DateTime<Utc>) -> bool {
        self.status == WindowStatus::Planned && self.start_date > now
    }
}

/// 天数转换为时长（按分钟取整，支持小数天）
pub fn days_to_duration(days: f64) -> Duration {
    if !days.is_finite() || days <= 0.0 {
        return Duration::zero();
    }
    Duration::minutes((days * 24.0 * 60.0).round() as i64)
}

// ==========================================
// WindowLoad - 窗口负荷快照
// ==========================================
// 用途: 排程/优化过程中在内存中跟踪窗口剩余容量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowLoad {
    pub window_id: String,
    pub capacity_days: f64,      // 窗口工期
    pub assigned_workload: f64,  // 已分配工作量（天）
}

// ==========================================
// Trait: CapacityConstraint
// ==========================================
// 用途: Auto-Scheduler 容量检查接口
pub trait CapacityConstraint {
    /// 检查是否可容纳指定工作量
    fn can_accept(&self, workload_days: f64) -> bool;

    /// 计算剩余容量
    fn remaining_capacity_days(&self) -> f64;
}

/// 浮点比较容差（工期允许小数天）
pub const CAPACITY_EPSILON: f64 = 1e-9;

impl CapacityConstraint for WindowLoad {
    /// 剩余容量 >= 工作量 即可放入（恰好填满也允许）
    fn can_accept(&self, workload_days: f64) -> bool {
        self.capacity_days - self.assigned_workload + CAPACITY_EPSILON >= workload_days
    }

    /// 剩余容量（天），不小于 0
    fn remaining_capacity_days(&self) -> f64 {
        (self.capacity_days - self.assigned_workload).max(0.0)
    }
}
