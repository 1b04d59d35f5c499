// ==========================================
// 设备异常检修排程引擎 - 领域类型定义
// ==========================================
// 统一词汇: 严重度等级只使用 low|normal|high|critical
// 存储格式: 小写 snake_case (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 严重度等级 (Criticality Level)
// ==========================================
// 由三项风险子评分求和判定:
// total >= 9 → Critical, >= 7 → High, >= 3 → Normal, 其余 → Low
// 顺序: Low < Normal < High < Critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalityLevel {
    Low,      // 低
    Normal,   // 一般
    High,     // 高
    Critical, // 危急
}

impl CriticalityLevel {
    /// 根据子评分总分判定等级
    ///
    /// # 边界
    /// - 9 → Critical
    /// - 7, 8 → High
    /// - 3..=6 → Normal
    /// - < 3 → Low
    pub fn from_total_score(total: i32) -> Self {
        if total >= 9 {
            CriticalityLevel::Critical
        } else if total >= 7 {
            CriticalityLevel::High
        } else if total >= 3 {
            CriticalityLevel::Normal
        } else {
            CriticalityLevel::Low
        }
    }

    /// 从字符串解析等级
    ///
    /// 历史数据中存在 `medium` 写法，统一归并为 Normal；
    /// 无法识别的值回落为 Low（权重最低）。
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "critical" => CriticalityLevel::Critical,
            "high" => CriticalityLevel::High,
            "normal" | "medium" => CriticalityLevel::Normal,
            _ => CriticalityLevel::Low,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            CriticalityLevel::Low => "low",
            CriticalityLevel::Normal => "normal",
            CriticalityLevel::High => "high",
            CriticalityLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for CriticalityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 异常状态 (Anomaly Status)
// ==========================================
// 状态推进由外部处置流程驱动，排程核心只读取
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyStatus {
    New,        // 新建
    InProgress, // 处置中
    Treated,    // 已处置（待检修）
    Closed,     // 已关闭
}

impl AnomalyStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "in_progress" => AnomalyStatus::InProgress,
            "treated" => AnomalyStatus::Treated,
            "closed" => AnomalyStatus::Closed,
            _ => AnomalyStatus::New,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AnomalyStatus::New => "new",
            AnomalyStatus::InProgress => "in_progress",
            AnomalyStatus::Treated => "treated",
            AnomalyStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for AnomalyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 检修窗口类型 (Window Type)
// ==========================================
// 每种类型隐含工期范围:
// force = 1~3 天, minor = 3~7 天, major = 14~42 天
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowType {
    Force, // 强迫停机
    Minor, // 小修
    Major, // 大修
}

impl WindowType {
    /// 从字符串解析窗口类型（无法识别时回落为 Minor）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "force" => WindowType::Force,
            "major" => WindowType::Major,
            _ => WindowType::Minor,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WindowType::Force => "force",
            WindowType::Minor => "minor",
            WindowType::Major => "major",
        }
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 检修窗口状态 (Window Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStatus {
    Planned,    // 已计划
    InProgress, // 执行中
    Completed,  // 已完成
    Cancelled,  // 已取消
}

impl WindowStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "in_progress" => WindowStatus::InProgress,
            "completed" => WindowStatus::Completed,
            "cancelled" => WindowStatus::Cancelled,
            _ => WindowStatus::Planned,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WindowStatus::Planned => "planned",
            WindowStatus::InProgress => "in_progress",
            WindowStatus::Completed => "completed",
            WindowStatus::Cancelled => "cancelled",
        }
    }

    /// 是否仍占用日历（已完成/已取消的窗口不再参与排程）
    pub fn is_active(&self) -> bool {
        matches!(self, WindowStatus::Planned | WindowStatus::InProgress)
    }
}

impl fmt::Display for WindowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 行动计划状态 (Action Plan Status)
// ==========================================
// draft → approved → in_progress → completed (外部驱动)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPlanStatus {
    Draft,
    Approved,
    InProgress,
    Completed,
}

impl ActionPlanStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "approved" => ActionPlanStatus::Approved,
            "in_progress" => ActionPlanStatus::InProgress,
            "completed" => ActionPlanStatus::Completed,
            _ => ActionPlanStatus::Draft,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ActionPlanStatus::Draft => "draft",
            ActionPlanStatus::Approved => "approved",
            ActionPlanStatus::InProgress => "in_progress",
            ActionPlanStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for ActionPlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
