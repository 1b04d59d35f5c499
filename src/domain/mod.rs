// ==========================================
// 设备异常检修排程引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_plan;
pub mod anomaly;
pub mod maintenance_window;
pub mod types;

// 重导出核心类型
pub use action_plan::{index_by_anomaly, ActionItem, ActionPlan, ActionPlanMap};
pub use anomaly::{calculate_criticality_level, Anomaly, CriticalityScores};
pub use maintenance_window::{CapacityConstraint, MaintenanceWindow, WindowLoad};
pub use types::{ActionPlanStatus, AnomalyStatus, CriticalityLevel, WindowStatus, WindowType};
