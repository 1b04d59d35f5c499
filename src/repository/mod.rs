// ==========================================
// 设备异常检修排程引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供外部存储接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_plan_repo;
pub mod anomaly_repo;
pub mod error;
pub mod store;
pub mod window_repo;

// 重导出核心仓储
pub use action_plan_repo::ActionPlanRepository;
pub use anomaly_repo::AnomalyRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use store::{ActionPlanStore, AnomalyStore, MaintenanceWindowStore};
pub use window_repo::MaintenanceWindowRepository;
