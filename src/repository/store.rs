// ==========================================
// 设备异常检修排程引擎 - 外部存储 Trait
// ==========================================
// 职责: 定义排程核心消费的三个外部存储接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::action_plan::ActionPlan;
use crate::domain::anomaly::Anomaly;
use crate::domain::maintenance_window::MaintenanceWindow;
use crate::domain::types::{AnomalyStatus, WindowStatus};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// AnomalyStore Trait
// ==========================================
// 实现者: AnomalyRepository（使用 rusqlite）
#[async_trait]
pub trait AnomalyStore: Send + Sync {
    /// 按ID查询异常
    async fn find_by_id(&self, anomaly_id: &str) -> RepositoryResult<Option<Anomaly>>;

    /// 按状态查询异常（按创建时间、ID 升序，保证排程输入顺序稳定）
    async fn list_by_status(&self, status: AnomalyStatus) -> RepositoryResult<Vec<Anomaly>>;

    /// 查询分配在指定窗口的异常
    async fn list_by_window(&self, window_id: &str) -> RepositoryResult<Vec<Anomaly>>;

    /// 插入或更新异常
    async fn upsert(&self, anomaly: &Anomaly) -> RepositoryResult<()>;

    /// 更新窗口分配（None 表示解除分配）
    ///
    /// # 返回
    /// - Err(NotFound): 异常不存在
    async fn update_window_assignment(
        &self,
        anomaly_id: &str,
        window_id: Option<&str>,
    ) -> RepositoryResult<()>;
}

// ==========================================
// MaintenanceWindowStore Trait
// ==========================================
// 实现者: MaintenanceWindowRepository（使用 rusqlite）
#[async_trait]
pub trait MaintenanceWindowStore: Send + Sync {
    /// 按ID查询窗口
    async fn find_by_id(&self, window_id: &str) -> RepositoryResult<Option<MaintenanceWindow>>;

    /// 查询全部窗口（按开始时间、ID 升序）
    async fn list_all(&self) -> RepositoryResult<Vec<MaintenanceWindow>>;

    /// 按状态查询窗口（按开始时间、ID 升序）
    async fn list_by_status(&self, status: WindowStatus) -> RepositoryResult<Vec<MaintenanceWindow>>;

    /// 新建窗口
    async fn insert(&self, window: &MaintenanceWindow) -> RepositoryResult<()>;

    /// 更新窗口
    async fn update(&self, window: &MaintenanceWindow) -> RepositoryResult<()>;

    /// 删除窗口
    ///
    /// 前置条件: 调用方已解除该窗口的全部异常分配
    async fn delete(&self, window_id: &str) -> RepositoryResult<()>;
}

// ==========================================
// ActionPlanStore Trait
// ==========================================
// 实现者: ActionPlanRepository（使用 rusqlite）
#[async_trait]
pub trait ActionPlanStore: Send + Sync {
    /// 查询异常的行动计划（含行动项）
    async fn find_by_anomaly(&self, anomaly_id: &str) -> RepositoryResult<Option<ActionPlan>>;

    /// 批量查询行动计划（不存在计划的异常不返回）
    async fn list_by_anomaly_ids(&self, anomaly_ids: &[String]) -> RepositoryResult<Vec<ActionPlan>>;

    /// 插入或替换行动计划（行动项整体替换）
    async fn upsert(&self, plan: &ActionPlan) -> RepositoryResult<()>;
}
