// ==========================================
// 设备异常检修排程引擎 - 排程配置读取 Trait
// ==========================================
// 职责: 定义排程引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::scheduler_params::SchedulerParams;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// SchedulerConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait SchedulerConfigReader: Send + Sync {
    /// 读取完整排程参数
    ///
    /// # 返回
    /// - 未配置的字段使用 `SchedulerParams::default()` 中的值
    async fn load_scheduler_params(&self) -> RepositoryResult<SchedulerParams>;

    /// 获取目标利用率（%）
    ///
    /// # 默认值
    /// - 85
    async fn get_target_utilization_pct(&self) -> RepositoryResult<f64> {
        Ok(self.load_scheduler_params().await?.target_utilization_pct)
    }

    /// 获取超载阈值（%）
    ///
    /// # 默认值
    /// - 100
    async fn get_overload_threshold_pct(&self) -> RepositoryResult<f64> {
        Ok(self.load_scheduler_params().await?.overload_threshold_pct)
    }

    /// 获取低利用阈值（%）
    ///
    /// # 默认值
    /// - 50
    async fn get_underutilized_threshold_pct(&self) -> RepositoryResult<f64> {
        Ok(self.load_scheduler_params().await?.underutilized_threshold_pct)
    }
}
