// ==========================================
// 设备异常检修排程引擎 - 配置层
// ==========================================
// 职责: 排程参数管理,支持 config_kv 覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod scheduler_config_trait;
pub mod scheduler_params;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use scheduler_config_trait::SchedulerConfigReader;
pub use scheduler_params::{DurationRange, SchedulerParams};
