// ==========================================
// 设备异常检修排程引擎 - API 层
// ==========================================
// 职责: 存储与引擎之间的薄适配层
// ==========================================

pub mod error;
pub mod scheduling_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use scheduling_api::{SchedulingApi, SynthesisScheduleReport};
