// ==========================================
// 设备异常检修排程引擎 - API层错误类型
// ==========================================
// 职责: 区分调用错误与基础设施错误
// 红线: 存储故障必须走 Infrastructure 通道，不得折叠为"无可用窗口"等排程结果
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 调用错误 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("前置条件不满足: {0}")]
    PreconditionFailed(String),

    // ===== 基础设施错误 =====
    #[error("存储访问失败: {0}")]
    Infrastructure(#[source] RepositoryError),
}

impl ApiError {
    /// 是否为外部存储故障
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, ApiError::Infrastructure(_))
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            other => ApiError::Infrastructure(other),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
