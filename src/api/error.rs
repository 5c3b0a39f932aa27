// ==========================================
// 讲道排班系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository/Engine错误为用户可理解的错误消息
// 分类: 前置条件错误 (直接返回) / 意外错误 (已回滚，不透出细节)
// ==========================================

use crate::engine::{EngineError, PreconditionError};
use crate::repository::error::RepositoryError;
use thiserror::Error;
use tracing::error;

const DATABASE_FAILURE: &str = "数据库操作失败";

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("前置条件不满足: {0}")]
    Precondition(PreconditionError),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("意外错误: {0}")]
    Unexpected(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 是否为前置条件错误
    pub fn is_precondition(&self) -> bool {
        matches!(self, ApiError::Precondition(_))
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
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            // 原始数据库消息只写日志，不透出
            e @ (RepositoryError::DatabaseQueryError(_)
            | RepositoryError::UniqueConstraintViolation(_)
            | RepositoryError::ForeignKeyViolation(_)) => {
                error!(error = %e, "数据库操作失败");
                ApiError::Unexpected(DATABASE_FAILURE.to_string())
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::Unexpected(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::Domain(e) => ApiError::InvalidInput(e.to_string()),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Precondition(p) => ApiError::Precondition(p),
            EngineError::Repository(e) => ApiError::from(e),
            EngineError::Domain(e) => ApiError::InvalidInput(e.to_string()),
            EngineError::Config(msg) => ApiError::Unexpected(format!("配置读取失败: {}", msg)),
        }
    }
}

impl From<PreconditionError> for ApiError {
    fn from(err: PreconditionError) -> Self {
        ApiError::Precondition(err)
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
