// ==========================================
// 讲道排班系统 - 引擎层错误类型
// ==========================================
// 前置条件错误: 直接返回调用方，不重试，不创建排班
// 其他错误: 视为意外错误，事务整体回滚
// ==========================================

use crate::domain::DomainError;
use crate::repository::RepositoryError;
use thiserror::Error;

/// 排班生成前置条件不满足
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PreconditionError {
    #[error("该月份已存在排班: district={district_id}, {month}/{year}")]
    ScheduleAlreadyExists {
        district_id: String,
        month: u32,
        year: i32,
    },

    #[error("区会不存在: {district_id}")]
    DistrictNotFound { district_id: String },

    #[error("区会下没有启用的教会: {district_id}")]
    NoActiveChurches { district_id: String },

    #[error("区会下没有可排班的讲道人: {district_id}")]
    NoEligiblePreachers { district_id: String },

    #[error("无效的月份: {month}/{year}")]
    InvalidPeriod { month: u32, year: i32 },
}

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("前置条件不满足: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("配置读取失败: {0}")]
    Config(String),

    #[error("领域不变量违反: {0}")]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for EngineError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        EngineError::Config(err.to_string())
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
