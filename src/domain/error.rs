// ==========================================
// 讲道排班系统 - 领域层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use chrono::NaiveDate;
use thiserror::Error;

/// 领域不变量违反
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("不可用时段无效: end={end} 早于 start={start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("时段模板作用域无效: {0}")]
    InvalidTemplateScope(String),

    #[error("无效的月份: {month}/{year}")]
    InvalidPeriod { month: u32, year: i32 },

    #[error("主题循环规则无效: {0}")]
    InvalidRecurrence(String),
}
