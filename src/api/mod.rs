// ==========================================
// 讲道排班系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行入口调用
// ==========================================

pub mod error;
pub mod preacher_api;
pub mod schedule_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use preacher_api::PreacherApi;
pub use schedule_api::ScheduleApi;
