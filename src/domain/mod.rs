// ==========================================
// 讲道排班系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务不变量
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod church;
pub mod error;
pub mod preacher;
pub mod schedule;
pub mod topic;
pub mod types;

// 重导出核心类型
pub use church::{Church, District, ServiceTimeTemplate, TemplateScope};
pub use error::DomainError;
pub use preacher::{Preacher, ScoreWeights, UnavailabilityPeriod};
pub use schedule::{Assignment, ScheduleDraft, SchedulePeriod};
pub use topic::{RecurrenceRule, Topic};
pub use types::{
    ApprovalStatus, AssignmentStatus, LiturgicalDay, PriorityTier, Role, RoleSet, ScheduleStatus,
};
