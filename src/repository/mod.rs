// ==========================================
// 讲道排班系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod church_repo;
pub mod error;
pub mod preacher_repo;
pub mod row_codec;
pub mod schedule_repo;
pub mod service_time_repo;
pub mod topic_repo;

// 重导出核心仓储
pub use church_repo::{ChurchRepository, DistrictRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use preacher_repo::{PreacherRepository, UnavailabilityRepository};
pub use schedule_repo::{AssignmentRepository, ScheduleRepository};
pub use service_time_repo::ServiceTimeRepository;
pub use topic_repo::TopicRepository;
