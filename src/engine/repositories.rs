// ==========================================
// 讲道排班系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合排班生成所需的所有 Repository
// 目标: 减少 ScheduleGenerator 的构造函数参数数量
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    AssignmentRepository, ChurchRepository, DistrictRepository, PreacherRepository,
    ScheduleRepository, ServiceTimeRepository, TopicRepository, UnavailabilityRepository,
};

/// 排班生成仓储集合
///
/// # 包含的仓储
/// - `district_repo` / `church_repo` / `service_time_repo`: 目录数据
/// - `preacher_repo` / `unavailability_repo`: 讲道人与不可用时段
/// - `schedule_repo` / `assignment_repo`: 排班落库
/// - `topic_repo`: 讲道主题
#[derive(Clone)]
pub struct ScheduleRepositories {
    pub district_repo: Arc<DistrictRepository>,
    pub church_repo: Arc<ChurchRepository>,
    pub service_time_repo: Arc<ServiceTimeRepository>,
    pub preacher_repo: Arc<PreacherRepository>,
    pub unavailability_repo: Arc<UnavailabilityRepository>,
    pub schedule_repo: Arc<ScheduleRepository>,
    pub assignment_repo: Arc<AssignmentRepository>,
    pub topic_repo: Arc<TopicRepository>,
}

impl ScheduleRepositories {
    /// 基于同一连接创建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            district_repo: Arc::new(DistrictRepository::from_connection(conn.clone())),
            church_repo: Arc::new(ChurchRepository::from_connection(conn.clone())),
            service_time_repo: Arc::new(ServiceTimeRepository::from_connection(conn.clone())),
            preacher_repo: Arc::new(PreacherRepository::from_connection(conn.clone())),
            unavailability_repo: Arc::new(UnavailabilityRepository::from_connection(conn.clone())),
            schedule_repo: Arc::new(ScheduleRepository::from_connection(conn.clone())),
            assignment_repo: Arc::new(AssignmentRepository::from_connection(conn.clone())),
            topic_repo: Arc::new(TopicRepository::from_connection(conn)),
        }
    }
}
