// ==========================================
// 讲道排班系统 - 核心库
// ==========================================
// 职责: 区会月度讲道排班自动生成
// 技术栈: Rust + SQLite
// 系统定位: 生成草稿，人工审批与定稿
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 排班规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ApprovalStatus, AssignmentStatus, LiturgicalDay, PriorityTier, Role, RoleSet, ScheduleStatus,
};

// 领域实体
pub use domain::{
    Assignment, Church, District, Preacher, ScheduleDraft, SchedulePeriod, ServiceTimeTemplate,
    Topic, UnavailabilityPeriod,
};

// 引擎
pub use engine::{
    GenerationReport, GenerationResult, ScheduleGenerator, ScoreEngine, SlotEnumerator,
    TopicSuggester,
};

// API
pub use api::{ApiError, PreacherApi, ScheduleApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "讲道排班系统";
