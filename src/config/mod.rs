// ==========================================
// 讲道排班系统 - 配置层
// ==========================================
// 职责: 系统配置管理,支持教会/区会/联合会/全局多级覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod schedule_config_trait;

// 重导出核心配置管理器
pub use config_manager::{
    config_keys, ConfigManager, ConfigScope, DEFAULT_FORCED_FILL_MAX_EXTRA, DEFAULT_MONTHLY_CAP,
};
pub use schedule_config_trait::{ConfigContext, ConfigResult, ScheduleConfigReader};
