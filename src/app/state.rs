// ==========================================
// 讲道排班系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{PreacherApi, ScheduleApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::ScheduleRepositories;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "PREACHING_SCHEDULE_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源，所有仓储共用同一连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 排班API
    pub schedule_api: Arc<ScheduleApi<ConfigManager>>,

    /// 讲道人评分API
    pub preacher_api: Arc<PreacherApi<ConfigManager>>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 仓储集合
    pub repos: ScheduleRepositories,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并幂等建表
    /// 2. 初始化所有Repository
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("无法初始化数据库结构: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层与配置
        // ==========================================
        let repos = ScheduleRepositories::from_connection(conn.clone());
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化API层
        // ==========================================
        let schedule_api = Arc::new(ScheduleApi::new(repos.clone(), config_manager.clone()));
        let preacher_api = Arc::new(PreacherApi::new(
            repos.preacher_repo.clone(),
            repos.district_repo.clone(),
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化成功");

        Ok(Self {
            db_path,
            schedule_api,
            preacher_api,
            config_manager,
            repos,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 PREACHING_SCHEDULE_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./preaching_schedule.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("preaching-schedule");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("preaching_schedule.db");
        }
    }

    path.to_string_lossy().to_string()
}
