// ==========================================
// 讲道排班系统 - 配置管理器
// ==========================================
// 职责: 配置加载、按作用域查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 作用域优先级: church > district > organization > global > 内置默认值
// ==========================================

use crate::config::schedule_config_trait::{ConfigContext, ConfigResult, ScheduleConfigReader};
use crate::db::open_sqlite_connection;
use crate::domain::ScoreWeights;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::fmt;
use std::sync::{Arc, Mutex};

/// 默认月讲道上限
pub const DEFAULT_MONTHLY_CAP: u32 = 4;

/// 默认强制填充最大增量
pub const DEFAULT_FORCED_FILL_MAX_EXTRA: u32 = 5;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 读取单个作用域下的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, scope: &ConfigScope, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![scope.scope_id(), key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入（覆盖）配置值
    pub fn set_config_value(&self, scope: &ConfigScope, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
            ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value
            "#,
            params![scope.scope_id(), key, value],
        )?;
        Ok(())
    }

    /// 删除某作用域下的覆写
    pub fn remove_config_value(&self, scope: &ConfigScope, key: &str) -> ConfigResult<bool> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![scope.scope_id(), key],
        )?;
        Ok(affected > 0)
    }

    /// 按优先级逐级查找配置值
    ///
    /// # 返回
    /// - Some((scope, value)): 命中的作用域与原始值
    /// - None: 所有作用域均未配置
    pub fn resolve_config_value(
        &self,
        ctx: &ConfigContext,
        key: &str,
    ) -> ConfigResult<Option<(ConfigScope, String)>> {
        for scope in ConfigScope::chain(ctx) {
            if let Some(value) = self.get_config_value(&scope, key)? {
                return Ok(Some((scope, value)));
            }
        }
        Ok(None)
    }

    /// 读取非负整数配置，格式错误时返回 None 并告警
    fn resolve_i64(&self, ctx: &ConfigContext, key: &str) -> ConfigResult<Option<i64>> {
        let Some((scope, raw)) = self.resolve_config_value(ctx, key)? else {
            return Ok(None);
        };
        match raw.trim().parse::<i64>() {
            Ok(v) => Ok(Some(v)),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    scope = %scope,
                    raw_value = %raw,
                    "整数配置格式错误，使用默认值"
                );
                Ok(None)
            }
        }
    }
}

// ==========================================
// ScheduleConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ScheduleConfigReader for ConfigManager {
    async fn get_score_weights(&self, ctx: &ConfigContext) -> ConfigResult<ScoreWeights> {
        let Some((scope, raw)) = self.resolve_config_value(ctx, config_keys::SCORE_WEIGHTS)? else {
            return Ok(ScoreWeights::default().normalized());
        };

        let weights = match serde_json::from_str::<ScoreWeights>(&raw) {
            Ok(w) if w.is_valid() => w,
            Ok(_) | Err(_) => {
                tracing::warn!(
                    config_key = config_keys::SCORE_WEIGHTS,
                    scope = %scope,
                    raw_value = %raw,
                    "评分权重配置无效，使用默认权重"
                );
                ScoreWeights::default()
            }
        };
        Ok(weights.normalized())
    }

    async fn get_default_monthly_cap(&self, ctx: &ConfigContext) -> ConfigResult<u32> {
        let cap = match self.resolve_i64(ctx, config_keys::DEFAULT_MONTHLY_CAP)? {
            Some(v) if v >= 0 => u32::try_from(v).unwrap_or(u32::MAX),
            Some(v) => {
                tracing::warn!(
                    config_key = config_keys::DEFAULT_MONTHLY_CAP,
                    value = v,
                    "月上限配置为负数，使用默认值"
                );
                DEFAULT_MONTHLY_CAP
            }
            None => DEFAULT_MONTHLY_CAP,
        };
        Ok(cap)
    }

    async fn get_forced_fill_max_extra(&self, ctx: &ConfigContext) -> ConfigResult<u32> {
        let extra = match self.resolve_i64(ctx, config_keys::FORCED_FILL_MAX_EXTRA)? {
            // 负数视为关闭强制填充
            Some(v) => u32::try_from(v.max(0)).unwrap_or(u32::MAX),
            None => DEFAULT_FORCED_FILL_MAX_EXTRA,
        };
        Ok(extra)
    }
}

// ==========================================
// ConfigScope - 配置作用域
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigScope {
    Global,                                 // 全局
    Organization { organization_id: String }, // 联合会
    District { district_id: String },       // 区会
    Church { church_id: String },           // 教会
}

impl ConfigScope {
    /// config_kv.scope_id 取值
    pub fn scope_id(&self) -> String {
        match self {
            ConfigScope::Global => "global".to_string(),
            ConfigScope::Organization { organization_id } => {
                format!("organization:{}", organization_id)
            }
            ConfigScope::District { district_id } => format!("district:{}", district_id),
            ConfigScope::Church { church_id } => format!("church:{}", church_id),
        }
    }

    /// 按优先级从高到低列出上下文涉及的作用域
    pub fn chain(ctx: &ConfigContext) -> Vec<ConfigScope> {
        let mut scopes = Vec::with_capacity(4);
        if let Some(id) = &ctx.church_id {
            scopes.push(ConfigScope::Church {
                church_id: id.clone(),
            });
        }
        if let Some(id) = &ctx.district_id {
            scopes.push(ConfigScope::District {
                district_id: id.clone(),
            });
        }
        if let Some(id) = &ctx.organization_id {
            scopes.push(ConfigScope::Organization {
                organization_id: id.clone(),
            });
        }
        scopes.push(ConfigScope::Global);
        scopes
    }
}

impl fmt::Display for ConfigScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.scope_id())
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 评分权重 (JSON: {"evaluation":0.6,"frequency":0.25,"punctuality":0.15})
    pub const SCORE_WEIGHTS: &str = "schedule.score_weights";

    // 月上限与强制填充
    pub const DEFAULT_MONTHLY_CAP: &str = "schedule.default_monthly_cap";
    pub const FORCED_FILL_MAX_EXTRA: &str = "schedule.forced_fill_max_extra";
}
