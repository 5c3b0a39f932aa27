// ==========================================
// 讲道排班系统 - 排班配置读取 Trait
// ==========================================
// 职责: 定义排班引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::ScoreWeights;
use async_trait::async_trait;
use std::error::Error;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ConfigContext - 配置查询上下文
// ==========================================
// 覆写优先级: 教会 > 区会 > 联合会 > 全局 > 内置默认值
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigContext {
    pub church_id: Option<String>,
    pub district_id: Option<String>,
    pub organization_id: Option<String>,
}

impl ConfigContext {
    /// 区会级上下文 (排班生成使用)
    pub fn for_district(district_id: impl Into<String>, organization_id: Option<String>) -> Self {
        Self {
            church_id: None,
            district_id: Some(district_id.into()),
            organization_id,
        }
    }

    pub fn with_church(mut self, church_id: impl Into<String>) -> Self {
        self.church_id = Some(church_id.into());
        self
    }
}

// ==========================================
// ScheduleConfigReader Trait
// ==========================================
// 用途: 排班生成与评分所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ScheduleConfigReader: Send + Sync {
    /// 获取综合评分权重（已归一化）
    ///
    /// # 默认值
    /// - evaluation=0.6, frequency=0.25, punctuality=0.15
    async fn get_score_weights(&self, ctx: &ConfigContext) -> ConfigResult<ScoreWeights>;

    /// 获取默认月讲道上限（讲道人未单独设置时使用）
    ///
    /// # 默认值
    /// - 4
    async fn get_default_monthly_cap(&self, ctx: &ConfigContext) -> ConfigResult<u32>;

    /// 获取强制填充阶段的最大上限增量
    ///
    /// # 返回
    /// - 0 表示关闭强制填充（负值按 0 处理）
    ///
    /// # 默认值
    /// - 5
    async fn get_forced_fill_max_extra(&self, ctx: &ConfigContext) -> ConfigResult<u32>;
}
