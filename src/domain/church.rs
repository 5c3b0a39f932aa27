// ==========================================
// 讲道排班系统 - 教会与礼拜时段模板
// ==========================================
// 红线: 模板作用域二选一 (教会 或 区会),不可同时
// ==========================================

use crate::domain::error::DomainError;
use crate::domain::types::{LiturgicalDay, PriorityTier};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

// ==========================================
// District - 区会
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct District {
    pub district_id: String,
    pub organization_id: String, // 所属联合会 (主题归属)
    pub name: String,
}

// ==========================================
// Church - 教会
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Church {
    pub church_id: String,
    pub district_id: String,
    pub name: String,
    pub active: bool,
}

// ==========================================
// TemplateScope - 模板作用域
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateScope {
    Church(String),
    District(String),
}

impl TemplateScope {
    /// 由数据库两列 (church_id, district_id) 构造,必须恰好一列非空
    pub fn from_columns(
        church_id: Option<String>,
        district_id: Option<String>,
    ) -> Result<Self, DomainError> {
        match (church_id, district_id) {
            (Some(c), None) => Ok(TemplateScope::Church(c)),
            (None, Some(d)) => Ok(TemplateScope::District(d)),
            (Some(_), Some(_)) => Err(DomainError::InvalidTemplateScope(
                "church_id 与 district_id 不可同时设置".to_string(),
            )),
            (None, None) => Err(DomainError::InvalidTemplateScope(
                "church_id 与 district_id 必须设置其一".to_string(),
            )),
        }
    }

    pub fn church_id(&self) -> Option<&str> {
        match self {
            TemplateScope::Church(id) => Some(id),
            TemplateScope::District(_) => None,
        }
    }

    pub fn district_id(&self) -> Option<&str> {
        match self {
            TemplateScope::District(id) => Some(id),
            TemplateScope::Church(_) => None,
        }
    }
}

// ==========================================
// ServiceTimeTemplate - 礼拜时段模板
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTimeTemplate {
    pub template_id: String,
    pub scope: TemplateScope,
    pub day: LiturgicalDay,
    pub time: NaiveTime,
    pub service_name: Option<String>,
    pub requires_preacher: bool,
    pub active: bool,
}

impl ServiceTimeTemplate {
    pub fn tier(&self) -> PriorityTier {
        self.day.tier()
    }

    /// 是否产生待排时段
    pub fn produces_slots(&self) -> bool {
        self.active && self.requires_preacher
    }
}
