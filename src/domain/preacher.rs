// ==========================================
// 讲道排班系统 - 讲道人领域模型
// ==========================================
// 职责: 讲道人档案、评分子项、月上限、不可用时段
// 红线: 生成过程中评分为只读快照
// ==========================================

use crate::domain::error::DomainError;
use crate::domain::types::{ApprovalStatus, RoleSet};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Preacher - 讲道人
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preacher {
    pub preacher_id: String,           // 讲道人ID
    pub district_id: String,           // 所属区会
    pub name: String,                  // 姓名
    pub roles: RoleSet,                // 角色集合
    pub approval_status: ApprovalStatus, // 审批状态
    pub active: bool,                  // 是否启用

    // ===== 评分 (0-5) =====
    pub evaluation_score: f64,         // 评价平均分
    pub frequency_score: f64,          // 出勤子项 (由 frequency_rate 换算)
    pub punctuality_score: f64,        // 守时子项 (由 punctuality_rate 换算)
    pub effective_score: f64,          // 综合评分 (排序依据)

    // ===== 原始比率 (0-100%) =====
    pub frequency_rate: f64,
    pub punctuality_rate: f64,

    // ===== 统计 =====
    pub total_assignments: i64,
    pub completed_assignments: i64,
    pub missed_assignments: i64,
    pub declined_assignments: i64,

    /// 月讲道上限 (None 时使用配置默认值)
    pub monthly_cap: Option<u32>,
}

impl Preacher {
    /// 是否可参与自动排班 (启用 + 已审批 + 具备讲道角色)
    pub fn is_schedulable(&self) -> bool {
        self.active && self.approval_status == ApprovalStatus::Approved && self.roles.can_preach()
    }

    /// 生效的月上限
    pub fn effective_cap(&self, default_cap: u32) -> u32 {
        self.monthly_cap.unwrap_or(default_cap)
    }
}

// ==========================================
// ScoreWeights - 综合评分权重
// ==========================================
// 默认 0.6 / 0.25 / 0.15,使用前归一化 (和为 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub evaluation: f64,
    pub frequency: f64,
    pub punctuality: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            evaluation: 0.6,
            frequency: 0.25,
            punctuality: 0.15,
        }
    }
}

impl ScoreWeights {
    /// 权重是否可用 (非负、有限、和大于 0)
    pub fn is_valid(&self) -> bool {
        let parts = [self.evaluation, self.frequency, self.punctuality];
        parts.iter().all(|w| w.is_finite() && *w >= 0.0) && parts.iter().sum::<f64>() > 0.0
    }

    /// 归一化权重; 不可用时退回默认值
    pub fn normalized(&self) -> Self {
        let weights = if self.is_valid() { *self } else { Self::default() };
        let sum = weights.evaluation + weights.frequency + weights.punctuality;
        Self {
            evaluation: weights.evaluation / sum,
            frequency: weights.frequency / sum,
            punctuality: weights.punctuality / sum,
        }
    }
}

// ==========================================
// UnavailabilityPeriod - 不可用时段
// ==========================================
// 不变量: end_date >= start_date (闭区间)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnavailabilityPeriod {
    pub period_id: String,
    pub preacher_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    pub active: bool,
}

impl UnavailabilityPeriod {
    pub fn new(
        period_id: impl Into<String>,
        preacher_id: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, DomainError> {
        if end_date < start_date {
            return Err(DomainError::InvalidDateRange {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            period_id: period_id.into(),
            preacher_id: preacher_id.into(),
            start_date,
            end_date,
            reason: None,
            active: true,
        })
    }

    /// 是否覆盖指定日期
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.active && self.start_date <= date && date <= self.end_date
    }
}
