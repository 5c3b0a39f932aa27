// ==========================================
// 讲道排班系统 - 讲道主题
// ==========================================
// 循环规则: 指定日期 / 每周 (可全周适用) / 每月第N个星期几
// ==========================================

use crate::domain::error::DomainError;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

// ==========================================
// RecurrenceRule - 循环规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecurrenceRule {
    ExactDate { date: NaiveDate },
    Weekly { weekday: Weekday, whole_week: bool },
    Monthly { week_of_month: u32, weekday: Weekday },
}

impl RecurrenceRule {
    pub fn monthly(week_of_month: u32, weekday: Weekday) -> Result<Self, DomainError> {
        if !(1..=5).contains(&week_of_month) {
            return Err(DomainError::InvalidRecurrence(format!(
                "week_of_month={} 超出 1..=5",
                week_of_month
            )));
        }
        Ok(RecurrenceRule::Monthly {
            week_of_month,
            weekday,
        })
    }
}

/// 日期在当月中是第几个同星期几 (1..=5)
pub fn nth_weekday_of_month(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

// ==========================================
// Topic - 讲道主题
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub topic_id: String,
    pub code: i64,
    pub organization_id: String,
    pub title: String,
    pub rule: RecurrenceRule,
    pub valid_from: Option<NaiveDate>,
    pub valid_until: Option<NaiveDate>,
    pub active: bool,
}

impl Topic {
    /// 日期是否落在有效期内 (闭区间,缺省边界视为开放)
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.active
            && self.valid_from.map_or(true, |from| from <= date)
            && self.valid_until.map_or(true, |until| date <= until)
    }
}
