// ==========================================
// 讲道排班系统 - 排班与讲道安排领域模型
// ==========================================
// 不变量:
// - 排班 (district_id, month, year) 唯一
// - 同一排班内 (church_id, date, time) 唯一
// - 讲道人每个日历日至多一次讲道 (跨教会)
// ==========================================

use crate::domain::error::DomainError;
use crate::domain::types::{AssignmentStatus, ScheduleStatus};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// SchedulePeriod - 排班月份
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchedulePeriod {
    pub month: u32,
    pub year: i32,
}

impl SchedulePeriod {
    pub fn new(month: u32, year: i32) -> Result<Self, DomainError> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(DomainError::InvalidPeriod { month, year });
        }
        Ok(Self { month, year })
    }

    /// 月份首日
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// 月份末日
    pub fn last_day(&self) -> NaiveDate {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1)
            .map(|d| d - Duration::days(1))
            .unwrap_or(NaiveDate::MAX)
    }

    /// 月份内所有日期
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last_day();
        self.first_day().iter_days().take_while(move |d| *d <= last)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

// ==========================================
// ScheduleDraft - 月度排班
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDraft {
    pub schedule_id: String,
    pub district_id: String,
    pub month: u32,
    pub year: i32,
    pub status: ScheduleStatus,
    pub created_by: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ScheduleDraft {
    pub fn period(&self) -> SchedulePeriod {
        SchedulePeriod {
            month: self.month,
            year: self.year,
        }
    }

    pub fn is_draft(&self) -> bool {
        self.status == ScheduleStatus::Draft
    }
}

// ==========================================
// Assignment - 讲道安排
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub assignment_id: String,
    pub schedule_id: String,
    pub church_id: String,
    pub preacher_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub service_name: Option<String>,
    pub status: AssignmentStatus,
    pub topic_id: Option<String>,
    /// 是否由强制填充阶段产生
    pub forced: bool,
}
