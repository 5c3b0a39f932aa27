// ==========================================
// 讲道排班系统 - 生成运行状态
// ==========================================
// 职责: 一次生成运行的内存索引 (加载一次，运行结束即丢弃)
// 内容:
// - 讲道人不可用时段
// - 已落库讲道安排 (当月计数、占用日期、上周同教会)
// - 本次运行新增的计数与占用日期
// ==========================================

use crate::domain::{Assignment, SchedulePeriod, UnavailabilityPeriod};
use chrono::{Duration, NaiveDate};
use std::collections::{HashMap, HashSet};

/// 同教会回看天数
pub const SAME_CHURCH_LOOKBACK_DAYS: i64 = 7;

// ==========================================
// GenerationRun - 生成运行状态
// ==========================================
#[derive(Debug, Default)]
pub struct GenerationRun {
    period: Option<SchedulePeriod>,

    // ===== 已落库数据 (只读) =====
    unavailability: HashMap<String, Vec<UnavailabilityPeriod>>,
    persisted_dates: HashMap<String, HashSet<NaiveDate>>,
    persisted_church_dates: HashSet<(String, String, NaiveDate)>,
    persisted_month_counts: HashMap<String, u32>,

    // ===== 本次运行 =====
    run_dates: HashMap<String, HashSet<NaiveDate>>,
    run_counts: HashMap<String, u32>,
}

impl GenerationRun {
    /// 运行状态需要加载的已有讲道安排起始日 (月初前 7 天)
    pub fn lookback_start(period: SchedulePeriod) -> NaiveDate {
        period.first_day() - Duration::days(SAME_CHURCH_LOOKBACK_DAYS)
    }

    /// 由已落库数据构建运行状态
    ///
    /// # 参数
    /// - unavailability: 与 [月初-7天, 月末] 有交集的启用时段
    /// - existing: 同区间内占用中的讲道安排
    pub fn load(
        period: SchedulePeriod,
        unavailability: Vec<UnavailabilityPeriod>,
        existing: Vec<Assignment>,
    ) -> Self {
        let mut run = Self {
            period: Some(period),
            ..Self::default()
        };

        for u in unavailability.into_iter().filter(|u| u.active) {
            run.unavailability.entry(u.preacher_id.clone()).or_default().push(u);
        }

        for a in existing.into_iter().filter(|a| a.status.occupies()) {
            run.persisted_dates
                .entry(a.preacher_id.clone())
                .or_default()
                .insert(a.date);
            if period.contains(a.date) {
                *run.persisted_month_counts.entry(a.preacher_id.clone()).or_insert(0) += 1;
            }
            run.persisted_church_dates
                .insert((a.preacher_id, a.church_id, a.date));
        }

        run
    }

    pub fn period(&self) -> Option<SchedulePeriod> {
        self.period
    }

    /// 讲道人在该日期是否不可用
    pub fn is_unavailable(&self, preacher_id: &str, date: NaiveDate) -> bool {
        self.unavailability
            .get(preacher_id)
            .map_or(false, |periods| periods.iter().any(|u| u.covers(date)))
    }

    /// 讲道人在该日期是否已有讲道 (已落库或本次新增，不区分教会)
    pub fn is_date_occupied(&self, preacher_id: &str, date: NaiveDate) -> bool {
        let contains = |index: &HashMap<String, HashSet<NaiveDate>>| {
            index.get(preacher_id).map_or(false, |dates| dates.contains(&date))
        };
        contains(&self.persisted_dates) || contains(&self.run_dates)
    }

    /// 讲道人在 7 天前是否已在同一教会讲道 (仅查已落库讲道安排)
    pub fn preached_same_church_week_before(
        &self,
        preacher_id: &str,
        church_id: &str,
        date: NaiveDate,
    ) -> bool {
        let week_before = date - Duration::days(SAME_CHURCH_LOOKBACK_DAYS);
        self.persisted_church_dates.contains(&(
            preacher_id.to_string(),
            church_id.to_string(),
            week_before,
        ))
    }

    /// 当月已落库讲道次数
    pub fn persisted_count(&self, preacher_id: &str) -> u32 {
        self.persisted_month_counts.get(preacher_id).copied().unwrap_or(0)
    }

    /// 本次运行新增讲道次数
    pub fn run_count(&self, preacher_id: &str) -> u32 {
        self.run_counts.get(preacher_id).copied().unwrap_or(0)
    }

    /// 当月讲道总次数 (已落库 + 本次新增)
    pub fn month_count(&self, preacher_id: &str) -> u32 {
        self.persisted_count(preacher_id) + self.run_count(preacher_id)
    }

    /// 记录本次运行新增的讲道安排
    pub fn record(&mut self, preacher_id: &str, date: NaiveDate) {
        *self.run_counts.entry(preacher_id.to_string()).or_insert(0) += 1;
        self.run_dates
            .entry(preacher_id.to_string())
            .or_default()
            .insert(date);
    }
}
