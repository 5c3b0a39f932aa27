// ==========================================
// 讲道排班系统 - 讲道主题建议
// ==========================================
// 匹配顺序: 指定日期 → 每周 (同星期几或全周) → 每月第N个星期几
// 同类内按主题编码升序取第一个
// ==========================================

use crate::domain::topic::nth_weekday_of_month;
use crate::domain::{RecurrenceRule, Topic};
use chrono::{Datelike, NaiveDate, Weekday};

pub struct TopicSuggester {
    topics: Vec<Topic>,
}

impl TopicSuggester {
    /// 构造函数（按编码排序，过滤停用主题）
    pub fn new(mut topics: Vec<Topic>) -> Self {
        topics.retain(|t| t.active);
        topics.sort_by_key(|t| t.code);
        Self { topics }
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// 为日期建议主题
    pub fn suggest(&self, date: NaiveDate) -> Option<&Topic> {
        self.suggest_for(date, date.weekday())
    }

    /// 按日期与星期几建议主题
    pub fn suggest_for(&self, date: NaiveDate, weekday: Weekday) -> Option<&Topic> {
        let valid = || self.topics.iter().filter(move |t| t.is_valid_on(date));

        valid()
            .find(|t| matches!(t.rule, RecurrenceRule::ExactDate { date: d } if d == date))
            .or_else(|| {
                valid().find(|t| {
                    matches!(
                        t.rule,
                        RecurrenceRule::Weekly { weekday: w, whole_week } if whole_week || w == weekday
                    )
                })
            })
            .or_else(|| {
                let nth = nth_weekday_of_month(date);
                valid().find(|t| {
                    matches!(
                        t.rule,
                        RecurrenceRule::Monthly { week_of_month, weekday: w }
                            if week_of_month == nth && w == weekday
                    )
                })
            })
    }
}
