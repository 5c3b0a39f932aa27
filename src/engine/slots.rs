// ==========================================
// 讲道排班系统 - 时段枚举引擎
// ==========================================
// 职责: 生成当月待填讲道时段 (按优先级排序)
// 规则:
// 1) 只有安息日/主日/周三产生时段
// 2) 教会自有模板存在时，只使用自有模板 (不与区会模板合并)
// 3) 排序: 档位 → 日期 → 教会顺序 → 时间 → 模板顺序
// ==========================================

use crate::domain::{Church, LiturgicalDay, PriorityTier, SchedulePeriod, ServiceTimeTemplate};
use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

// ==========================================
// Slot - 待填讲道时段
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub church_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// 主题上下文 (礼拜日)
    pub day: LiturgicalDay,
    pub service_name: Option<String>,
    /// 教会在输入中的顺序
    pub church_ordinal: usize,
    /// 模板在教会生效模板中的顺序
    pub template_ordinal: usize,
}

impl Slot {
    pub fn tier(&self) -> PriorityTier {
        self.day.tier()
    }

    fn sort_key(&self) -> (PriorityTier, NaiveDate, usize, NaiveTime, usize) {
        (
            self.tier(),
            self.date,
            self.church_ordinal,
            self.time,
            self.template_ordinal,
        )
    }
}

// ==========================================
// SlotEnumerator - 时段枚举引擎
// ==========================================
pub struct SlotEnumerator {
    // 无状态引擎
}

impl SlotEnumerator {
    pub fn new() -> Self {
        Self {}
    }

    /// 解析教会生效的模板
    ///
    /// 教会拥有需要讲道人的自有模板时只用自有模板，否则回退到区会模板
    pub fn resolve_templates<'a>(
        own_templates: Option<&'a Vec<ServiceTimeTemplate>>,
        district_templates: &'a [ServiceTimeTemplate],
    ) -> &'a [ServiceTimeTemplate] {
        match own_templates {
            Some(own) if own.iter().any(ServiceTimeTemplate::produces_slots) => own.as_slice(),
            _ => district_templates,
        }
    }

    /// 枚举当月全部待填时段
    ///
    /// # 参数
    /// - period: 排班月份
    /// - churches: 区会内启用教会 (顺序即稳定教会顺序)
    /// - church_templates: 教会ID → 教会自有模板
    /// - district_templates: 区会级模板
    ///
    /// # 返回
    /// 已排序、(church, date, time) 去重后的时段列表
    #[instrument(skip_all, fields(month = period.month, year = period.year, churches = churches.len()))]
    pub fn enumerate(
        &self,
        period: SchedulePeriod,
        churches: &[Church],
        church_templates: &HashMap<String, Vec<ServiceTimeTemplate>>,
        district_templates: &[ServiceTimeTemplate],
    ) -> Vec<Slot> {
        let mut slots = Vec::new();

        for (church_ordinal, church) in churches.iter().enumerate() {
            let templates = Self::resolve_templates(
                church_templates.get(&church.church_id),
                district_templates,
            );

            for date in period.days() {
                let Some(day) = LiturgicalDay::from_weekday(date.weekday()) else {
                    continue;
                };

                for (template_ordinal, template) in templates.iter().enumerate() {
                    if template.day != day || !template.produces_slots() {
                        continue;
                    }
                    slots.push(Slot {
                        church_id: church.church_id.clone(),
                        date,
                        time: template.time,
                        day,
                        service_name: template.service_name.clone(),
                        church_ordinal,
                        template_ordinal,
                    });
                }
            }
        }

        slots.sort_by_key(|s| s.sort_key());

        // 同一教会同日同时间只保留第一个模板
        let mut seen = HashSet::new();
        slots.retain(|s| {
            let fresh = seen.insert((s.church_id.clone(), s.date, s.time));
            if !fresh {
                debug!(church_id = %s.church_id, date = %s.date, time = %s.time, "重复时段，忽略");
            }
            fresh
        });

        debug!(slots = slots.len(), "时段枚举完成");
        slots
    }
}

impl Default for SlotEnumerator {
    fn default() -> Self {
        Self::new()
    }
}
