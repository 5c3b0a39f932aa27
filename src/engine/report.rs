// ==========================================
// 讲道排班系统 - 生成报告
// ==========================================
// 职责: 汇总总体与按教会的填充统计 (只读观察，不影响分配)
// ==========================================

use crate::domain::{Church, SchedulePeriod};
use crate::engine::assignor::PlannedAssignment;
use crate::engine::slots::Slot;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// ChurchCoverage - 单个教会的填充统计
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurchCoverage {
    pub church_id: String,
    pub church_name: String,
    pub filled: usize,
    pub unfilled: usize,
}

/// 强制填充后仍未填充的时段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalGap {
    pub church_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

// ==========================================
// GenerationReport - 生成报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub schedule_id: String,
    pub district_id: String,
    pub month: u32,
    pub year: i32,

    // ===== 总体统计 =====
    pub total_churches: usize,
    pub total_slots: usize,
    pub total_filled: usize,
    pub total_unfilled: usize,
    pub forced_filled: usize,

    /// 没有任何讲道安排的教会
    pub churches_without_coverage: Vec<String>,
    pub per_church: Vec<ChurchCoverage>,
    pub critical_gaps: Vec<CriticalGap>,
}

impl GenerationReport {
    /// 是否全部填充
    pub fn is_complete(&self) -> bool {
        self.total_unfilled == 0
    }

    pub fn coverage_for(&self, church_id: &str) -> Option<&ChurchCoverage> {
        self.per_church.iter().find(|c| c.church_id == church_id)
    }
}

pub struct ReportBuilder;

impl ReportBuilder {
    /// 构建报告
    ///
    /// # 参数
    /// - churches: 范围内教会 (报告中保持该顺序)
    /// - filled: 两轮分配 + 强制填充产生的全部安排
    /// - unfilled: 强制填充后剩余时段
    pub fn build(
        schedule_id: &str,
        district_id: &str,
        period: SchedulePeriod,
        churches: &[Church],
        filled: &[PlannedAssignment],
        unfilled: &[Slot],
    ) -> GenerationReport {
        let mut filled_by_church: HashMap<&str, usize> = HashMap::new();
        for a in filled {
            *filled_by_church.entry(a.slot.church_id.as_str()).or_insert(0) += 1;
        }
        let mut unfilled_by_church: HashMap<&str, usize> = HashMap::new();
        for s in unfilled {
            *unfilled_by_church.entry(s.church_id.as_str()).or_insert(0) += 1;
        }

        let per_church: Vec<ChurchCoverage> = churches
            .iter()
            .map(|c| ChurchCoverage {
                church_id: c.church_id.clone(),
                church_name: c.name.clone(),
                filled: filled_by_church.get(c.church_id.as_str()).copied().unwrap_or(0),
                unfilled: unfilled_by_church.get(c.church_id.as_str()).copied().unwrap_or(0),
            })
            .collect();

        let churches_without_coverage = per_church
            .iter()
            .filter(|c| c.filled == 0)
            .map(|c| c.church_id.clone())
            .collect();

        let mut critical_gaps: Vec<CriticalGap> = unfilled
            .iter()
            .map(|s| CriticalGap {
                church_id: s.church_id.clone(),
                date: s.date,
                time: s.time,
            })
            .collect();
        critical_gaps.sort_by(|a, b| (a.date, a.time).cmp(&(b.date, b.time)));

        GenerationReport {
            schedule_id: schedule_id.to_string(),
            district_id: district_id.to_string(),
            month: period.month,
            year: period.year,
            total_churches: churches.len(),
            total_slots: filled.len() + unfilled.len(),
            total_filled: filled.len(),
            total_unfilled: unfilled.len(),
            forced_filled: filled.iter().filter(|a| a.forced).count(),
            churches_without_coverage,
            per_church,
            critical_gaps,
        }
    }
}
