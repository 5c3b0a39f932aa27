// ==========================================
// 讲道排班系统 - 可用性与冲突校验
// ==========================================
// 职责: 判定讲道人是否可排入某时段 (纯判定，无副作用)
// 规则 (按顺序，短路):
// 1) 无不可用时段覆盖该日期
// 2) 该日期无其他讲道 (已落库 + 本次新增，跨教会)
// 3) 非放宽模式下，7 天前未在同一教会讲道
// 4) 当月讲道次数 < 生效上限
// ==========================================

use crate::engine::run_state::GenerationRun;
use crate::engine::slots::Slot;
use std::fmt;

// ==========================================
// Ineligibility - 不可排原因
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ineligibility {
    Unavailable,
    DateOccupied,
    SameChurchPreviousWeek,
    CapReached { count: u32, cap: u32 },
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligibility::Unavailable => write!(f, "UNAVAILABLE"),
            Ineligibility::DateOccupied => write!(f, "DATE_OCCUPIED"),
            Ineligibility::SameChurchPreviousWeek => write!(f, "SAME_CHURCH_PREVIOUS_WEEK"),
            Ineligibility::CapReached { count, cap } => {
                write!(f, "CAP_REACHED({}/{})", count, cap)
            }
        }
    }
}

// ==========================================
// AvailabilityValidator - 可用性校验
// ==========================================
pub struct AvailabilityValidator;

impl AvailabilityValidator {
    /// 校验并返回第一条不满足的规则
    ///
    /// # 参数
    /// - preacher_id: 讲道人
    /// - cap: 生效上限 (强制填充阶段已叠加增量)
    /// - slot: 待填时段
    /// - run: 运行状态
    /// - relaxed: 是否放宽同教会回看规则
    pub fn check(
        preacher_id: &str,
        cap: u32,
        slot: &Slot,
        run: &GenerationRun,
        relaxed: bool,
    ) -> Result<(), Ineligibility> {
        if run.is_unavailable(preacher_id, slot.date) {
            return Err(Ineligibility::Unavailable);
        }

        if run.is_date_occupied(preacher_id, slot.date) {
            return Err(Ineligibility::DateOccupied);
        }

        if !relaxed && run.preached_same_church_week_before(preacher_id, &slot.church_id, slot.date)
        {
            return Err(Ineligibility::SameChurchPreviousWeek);
        }

        let count = run.month_count(preacher_id);
        if count >= cap {
            return Err(Ineligibility::CapReached { count, cap });
        }

        Ok(())
    }

    /// 是否可排
    pub fn eligible(
        preacher_id: &str,
        cap: u32,
        slot: &Slot,
        run: &GenerationRun,
        relaxed: bool,
    ) -> bool {
        Self::check(preacher_id, cap, slot, run, relaxed).is_ok()
    }
}
