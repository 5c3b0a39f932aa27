// ==========================================
// 讲道排班系统 - 强制填充阶段
// ==========================================
// 职责: 对贪心分配后仍未填充的时段，逐步放宽月上限
// 规则:
// - 所有讲道人上限临时 +1, +2, ... 直到 max_extra
// - 每个增量下使用完全放宽的校验；取最小可行增量
// - 仅因上限不合格的讲道人才可能被增量救回
// - 仍无人合格则记为关键缺口 (不是错误)
// ==========================================

use crate::engine::assignor::{commit, AssignmentOutcome, Candidate};
use crate::engine::eligibility::{AvailabilityValidator, Ineligibility};
use crate::engine::run_state::GenerationRun;
use crate::engine::slots::Slot;
use crate::engine::topic::TopicSuggester;
use tracing::{debug, instrument, warn};

pub struct ForcedFiller {
    max_extra: u32,
}

impl ForcedFiller {
    /// 构造函数
    ///
    /// # 参数
    /// - max_extra: 上限最大增量 (0 表示关闭强制填充)
    pub fn new(max_extra: u32) -> Self {
        Self { max_extra }
    }

    pub fn max_extra(&self) -> u32 {
        self.max_extra
    }

    /// 对未填充时段执行强制填充
    #[instrument(skip_all, fields(unfilled = unfilled.len(), max_extra = self.max_extra))]
    pub fn fill(
        &self,
        unfilled: Vec<Slot>,
        candidates: &[Candidate],
        run: &mut GenerationRun,
        topics: &TopicSuggester,
    ) -> AssignmentOutcome {
        let mut outcome = AssignmentOutcome::default();

        for slot in unfilled {
            let found = self.pick(candidates, &slot, run);

            match found {
                Some((candidate, extra)) => {
                    debug!(
                        preacher_id = %candidate.preacher_id,
                        church_id = %slot.church_id,
                        date = %slot.date,
                        extra_cap = extra,
                        "强制填充成功"
                    );
                    outcome
                        .filled
                        .push(commit(candidate, slot, run, topics, true, true, extra));
                }
                None => {
                    warn!(
                        church_id = %slot.church_id,
                        date = %slot.date,
                        time = %slot.time,
                        "强制填充后仍无合格讲道人"
                    );
                    outcome.unfilled.push(slot);
                }
            }
        }

        outcome
    }

    /// 选出所需增量最小的讲道人 (增量相同按排名先后)
    fn pick<'a>(
        &self,
        candidates: &'a [Candidate],
        slot: &Slot,
        run: &GenerationRun,
    ) -> Option<(&'a Candidate, u32)> {
        let mut best: Option<(&Candidate, u32)> = None;

        for candidate in candidates {
            let Some(extra) = Self::required_extra(candidate, slot, run) else {
                continue;
            };
            if extra > self.max_extra {
                continue;
            }
            if best.map_or(true, |(_, current)| extra < current) {
                best = Some((candidate, extra));
                if extra == 1 {
                    break;
                }
            }
        }

        best
    }

    /// 使讲道人合格所需的最小上限增量
    ///
    /// 其他规则不满足时返回 None (任何增量都无效)
    fn required_extra(candidate: &Candidate, slot: &Slot, run: &GenerationRun) -> Option<u32> {
        match AvailabilityValidator::check(&candidate.preacher_id, candidate.cap, slot, run, true) {
            Ok(()) => Some(1),
            Err(Ineligibility::CapReached { count, cap }) => {
                Some(count.saturating_sub(cap).saturating_add(1))
            }
            Err(reason) => {
                debug!(
                    preacher_id = %candidate.preacher_id,
                    church_id = %slot.church_id,
                    date = %slot.date,
                    reason = %reason,
                    "讲道人不可排"
                );
                None
            }
        }
    }
}
