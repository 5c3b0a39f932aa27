// ==========================================
// 讲道排班系统 - 贪心分配引擎
// ==========================================
// 职责: 按时段顺序为每个时段选择第一个合格讲道人
// 规则:
// - A 轮: 严格模式 (含同教会回看)
// - B 轮: A 轮无人合格时放宽同教会回看
// - 不回溯；仍无人合格的时段交给强制填充阶段
// ==========================================

use crate::domain::Preacher;
use crate::engine::eligibility::AvailabilityValidator;
use crate::engine::run_state::GenerationRun;
use crate::engine::slots::Slot;
use crate::engine::topic::TopicSuggester;
use tracing::{debug, instrument};

// ==========================================
// Candidate - 排序后的候选讲道人
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub preacher_id: String,
    pub effective_score: f64,
    /// 月上限 (未设置时取配置默认值)
    pub cap: u32,
}

impl Candidate {
    pub fn from_preacher(preacher: &Preacher, default_cap: u32) -> Self {
        Self {
            preacher_id: preacher.preacher_id.clone(),
            effective_score: preacher.effective_score,
            cap: preacher.effective_cap(default_cap),
        }
    }
}

// ==========================================
// PlannedAssignment - 运行中产生的讲道安排
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAssignment {
    pub slot: Slot,
    pub preacher_id: String,
    pub topic_id: Option<String>,
    /// 是否在放宽模式下产生
    pub relaxed: bool,
    /// 是否由强制填充产生
    pub forced: bool,
    /// 强制填充时叠加的上限增量
    pub extra_cap: u32,
}

/// 分配结果
#[derive(Debug, Clone, Default)]
pub struct AssignmentOutcome {
    pub filled: Vec<PlannedAssignment>,
    pub unfilled: Vec<Slot>,
}

/// 在候选中查找第一个合格讲道人
pub(crate) fn first_eligible<'a>(
    candidates: &'a [Candidate],
    slot: &Slot,
    run: &GenerationRun,
    relaxed: bool,
) -> Option<&'a Candidate> {
    candidates.iter().find(|c| {
        match AvailabilityValidator::check(
            &c.preacher_id,
            c.cap,
            slot,
            run,
            relaxed,
        ) {
            Ok(()) => true,
            Err(reason) => {
                debug!(
                    preacher_id = %c.preacher_id,
                    church_id = %slot.church_id,
                    date = %slot.date,
                    reason = %reason,
                    "讲道人不可排"
                );
                false
            }
        }
    })
}

/// 记录一条讲道安排并附加主题
pub(crate) fn commit(
    candidate: &Candidate,
    slot: Slot,
    run: &mut GenerationRun,
    topics: &TopicSuggester,
    relaxed: bool,
    forced: bool,
    extra_cap: u32,
) -> PlannedAssignment {
    run.record(&candidate.preacher_id, slot.date);
    let topic_id = topics.suggest(slot.date).map(|t| t.topic_id.clone());
    PlannedAssignment {
        slot,
        preacher_id: candidate.preacher_id.clone(),
        topic_id,
        relaxed,
        forced,
        extra_cap,
    }
}

// ==========================================
// GreedyAssignor - 贪心分配引擎
// ==========================================
pub struct GreedyAssignor {
    // 无状态引擎
}

impl GreedyAssignor {
    pub fn new() -> Self {
        Self {}
    }

    /// 按时段顺序执行 A/B 两轮分配
    ///
    /// # 参数
    /// - slots: 已排序时段
    /// - candidates: 已按综合评分降序排列的候选
    /// - run: 运行状态（会被修改）
    /// - topics: 主题建议器
    #[instrument(skip_all, fields(slots = slots.len(), candidates = candidates.len()))]
    pub fn assign(
        &self,
        slots: Vec<Slot>,
        candidates: &[Candidate],
        run: &mut GenerationRun,
        topics: &TopicSuggester,
    ) -> AssignmentOutcome {
        let mut outcome = AssignmentOutcome::default();

        for slot in slots {
            let strict = first_eligible(candidates, &slot, run, false);
            let (chosen, relaxed) = match strict {
                Some(c) => (Some(c), false),
                None => (first_eligible(candidates, &slot, run, true), true),
            };

            match chosen {
                Some(candidate) => {
                    debug!(
                        preacher_id = %candidate.preacher_id,
                        church_id = %slot.church_id,
                        date = %slot.date,
                        time = %slot.time,
                        relaxed,
                        "时段已分配"
                    );
                    outcome
                        .filled
                        .push(commit(candidate, slot, run, topics, relaxed, false, 0));
                }
                None => {
                    debug!(church_id = %slot.church_id, date = %slot.date, time = %slot.time, "时段未能分配");
                    outcome.unfilled.push(slot);
                }
            }
        }

        outcome
    }
}

impl Default for GreedyAssignor {
    fn default() -> Self {
        Self::new()
    }
}
