// ==========================================
// 讲道排班系统 - 排班生成编排器
// ==========================================
// 用途: 协调一次月度排班生成
// 阶段: 枚举时段 → 分配 (A/B 轮 + 强制填充) → 报告与落库
// 红线: 评分为只读快照；排班与讲道安排单事务落库
// ==========================================

use crate::config::{ConfigContext, ScheduleConfigReader};
use crate::domain::{
    Assignment, AssignmentStatus, ScheduleDraft, SchedulePeriod, ScheduleStatus,
    ServiceTimeTemplate,
};
use crate::engine::assignor::{Candidate, GreedyAssignor, PlannedAssignment};
use crate::engine::error::{EngineError, EngineResult, PreconditionError};
use crate::engine::forced_fill::ForcedFiller;
use crate::engine::report::{GenerationReport, ReportBuilder};
use crate::engine::repositories::ScheduleRepositories;
use crate::engine::run_state::GenerationRun;
use crate::engine::score::ScoreEngine;
use crate::engine::slots::SlotEnumerator;
use crate::engine::topic::TopicSuggester;
use crate::repository::RepositoryError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

// ==========================================
// RunPhase - 生成阶段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Enumerating,
    Assigning,
    Reporting,
}

impl RunPhase {
    /// 下一阶段 (严格顺序)
    pub fn next(self) -> Option<RunPhase> {
        match self {
            RunPhase::Enumerating => Some(RunPhase::Assigning),
            RunPhase::Assigning => Some(RunPhase::Reporting),
            RunPhase::Reporting => None,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Enumerating => write!(f, "ENUMERATING"),
            RunPhase::Assigning => write!(f, "ASSIGNING"),
            RunPhase::Reporting => write!(f, "REPORTING"),
        }
    }
}

fn advance(phase: &mut RunPhase) {
    if let Some(next) = phase.next() {
        info!(from = %phase, to = %next, "生成阶段切换");
        *phase = next;
    }
}

// ==========================================
// GenerationResult - 生成结果
// ==========================================
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub schedule: ScheduleDraft,
    pub assignments: Vec<Assignment>,
    pub report: GenerationReport,
}

// ==========================================
// ScheduleGenerator - 排班生成编排器
// ==========================================
pub struct ScheduleGenerator<C>
where
    C: ScheduleConfigReader,
{
    repos: ScheduleRepositories,
    config: Arc<C>,
    enumerator: SlotEnumerator,
    assignor: GreedyAssignor,
}

impl<C> ScheduleGenerator<C>
where
    C: ScheduleConfigReader,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - repos: 仓储集合
    /// - config: 配置读取器
    pub fn new(repos: ScheduleRepositories, config: Arc<C>) -> Self {
        Self {
            repos,
            config,
            enumerator: SlotEnumerator::new(),
            assignor: GreedyAssignor::new(),
        }
    }

    /// 生成月度排班草稿
    ///
    /// # 返回
    /// - Ok(GenerationResult): 草稿、讲道安排与报告（未填充时段记录在报告中）
    /// - Err(Precondition): 同期已有排班 / 无启用教会 / 无可排讲道人
    /// - Err(其他): 意外错误，未落库任何数据
    #[instrument(skip(self))]
    pub async fn generate(
        &self,
        district_id: &str,
        month: u32,
        year: i32,
        requested_by: &str,
    ) -> EngineResult<GenerationResult> {
        let result = self.run(district_id, month, year, requested_by).await;

        if let Err(e) = &result {
            if !matches!(e, EngineError::Precondition(_)) {
                error!(
                    district_id = %district_id,
                    month,
                    year,
                    error = %e,
                    "排班生成意外失败，已回滚"
                );
            }
        }
        result
    }

    async fn run(
        &self,
        district_id: &str,
        month: u32,
        year: i32,
        requested_by: &str,
    ) -> EngineResult<GenerationResult> {
        // ==========================================
        // 前置条件
        // ==========================================
        let period = SchedulePeriod::new(month, year)
            .map_err(|_| PreconditionError::InvalidPeriod { month, year })?;

        let district = self
            .repos
            .district_repo
            .find_by_id(district_id)?
            .ok_or_else(|| PreconditionError::DistrictNotFound {
                district_id: district_id.to_string(),
            })?;

        if self.repos.schedule_repo.exists_for_period(district_id, month, year)? {
            return Err(already_exists(district_id, period).into());
        }

        let churches = self.repos.church_repo.list_active_by_district(district_id)?;
        if churches.is_empty() {
            return Err(PreconditionError::NoActiveChurches {
                district_id: district_id.to_string(),
            }
            .into());
        }

        let preachers = self.repos.preacher_repo.list_schedulable_by_district(district_id)?;
        if preachers.is_empty() {
            return Err(PreconditionError::NoEligiblePreachers {
                district_id: district_id.to_string(),
            }
            .into());
        }

        let ctx = ConfigContext::for_district(district_id, Some(district.organization_id.clone()));
        let default_cap = self.config.get_default_monthly_cap(&ctx).await?;
        let max_extra = self.config.get_forced_fill_max_extra(&ctx).await?;

        info!(
            churches = churches.len(),
            preachers = preachers.len(),
            default_cap,
            max_extra,
            "开始生成排班"
        );

        // ==========================================
        // 阶段1: 枚举时段
        // ==========================================
        let mut phase = RunPhase::Enumerating;

        let mut church_templates: HashMap<String, Vec<ServiceTimeTemplate>> = HashMap::new();
        for church in &churches {
            let own = self.repos.service_time_repo.list_active_by_church(&church.church_id)?;
            if own.iter().any(ServiceTimeTemplate::produces_slots) {
                church_templates.insert(church.church_id.clone(), own);
            }
        }
        let district_templates = self.repos.service_time_repo.list_active_by_district(district_id)?;

        let slots = self
            .enumerator
            .enumerate(period, &churches, &church_templates, &district_templates);

        // 运行状态一次性加载 (含月初前 7 天)
        let from = GenerationRun::lookback_start(period);
        let to = period.last_day();
        let unavailability = self
            .repos
            .unavailability_repo
            .list_active_overlapping_for_district(district_id, from, to)?;
        let existing = self
            .repos
            .assignment_repo
            .list_occupying_for_district(district_id, from, to)?;
        let mut run = GenerationRun::load(period, unavailability, existing);

        let topics = TopicSuggester::new(
            self.repos
                .topic_repo
                .list_active_by_organization(&district.organization_id)?,
        );

        // ==========================================
        // 阶段2: 分配
        // ==========================================
        advance(&mut phase);

        let candidates: Vec<Candidate> = ScoreEngine::rank(preachers)
            .iter()
            .map(|p| Candidate::from_preacher(p, default_cap))
            .collect();

        let total_slots = slots.len();
        let greedy = self.assignor.assign(slots, &candidates, &mut run, &topics);
        let forced = ForcedFiller::new(max_extra).fill(greedy.unfilled, &candidates, &mut run, &topics);

        let mut filled: Vec<PlannedAssignment> = greedy.filled;
        filled.extend(forced.filled);
        let unfilled = forced.unfilled;

        // ==========================================
        // 阶段3: 报告与落库
        // ==========================================
        advance(&mut phase);

        let now = chrono::Local::now().naive_local();
        let schedule = ScheduleDraft {
            schedule_id: Uuid::new_v4().to_string(),
            district_id: district_id.to_string(),
            month,
            year,
            status: ScheduleStatus::Draft,
            created_by: requested_by.to_string(),
            created_at: now,
            updated_at: now,
        };

        let report = ReportBuilder::build(
            &schedule.schedule_id,
            district_id,
            period,
            &churches,
            &filled,
            &unfilled,
        );

        filled.sort_by(|a, b| {
            (a.slot.date, a.slot.time, a.slot.church_ordinal)
                .cmp(&(b.slot.date, b.slot.time, b.slot.church_ordinal))
        });
        let assignments: Vec<Assignment> = filled
            .into_iter()
            .map(|p| to_assignment(&schedule.schedule_id, p))
            .collect();

        match self
            .repos
            .schedule_repo
            .create_with_assignments(&schedule, &assignments)
        {
            Ok(_) => {}
            // 并发生成竞态: 以唯一约束兜底
            Err(RepositoryError::UniqueConstraintViolation(msg)) if msg.contains("schedule.") => {
                return Err(already_exists(district_id, period).into());
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            schedule_id = %schedule.schedule_id,
            phase = %phase,
            total_slots,
            total_filled = report.total_filled,
            total_unfilled = report.total_unfilled,
            forced_filled = report.forced_filled,
            churches_without_coverage = report.churches_without_coverage.len(),
            "排班生成完成"
        );

        Ok(GenerationResult {
            schedule,
            assignments,
            report,
        })
    }
}

fn already_exists(district_id: &str, period: SchedulePeriod) -> PreconditionError {
    PreconditionError::ScheduleAlreadyExists {
        district_id: district_id.to_string(),
        month: period.month,
        year: period.year,
    }
}

fn to_assignment(schedule_id: &str, planned: PlannedAssignment) -> Assignment {
    Assignment {
        assignment_id: Uuid::new_v4().to_string(),
        schedule_id: schedule_id.to_string(),
        church_id: planned.slot.church_id,
        preacher_id: planned.preacher_id,
        date: planned.slot.date,
        time: planned.slot.time,
        service_name: planned.slot.service_name,
        status: AssignmentStatus::Scheduled,
        topic_id: planned.topic_id,
        forced: planned.forced,
    }
}
