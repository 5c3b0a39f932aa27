// ==========================================
// 讲道排班系统 - 替补讲道人建议
// ==========================================
// 职责: 讲道安排被拒绝后，建议评分最高的可用替补
// 条件: 同区会、非原讲道人、当日可用且无其他讲道、未达当月上限
// ==========================================

use crate::config::{ConfigContext, ScheduleConfigReader};
use crate::domain::{LiturgicalDay, Preacher, SchedulePeriod};
use crate::engine::eligibility::AvailabilityValidator;
use crate::engine::error::EngineResult;
use crate::engine::repositories::ScheduleRepositories;
use crate::engine::run_state::GenerationRun;
use crate::engine::score::ScoreEngine;
use crate::engine::slots::Slot;
use crate::repository::RepositoryError;
use chrono::Datelike;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct SubstituteSuggester<C>
where
    C: ScheduleConfigReader,
{
    repos: ScheduleRepositories,
    config: Arc<C>,
}

impl<C> SubstituteSuggester<C>
where
    C: ScheduleConfigReader,
{
    pub fn new(repos: ScheduleRepositories, config: Arc<C>) -> Self {
        Self { repos, config }
    }

    /// 为讲道安排建议替补讲道人
    ///
    /// # 返回
    /// - Ok(Some(preacher)): 评分最高的合格讲道人
    /// - Ok(None): 没有合格讲道人
    /// - Err(NotFound): 讲道安排或排班不存在
    #[instrument(skip(self))]
    pub async fn suggest(&self, assignment_id: &str) -> EngineResult<Option<Preacher>> {
        let assignment = self
            .repos
            .assignment_repo
            .find_by_id(assignment_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Assignment".to_string(),
                id: assignment_id.to_string(),
            })?;

        let schedule = self
            .repos
            .schedule_repo
            .find_by_id(&assignment.schedule_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Schedule".to_string(),
                id: assignment.schedule_id.clone(),
            })?;

        let district_id = schedule.district_id.as_str();
        let organization_id = self
            .repos
            .district_repo
            .find_by_id(district_id)?
            .map(|d| d.organization_id);
        let ctx = ConfigContext::for_district(district_id, organization_id)
            .with_church(assignment.church_id.clone());
        let default_cap = self.config.get_default_monthly_cap(&ctx).await?;

        // 讲道安排所在月份 (一般与排班月份一致)
        let period = SchedulePeriod::new(assignment.date.month(), assignment.date.year())
            .unwrap_or_else(|_| schedule.period());
        let from = period.first_day();
        let to = period.last_day();

        let run = GenerationRun::load(
            period,
            self.repos
                .unavailability_repo
                .list_active_overlapping_for_district(district_id, from, to)?,
            self.repos
                .assignment_repo
                .list_occupying_for_district(district_id, from, to)?,
        );

        let slot = Slot {
            church_id: assignment.church_id.clone(),
            date: assignment.date,
            time: assignment.time,
            day: LiturgicalDay::from_weekday(assignment.date.weekday())
                .unwrap_or(LiturgicalDay::Saturday),
            service_name: assignment.service_name.clone(),
            church_ordinal: 0,
            template_ordinal: 0,
        };

        let ranked = ScoreEngine::rank(
            self.repos
                .preacher_repo
                .list_schedulable_by_district(district_id)?,
        );

        let substitute = ranked.into_iter().find(|p| {
            p.preacher_id != assignment.preacher_id
                && AvailabilityValidator::eligible(
                    &p.preacher_id,
                    p.effective_cap(default_cap),
                    &slot,
                    &run,
                    true,
                )
        });

        debug!(
            assignment_id = %assignment_id,
            substitute = ?substitute.as_ref().map(|p| p.preacher_id.as_str()),
            "替补建议完成"
        );
        Ok(substitute)
    }
}
