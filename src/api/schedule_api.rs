// ==========================================
// 讲道排班系统 - 排班 API
// ==========================================
// 职责: 月度排班生成、状态流转、草稿删除、拒绝与替补建议
// 状态流转: DRAFT → APPROVED → FINALIZED
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::preacher_api::decline_penalty;
use crate::config::ScheduleConfigReader;
use crate::domain::{Assignment, AssignmentStatus, Preacher, ScheduleDraft, ScheduleStatus};
use crate::engine::{GenerationResult, ScheduleGenerator, ScheduleRepositories, SubstituteSuggester};
use tracing::info;

// ==========================================
// ScheduleApi - 排班 API
// ==========================================
pub struct ScheduleApi<C>
where
    C: ScheduleConfigReader,
{
    repos: ScheduleRepositories,
    generator: ScheduleGenerator<C>,
    substitute: SubstituteSuggester<C>,
}

impl<C> ScheduleApi<C>
where
    C: ScheduleConfigReader,
{
    /// 创建新的ScheduleApi实例
    pub fn new(repos: ScheduleRepositories, config: Arc<C>) -> Self {
        Self {
            generator: ScheduleGenerator::new(repos.clone(), config.clone()),
            substitute: SubstituteSuggester::new(repos.clone(), config),
            repos,
        }
    }

    /// 生成月度排班草稿
    ///
    /// # 返回
    /// - Ok(GenerationResult): 草稿 + 报告 (未填充时段不是错误)
    /// - Err(ApiError::Precondition): 同期已存在 / 无教会 / 无讲道人 / 月份无效
    pub async fn generate(
        &self,
        district_id: &str,
        month: u32,
        year: i32,
        requested_by: &str,
    ) -> ApiResult<GenerationResult> {
        if district_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("区会ID不能为空".to_string()));
        }
        if requested_by.trim().is_empty() {
            return Err(ApiError::InvalidInput("操作人不能为空".to_string()));
        }

        let result = self
            .generator
            .generate(district_id, month, year, requested_by)
            .await?;
        Ok(result)
    }

    pub fn get_schedule(&self, schedule_id: &str) -> ApiResult<ScheduleDraft> {
        self.repos
            .schedule_repo
            .find_by_id(schedule_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Schedule(id={})不存在", schedule_id)))
    }

    pub fn list_assignments(&self, schedule_id: &str) -> ApiResult<Vec<Assignment>> {
        self.get_schedule(schedule_id)?;
        Ok(self.repos.assignment_repo.list_by_schedule(schedule_id)?)
    }

    /// 审批排班 (DRAFT → APPROVED)
    pub fn approve(&self, schedule_id: &str) -> ApiResult<ScheduleDraft> {
        self.transition(schedule_id, ScheduleStatus::Approved)
    }

    /// 定稿排班 (APPROVED → FINALIZED)
    pub fn finalize(&self, schedule_id: &str) -> ApiResult<ScheduleDraft> {
        self.transition(schedule_id, ScheduleStatus::Finalized)
    }

    /// 删除草稿 (讲道安排级联删除，删除后可重新生成)
    pub fn delete_draft(&self, schedule_id: &str) -> ApiResult<()> {
        let schedule = self.get_schedule(schedule_id)?;
        if !schedule.is_draft() {
            return Err(ApiError::InvalidStateTransition {
                from: schedule.status.to_string(),
                to: "DELETED".to_string(),
            });
        }

        self.repos.schedule_repo.delete(schedule_id)?;
        info!(schedule_id = %schedule_id, "排班草稿已删除");
        Ok(())
    }

    /// 讲道人拒绝讲道安排
    ///
    /// 讲道安排标记为 DECLINED，讲道人综合评分下调，并返回替补建议
    pub async fn decline_assignment(&self, assignment_id: &str) -> ApiResult<Option<Preacher>> {
        let assignment = self.get_assignment(assignment_id)?;
        if assignment.status == AssignmentStatus::Declined {
            return Err(ApiError::InvalidStateTransition {
                from: assignment.status.to_string(),
                to: AssignmentStatus::Declined.to_string(),
            });
        }

        let penalized = decline_penalty(&self.repos.preacher_repo, &assignment.preacher_id)?;
        self.repos
            .assignment_repo
            .decline_with_penalty(assignment_id, &penalized)?;
        info!(
            assignment_id = %assignment_id,
            preacher_id = %penalized.preacher_id,
            after = penalized.effective_score,
            "讲道安排已拒绝，综合评分已下调"
        );

        self.suggest_substitute(assignment_id).await
    }

    /// 为讲道安排建议替补讲道人
    pub async fn suggest_substitute(&self, assignment_id: &str) -> ApiResult<Option<Preacher>> {
        if assignment_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("讲道安排ID不能为空".to_string()));
        }
        Ok(self.substitute.suggest(assignment_id).await?)
    }

    fn get_assignment(&self, assignment_id: &str) -> ApiResult<Assignment> {
        self.repos
            .assignment_repo
            .find_by_id(assignment_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Assignment(id={})不存在", assignment_id)))
    }

    fn transition(&self, schedule_id: &str, target: ScheduleStatus) -> ApiResult<ScheduleDraft> {
        let schedule = self.get_schedule(schedule_id)?;
        if !schedule.status.can_transition_to(target) {
            return Err(ApiError::InvalidStateTransition {
                from: schedule.status.to_string(),
                to: target.to_string(),
            });
        }

        self.repos.schedule_repo.update_status(schedule_id, target)?;
        info!(
            schedule_id = %schedule_id,
            from = %schedule.status,
            to = %target,
            "排班状态已更新"
        );
        self.get_schedule(schedule_id)
    }
}
