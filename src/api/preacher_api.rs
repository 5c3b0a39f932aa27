// ==========================================
// 讲道排班系统 - 讲道人评分 API
// ==========================================
// 职责: 外部事件触发的评分重算 (评价、出勤、守时、拒绝)
// 红线: 生成过程中不重算评分
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigContext, ScheduleConfigReader};
use crate::domain::Preacher;
use crate::engine::score::{ScoreEngine, MAX_SUB_SCORE};
use crate::repository::{DistrictRepository, PreacherRepository};
use tracing::info;

// ==========================================
// PreacherApi - 讲道人评分 API
// ==========================================
pub struct PreacherApi<C>
where
    C: ScheduleConfigReader,
{
    preacher_repo: Arc<PreacherRepository>,
    district_repo: Arc<DistrictRepository>,
    config: Arc<C>,
}

impl<C> PreacherApi<C>
where
    C: ScheduleConfigReader,
{
    /// 创建新的PreacherApi实例
    pub fn new(
        preacher_repo: Arc<PreacherRepository>,
        district_repo: Arc<DistrictRepository>,
        config: Arc<C>,
    ) -> Self {
        Self {
            preacher_repo,
            district_repo,
            config,
        }
    }

    pub fn get_preacher(&self, preacher_id: &str) -> ApiResult<Preacher> {
        load_preacher(&self.preacher_repo, preacher_id)
    }

    /// 记录新的评价平均分并重算综合评分
    ///
    /// # 参数
    /// - average: 评价平均分 (0-5)
    pub async fn record_evaluation(&self, preacher_id: &str, average: f64) -> ApiResult<Preacher> {
        if !average.is_finite() || !(0.0..=MAX_SUB_SCORE).contains(&average) {
            return Err(ApiError::InvalidInput(format!(
                "评价平均分必须在 0-5 之间: {}",
                average
            )));
        }

        let mut preacher = load_preacher(&self.preacher_repo, preacher_id)?;
        preacher.evaluation_score = average;
        self.recompute_and_save(&mut preacher).await?;
        Ok(preacher)
    }

    /// 更新出勤统计并重算综合评分
    ///
    /// 出勤率 = completed / total * 100 (total 为 0 时记 100)
    pub async fn update_attendance(
        &self,
        preacher_id: &str,
        completed: i64,
        missed: i64,
        total: i64,
    ) -> ApiResult<Preacher> {
        if completed < 0 || missed < 0 || total < 0 || completed + missed > total {
            return Err(ApiError::InvalidInput(format!(
                "出勤统计无效: completed={}, missed={}, total={}",
                completed, missed, total
            )));
        }

        let mut preacher = load_preacher(&self.preacher_repo, preacher_id)?;
        preacher.completed_assignments = completed;
        preacher.missed_assignments = missed;
        preacher.total_assignments = total;
        preacher.frequency_rate = if total == 0 {
            100.0
        } else {
            completed as f64 / total as f64 * 100.0
        };
        self.recompute_and_save(&mut preacher).await?;
        Ok(preacher)
    }

    /// 更新守时率 (0-100%) 并重算综合评分
    pub async fn update_punctuality(&self, preacher_id: &str, rate: f64) -> ApiResult<Preacher> {
        if !rate.is_finite() || !(0.0..=100.0).contains(&rate) {
            return Err(ApiError::InvalidInput(format!("守时率必须在 0-100 之间: {}", rate)));
        }

        let mut preacher = load_preacher(&self.preacher_repo, preacher_id)?;
        preacher.punctuality_rate = rate;
        self.recompute_and_save(&mut preacher).await?;
        Ok(preacher)
    }

    /// 记录一次拒绝讲道 (综合评分下调 15%)
    pub fn record_decline(&self, preacher_id: &str) -> ApiResult<Preacher> {
        apply_decline_penalty(&self.preacher_repo, preacher_id)
    }

    async fn recompute_and_save(&self, preacher: &mut Preacher) -> ApiResult<()> {
        let organization_id = self
            .district_repo
            .find_by_id(&preacher.district_id)?
            .map(|d| d.organization_id);
        let ctx = ConfigContext::for_district(preacher.district_id.clone(), organization_id);
        let weights = self
            .config
            .get_score_weights(&ctx)
            .await
            .map_err(|e| ApiError::Unexpected(format!("配置读取失败: {}", e)))?;

        ScoreEngine::new(weights).recompute(preacher);
        self.preacher_repo.update_scores(preacher)?;

        info!(
            preacher_id = %preacher.preacher_id,
            effective_score = preacher.effective_score,
            "讲道人评分已更新"
        );
        Ok(())
    }
}

fn load_preacher(repo: &PreacherRepository, preacher_id: &str) -> ApiResult<Preacher> {
    if preacher_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("讲道人ID不能为空".to_string()));
    }
    repo.find_by_id(preacher_id)?
        .ok_or_else(|| ApiError::NotFound(format!("Preacher(id={})不存在", preacher_id)))
}

/// 拒绝惩罚: 在当前综合评分上直接下调，不按权重重算
///
/// 只计算不落库；调用方负责写入
pub(crate) fn decline_penalty(repo: &PreacherRepository, preacher_id: &str) -> ApiResult<Preacher> {
    let mut preacher = load_preacher(repo, preacher_id)?;
    ScoreEngine::apply_decline(&mut preacher);
    Ok(preacher)
}

fn apply_decline_penalty(repo: &PreacherRepository, preacher_id: &str) -> ApiResult<Preacher> {
    let preacher = decline_penalty(repo, preacher_id)?;
    repo.update_scores(&preacher)?;

    info!(
        preacher_id = %preacher_id,
        after = preacher.effective_score,
        declined = preacher.declined_assignments,
        "拒绝讲道，综合评分已下调"
    );
    Ok(preacher)
}
