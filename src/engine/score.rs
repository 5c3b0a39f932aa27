// ==========================================
// 讲道排班系统 - 评分引擎
// ==========================================
// 职责: 综合评分计算、排序、拒绝惩罚
// 公式: effective = w_eval*eval + w_freq*freq + w_punct*punct
// 红线: 生成过程中评分为只读快照，重算仅由外部事件触发
// ==========================================

use crate::domain::{Preacher, ScoreWeights};
use tracing::debug;

/// 子项满分
pub const MAX_SUB_SCORE: f64 = 5.0;

/// 拒绝讲道的综合评分惩罚比例
pub const DECLINE_PENALTY: f64 = 0.15;

// ==========================================
// ScoreEngine - 评分引擎
// ==========================================
pub struct ScoreEngine {
    weights: ScoreWeights,
}

impl ScoreEngine {
    /// 构造函数（权重在此归一化）
    pub fn new(weights: ScoreWeights) -> Self {
        Self {
            weights: weights.normalized(),
        }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// 百分比 (0-100) 换算为 0-5 子项
    pub fn rate_to_score(rate: f64) -> f64 {
        if !rate.is_finite() {
            return 0.0;
        }
        rate.clamp(0.0, 100.0) / 100.0 * MAX_SUB_SCORE
    }

    /// 按当前子项计算综合评分（不修改讲道人）
    pub fn effective_score(&self, preacher: &Preacher) -> f64 {
        let eval = preacher.evaluation_score.clamp(0.0, MAX_SUB_SCORE);
        let freq = preacher.frequency_score.clamp(0.0, MAX_SUB_SCORE);
        let punct = preacher.punctuality_score.clamp(0.0, MAX_SUB_SCORE);

        round2(
            self.weights.evaluation * eval
                + self.weights.frequency * freq
                + self.weights.punctuality * punct,
        )
    }

    /// 重算讲道人的子项与综合评分
    ///
    /// 出勤、守时子项由原始百分比换算
    pub fn recompute(&self, preacher: &mut Preacher) {
        preacher.evaluation_score = round2(preacher.evaluation_score.clamp(0.0, MAX_SUB_SCORE));
        preacher.frequency_score = round2(Self::rate_to_score(preacher.frequency_rate));
        preacher.punctuality_score = round2(Self::rate_to_score(preacher.punctuality_rate));
        preacher.effective_score = self.effective_score(preacher);

        debug!(
            preacher_id = %preacher.preacher_id,
            effective_score = preacher.effective_score,
            "综合评分已重算"
        );
    }

    /// 拒绝讲道：综合评分直接下调 15%，拒绝次数 +1
    pub fn apply_decline(preacher: &mut Preacher) {
        preacher.effective_score = round2(preacher.effective_score * (1.0 - DECLINE_PENALTY));
        preacher.declined_assignments += 1;
    }

    /// 按综合评分快照降序排序（稳定排序，同分保持输入顺序）
    pub fn rank(mut preachers: Vec<Preacher>) -> Vec<Preacher> {
        preachers.sort_by(|a, b| b.effective_score.total_cmp(&a.effective_score));
        preachers
    }
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ApprovalStatus, Role, RoleSet};

    fn preacher(id: &str, eval: f64, freq_rate: f64, punct_rate: f64) -> Preacher {
        Preacher {
            preacher_id: id.to_string(),
            district_id: "D1".to_string(),
            name: id.to_string(),
            roles: RoleSet::of(&[Role::Preacher]),
            approval_status: ApprovalStatus::Approved,
            active: true,
            evaluation_score: eval,
            frequency_score: 0.0,
            punctuality_score: 0.0,
            effective_score: 0.0,
            frequency_rate: freq_rate,
            punctuality_rate: punct_rate,
            total_assignments: 0,
            completed_assignments: 0,
            missed_assignments: 0,
            declined_assignments: 0,
            monthly_cap: None,
        }
    }

    #[test]
    fn test_recompute_with_default_weights() {
        let engine = ScoreEngine::new(ScoreWeights::default());
        let mut p = preacher("P1", 4.0, 100.0, 80.0);
        engine.recompute(&mut p);

        assert_eq!(p.frequency_score, 5.0);
        assert_eq!(p.punctuality_score, 4.0);
        // 0.6*4 + 0.25*5 + 0.15*4 = 2.4 + 1.25 + 0.6
        assert_eq!(p.effective_score, 4.25);
    }

    #[test]
    fn test_weights_are_renormalized() {
        let engine = ScoreEngine::new(ScoreWeights {
            evaluation: 2.0,
            frequency: 0.0,
            punctuality: 0.0,
        });
        let mut p = preacher("P1", 3.5, 0.0, 0.0);
        engine.recompute(&mut p);
        assert_eq!(p.effective_score, 3.5);
    }

    #[test]
    fn test_rate_to_score_clamps() {
        assert_eq!(ScoreEngine::rate_to_score(150.0), 5.0);
        assert_eq!(ScoreEngine::rate_to_score(-10.0), 0.0);
        assert_eq!(ScoreEngine::rate_to_score(f64::NAN), 0.0);
        assert_eq!(ScoreEngine::rate_to_score(50.0), 2.5);
    }

    #[test]
    fn test_decline_penalty() {
        let mut p = preacher("P1", 4.0, 100.0, 100.0);
        p.effective_score = 4.0;
        ScoreEngine::apply_decline(&mut p);
        assert_eq!(p.effective_score, 3.4);
        assert_eq!(p.declined_assignments, 1);
    }

    #[test]
    fn test_rank_is_stable_descending() {
        let mut a = preacher("A", 0.0, 0.0, 0.0);
        let mut b = preacher("B", 0.0, 0.0, 0.0);
        let mut c = preacher("C", 0.0, 0.0, 0.0);
        a.effective_score = 3.0;
        b.effective_score = 4.0;
        c.effective_score = 3.0;

        let ranked: Vec<String> = ScoreEngine::rank(vec![a, b, c])
            .into_iter()
            .map(|p| p.preacher_id)
            .collect();
        assert_eq!(ranked, vec!["B", "A", "C"]);
    }
}
