// ==========================================
// PreacherApi 集成测试
// ==========================================
// 测试目标: 评价、出勤、守时、拒绝事件触发的评分重算
// ==========================================


use preaching_schedule::api::{ApiError, PreacherApi};
use preaching_schedule::domain::ScoreWeights;
use std::sync::Arc;
use test_helpers::*;

fn api(seeder: &DistrictSeeder, config: MockConfig) -> PreacherApi<MockConfig> {
    PreacherApi::new(
        seeder.repos.preacher_repo.clone(),
        seeder.repos.district_repo.clone(),
        Arc::new(config),
    )
}

fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.005,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[tokio::test]
async fn test_record_evaluation_recomputes_effective_score() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let seeder = DistrictSeeder::new(&db_path);
    seeder.preacher("P1", 4.0, None);
    let api = api(&seeder, MockConfig::default());

    // 0.6*3 + 0.25*5 + 0.15*5
    let updated = api.record_evaluation("P1", 3.0).await.unwrap();
    approx(updated.effective_score, 3.8);

    let stored = api.get_preacher("P1").unwrap();
    approx(stored.effective_score, 3.8);
    approx(stored.evaluation_score, 3.0);
}

#[tokio::test]
async fn test_update_attendance_derives_frequency_rate() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let seeder = DistrictSeeder::new(&db_path);
    seeder.preacher("P1", 4.0, None);
    let api = api(&seeder, MockConfig::default());

    let updated = api.update_attendance("P1", 4, 1, 5).await.unwrap();
    approx(updated.frequency_rate, 80.0);
    approx(updated.frequency_score, 4.0);
    // 0.6*4 + 0.25*4 + 0.15*5
    approx(updated.effective_score, 4.15);
    assert_eq!(updated.total_assignments, 5);
    assert_eq!(updated.missed_assignments, 1);

    let fresh = api.update_attendance("P1", 0, 0, 0).await.unwrap();
    approx(fresh.frequency_rate, 100.0);
}

#[tokio::test]
async fn test_update_punctuality() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let seeder = DistrictSeeder::new(&db_path);
    seeder.preacher("P1", 4.0, None);
    let api = api(&seeder, MockConfig::default());

    let updated = api.update_punctuality("P1", 60.0).await.unwrap();
    approx(updated.punctuality_score, 3.0);
    // 0.6*4 + 0.25*5 + 0.15*3
    approx(updated.effective_score, 4.1);
}

#[tokio::test]
async fn test_configured_weights_are_used() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let seeder = DistrictSeeder::new(&db_path);
    seeder.preacher("P1", 4.0, None);
    let config = MockConfig {
        weights: ScoreWeights {
            evaluation: 1.0,
            frequency: 0.0,
            punctuality: 0.0,
        },
        ..MockConfig::default()
    };
    let api = api(&seeder, config);

    let updated = api.record_evaluation("P1", 2.5).await.unwrap();
    approx(updated.effective_score, 2.5);
}

#[tokio::test]
async fn test_record_decline_applies_penalty_on_current_score() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let seeder = DistrictSeeder::new(&db_path);
    seeder.preacher("P1", 4.0, None);
    let api = api(&seeder, MockConfig::default());

    let once = api.record_decline("P1").unwrap();
    approx(once.effective_score, 3.4);
    assert_eq!(once.declined_assignments, 1);

    let twice = api.record_decline("P1").unwrap();
    approx(twice.effective_score, 2.89);
    assert_eq!(twice.declined_assignments, 2);
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let seeder = DistrictSeeder::new(&db_path);
    seeder.preacher("P1", 4.0, None);
    let api = api(&seeder, MockConfig::default());

    assert!(matches!(
        api.record_evaluation("P1", 5.5).await,
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.record_evaluation("P1", f64::NAN).await,
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.update_attendance("P1", 3, 3, 5).await,
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.update_punctuality("P1", 120.0).await,
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(api.get_preacher(""), Err(ApiError::InvalidInput(_))));
    assert!(matches!(api.get_preacher("NOPE"), Err(ApiError::NotFound(_))));
    assert!(matches!(api.record_decline("NOPE"), Err(ApiError::NotFound(_))));

    // 失败的请求不改变评分
    approx(api.get_preacher("P1").unwrap().effective_score, 4.0);
}
