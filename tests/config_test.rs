// ==========================================
// 配置管理集成测试
// ==========================================
// 测试目标: ConfigManager 的默认值、作用域优先级、异常值回退
// 优先级: church > district > organization > global > 内置默认
// ==========================================


use preaching_schedule::config::{
    config_keys, ConfigContext, ConfigManager, ConfigScope, ScheduleConfigReader,
    DEFAULT_FORCED_FILL_MAX_EXTRA, DEFAULT_MONTHLY_CAP,
};
use preaching_schedule::domain::ScoreWeights;
use test_helpers::*;

fn manager(db_path: &str) -> ConfigManager {
    ConfigManager::new(db_path).unwrap()
}

fn ctx() -> ConfigContext {
    ConfigContext::for_district("D1", Some("ORG1".to_string())).with_church("C1")
}

fn district(id: &str) -> ConfigScope {
    ConfigScope::District {
        district_id: id.to_string(),
    }
}

#[tokio::test]
async fn test_defaults_when_nothing_configured() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let config = manager(&db_path);

    assert_eq!(config.get_default_monthly_cap(&ctx()).await.unwrap(), DEFAULT_MONTHLY_CAP);
    assert_eq!(
        config.get_forced_fill_max_extra(&ctx()).await.unwrap(),
        DEFAULT_FORCED_FILL_MAX_EXTRA
    );
    assert_eq!(
        config.get_score_weights(&ctx()).await.unwrap(),
        ScoreWeights::default().normalized()
    );
}

#[tokio::test]
async fn test_most_specific_scope_wins() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let config = manager(&db_path);
    let key = config_keys::DEFAULT_MONTHLY_CAP;

    config.set_config_value(&ConfigScope::Global, key, "2").unwrap();
    assert_eq!(config.get_default_monthly_cap(&ctx()).await.unwrap(), 2);

    config
        .set_config_value(
            &ConfigScope::Organization {
                organization_id: "ORG1".to_string(),
            },
            key,
            "3",
        )
        .unwrap();
    assert_eq!(config.get_default_monthly_cap(&ctx()).await.unwrap(), 3);

    config.set_config_value(&district("D1"), key, "5").unwrap();
    assert_eq!(config.get_default_monthly_cap(&ctx()).await.unwrap(), 5);

    config
        .set_config_value(
            &ConfigScope::Church {
                church_id: "C1".to_string(),
            },
            key,
            "6",
        )
        .unwrap();
    assert_eq!(config.get_default_monthly_cap(&ctx()).await.unwrap(), 6);

    // 不带教会的上下文落到区会
    let district_ctx = ConfigContext::for_district("D1", Some("ORG1".to_string()));
    assert_eq!(config.get_default_monthly_cap(&district_ctx).await.unwrap(), 5);

    // 其他区会只看到联合会级别
    let other = ConfigContext::for_district("D2", Some("ORG1".to_string()));
    assert_eq!(config.get_default_monthly_cap(&other).await.unwrap(), 3);
}

#[tokio::test]
async fn test_resolve_reports_matching_scope_and_removal_falls_back() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let config = manager(&db_path);
    let key = config_keys::FORCED_FILL_MAX_EXTRA;

    config.set_config_value(&ConfigScope::Global, key, "1").unwrap();
    config.set_config_value(&district("D1"), key, "3").unwrap();

    let (scope, value) = config.resolve_config_value(&ctx(), key).unwrap().unwrap();
    assert_eq!(scope, district("D1"));
    assert_eq!(value, "3");

    assert!(config.remove_config_value(&district("D1"), key).unwrap());
    assert!(!config.remove_config_value(&district("D1"), key).unwrap());
    assert_eq!(config.get_forced_fill_max_extra(&ctx()).await.unwrap(), 1);
}

#[tokio::test]
async fn test_set_config_value_overwrites() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let config = manager(&db_path);
    let key = config_keys::DEFAULT_MONTHLY_CAP;

    config.set_config_value(&ConfigScope::Global, key, "2").unwrap();
    config.set_config_value(&ConfigScope::Global, key, "7").unwrap();

    assert_eq!(
        config.get_config_value(&ConfigScope::Global, key).unwrap().as_deref(),
        Some("7")
    );
    assert_eq!(count_rows(&db_path, "config_kv"), 1);
}

#[tokio::test]
async fn test_score_weights_are_normalized() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let config = manager(&db_path);
    config
        .set_config_value(
            &district("D1"),
            config_keys::SCORE_WEIGHTS,
            r#"{"evaluation":2.0,"frequency":1.0,"punctuality":1.0}"#,
        )
        .unwrap();

    let w = config.get_score_weights(&ctx()).await.unwrap();
    assert!((w.evaluation - 0.5).abs() < 1e-9);
    assert!((w.frequency - 0.25).abs() < 1e-9);
    assert!((w.punctuality - 0.25).abs() < 1e-9);
}

#[tokio::test]
async fn test_invalid_values_fall_back_to_defaults() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let config = manager(&db_path);

    config
        .set_config_value(&ConfigScope::Global, config_keys::SCORE_WEIGHTS, "not json")
        .unwrap();
    config
        .set_config_value(&ConfigScope::Global, config_keys::DEFAULT_MONTHLY_CAP, "abc")
        .unwrap();
    assert_eq!(
        config.get_score_weights(&ctx()).await.unwrap(),
        ScoreWeights::default().normalized()
    );
    assert_eq!(config.get_default_monthly_cap(&ctx()).await.unwrap(), DEFAULT_MONTHLY_CAP);

    config
        .set_config_value(
            &ConfigScope::Global,
            config_keys::SCORE_WEIGHTS,
            r#"{"evaluation":-1.0,"frequency":1.0,"punctuality":1.0}"#,
        )
        .unwrap();
    config
        .set_config_value(&ConfigScope::Global, config_keys::DEFAULT_MONTHLY_CAP, "-2")
        .unwrap();
    assert_eq!(
        config.get_score_weights(&ctx()).await.unwrap(),
        ScoreWeights::default().normalized()
    );
    assert_eq!(config.get_default_monthly_cap(&ctx()).await.unwrap(), DEFAULT_MONTHLY_CAP);
}

#[tokio::test]
async fn test_negative_max_extra_disables_forced_fill() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let config = manager(&db_path);
    config
        .set_config_value(&ConfigScope::Global, config_keys::FORCED_FILL_MAX_EXTRA, "-3")
        .unwrap();

    assert_eq!(config.get_forced_fill_max_extra(&ctx()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_config_manager_shares_connection() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = shared_connection(&db_path);
    let config = ConfigManager::from_connection(conn).unwrap();

    config
        .set_config_value(&ConfigScope::Global, config_keys::DEFAULT_MONTHLY_CAP, "9")
        .unwrap();

    let reopened = manager(&db_path);
    assert_eq!(reopened.get_default_monthly_cap(&ctx()).await.unwrap(), 9);
}
