// ==========================================
// 预产期预测集成测试
// ==========================================
// 测试目标: 事件落库 → 快照 → 预测分组/排序
// ==========================================

mod test_helpers;

use herd_lifecycle::api::ApiError;
use herd_lifecycle::app::AppState;
use chrono::NaiveDate;
use herd_lifecycle::domain::types::{BreedingEventType, EventResult};
use herd_lifecycle::engine::{DeliveryBucket, ForecastAnchor};
use test_helpers::{breeding_event, create_test_state, d, register_cow};

fn today() -> NaiveDate {
    d(2024, 9, 30)
}

fn record(state: &AppState, cow_id: &str, date: NaiveDate, t: BreedingEventType, r: EventResult) {
    state
        .breeding_api
        .append_breeding_event(cow_id, breeding_event(date, t, r), today())
        .unwrap();
}

/// 构造一个包含各类状态的小牧群
fn seed_herd(state: &AppState) {
    for cow in ["C001", "C002", "C003", "C004", "C005", "C006"] {
        register_cow(state, cow);
    }

    // 已过预产期
    record(state, "C001", d(2023, 11, 1), BreedingEventType::Insemination, EventResult::Completed);
    record(state, "C001", d(2023, 12, 1), BreedingEventType::PregnancyCheck, EventResult::Positive);

    // 临产
    record(state, "C002", d(2023, 11, 20), BreedingEventType::Insemination, EventResult::Completed);
    record(state, "C002", d(2024, 1, 1), BreedingEventType::PregnancyCheck, EventResult::Positive);

    // 已配种未妊检
    record(state, "C003", d(2024, 3, 1), BreedingEventType::Insemination, EventResult::Completed);

    // 只有发情记录
    record(state, "C004", d(2024, 9, 20), BreedingEventType::HeatDetection, EventResult::Confirmed);

    // 妊检阴性
    record(state, "C005", d(2024, 6, 1), BreedingEventType::Insemination, EventResult::Completed);
    record(state, "C005", d(2024, 7, 10), BreedingEventType::PregnancyCheck, EventResult::Negative);

    // 复配后妊检阳性, 以妊检日推算
    record(state, "C006", d(2023, 12, 1), BreedingEventType::Insemination, EventResult::Completed);
    record(state, "C006", d(2023, 12, 22), BreedingEventType::Insemination, EventResult::Completed);
    record(state, "C006", d(2024, 2, 1), BreedingEventType::PregnancyCheck, EventResult::Positive);
}

#[test]
fn test_forecast_buckets_and_ordering_with_default_window() {
    let (_temp_file, state) = create_test_state();
    seed_herd(&state);

    let forecasts = state.forecast_api.forecast_deliveries(None, today()).unwrap();

    let cows: Vec<&str> = forecasts.iter().map(|f| f.cow_id.as_str()).collect();
    assert_eq!(cows, vec!["C001", "C002", "C006", "C003"]);

    let c001 = &forecasts[0];
    assert_eq!(c001.expected_date, d(2024, 9, 6));
    assert_eq!(c001.days_until, -24);
    assert_eq!(c001.bucket, DeliveryBucket::Overdue);

    let c002 = &forecasts[1];
    assert_eq!(c002.expected_date, d(2024, 10, 7));
    assert_eq!(c002.days_until, 7);
    assert_eq!(c002.bucket, DeliveryBucket::DueSoon);
    assert_eq!(c002.anchor, ForecastAnchor::PregnancyCheck);
    assert_eq!(c002.anchor_date, d(2024, 1, 1));

    let c006 = &forecasts[2];
    assert_eq!(c006.anchor, ForecastAnchor::PregnancyCheck);
    assert_eq!(c006.anchor_date, d(2024, 2, 1));
    assert_eq!(c006.expected_date, d(2024, 11, 7));
    assert_eq!(c006.days_until, 38);
    assert_eq!(c006.bucket, DeliveryBucket::Upcoming);

    let c003 = &forecasts[3];
    assert_eq!(c003.anchor, ForecastAnchor::Insemination);
    assert_eq!(c003.anchor_date, d(2024, 3, 1));
    assert_eq!(c003.expected_date, d(2024, 12, 6));
    assert_eq!(c003.days_until, 67);
    assert_eq!(c003.bucket, DeliveryBucket::Upcoming);
}

#[test]
fn test_explicit_window_changes_buckets() {
    let (_temp_file, state) = create_test_state();
    seed_herd(&state);

    let narrow = state.forecast_api.forecast_deliveries(Some(0), today()).unwrap();
    let c002 = narrow.iter().find(|f| f.cow_id == "C002").unwrap();
    assert_eq!(c002.bucket, DeliveryBucket::Upcoming);

    let exact = state.forecast_api.forecast_deliveries(Some(7), today()).unwrap();
    let c002 = exact.iter().find(|f| f.cow_id == "C002").unwrap();
    assert_eq!(c002.bucket, DeliveryBucket::DueSoon);

    let wide = state.forecast_api.forecast_deliveries(Some(40), today()).unwrap();
    let c006 = wide.iter().find(|f| f.cow_id == "C006").unwrap();
    assert_eq!(c006.bucket, DeliveryBucket::DueSoon);
}

#[test]
fn test_negative_window_is_rejected() {
    let (_temp_file, state) = create_test_state();

    let err = state
        .forecast_api
        .forecast_deliveries(Some(-1), today())
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));
}

#[test]
fn test_empty_herd_yields_empty_forecast() {
    let (_temp_file, state) = create_test_state();
    register_cow(&state, "C001");

    assert!(state
        .forecast_api
        .forecast_deliveries(None, today())
        .unwrap()
        .is_empty());
}

#[test]
fn test_calving_removes_cow_from_forecast() {
    let (_temp_file, state) = create_test_state();
    register_cow(&state, "C001");

    record(&state, "C001", d(2023, 11, 1), BreedingEventType::Insemination, EventResult::Completed);
    record(&state, "C001", d(2023, 12, 15), BreedingEventType::PregnancyCheck, EventResult::Positive);
    assert_eq!(
        state.forecast_api.forecast_deliveries(None, today()).unwrap().len(),
        1
    );

    record(&state, "C001", d(2024, 8, 8), BreedingEventType::Calving, EventResult::Healthy);
    assert!(state
        .forecast_api
        .forecast_deliveries(None, today())
        .unwrap()
        .is_empty());
}

#[test]
fn test_positive_check_projects_from_check_date() {
    let (_temp_file, state) = create_test_state();
    register_cow(&state, "C001");

    record(&state, "C001", d(2024, 1, 1), BreedingEventType::Insemination, EventResult::Completed);
    record(&state, "C001", d(2024, 2, 5), BreedingEventType::PregnancyCheck, EventResult::Positive);

    let forecasts = state.forecast_api.forecast_deliveries(None, today()).unwrap();
    assert_eq!(forecasts.len(), 1);
    assert_eq!(forecasts[0].anchor, ForecastAnchor::PregnancyCheck);
    assert_eq!(forecasts[0].anchor_date, d(2024, 2, 5));
    assert_eq!(forecasts[0].expected_date, d(2024, 11, 11));
}
