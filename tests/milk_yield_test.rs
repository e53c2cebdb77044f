// ==========================================
// 产奶记录集成测试
// ==========================================
// 测试目标: 唯一性约束、挤奶状态口径、近日产量回退
// ==========================================

mod test_helpers;

use herd_lifecycle::api::ApiError;
use herd_lifecycle::domain::types::MilkShift;
use herd_lifecycle::engine::DailyYieldSource;
use test_helpers::{create_test_state, d, milk_yield, register_cow};

#[test]
fn test_duplicate_shift_record_fails_and_keeps_original() {
    let (_temp_file, state) = create_test_state();
    register_cow(&state, "C001");
    let today = d(2024, 6, 10);

    let original = state
        .milk_api
        .record_milk_yield("C001", milk_yield(today, MilkShift::Morning, 10.0), "milker", today)
        .unwrap();

    let err = state
        .milk_api
        .record_milk_yield("C001", milk_yield(today, MilkShift::Morning, 25.0), "milker", today)
        .unwrap_err();
    assert!(matches!(err, ApiError::DuplicateRecord(_)));

    let stored = state.milk_api.list_milk_yields("C001", today, today).unwrap();
    assert_eq!(stored, vec![original]);
    assert_eq!(stored[0].amount_liters, 10.0);
}

#[test]
fn test_two_shifts_total_and_latest_is_evening() {
    let (_temp_file, state) = create_test_state();
    register_cow(&state, "C001");
    let today = d(2024, 6, 10);

    state
        .milk_api
        .record_milk_yield("C001", milk_yield(today, MilkShift::Evening, 12.0), "milker", today)
        .unwrap();
    state
        .milk_api
        .record_milk_yield("C001", milk_yield(today, MilkShift::Morning, 10.0), "milker", today)
        .unwrap();

    let daily = state.milk_api.get_recent_daily_yield("C001", today).unwrap();
    assert_eq!(daily.total_liters, 22.0);
    assert_eq!(daily.source, DailyYieldSource::Today);

    let latest = state.milk_api.get_latest_milk_yield("C001").unwrap().unwrap();
    assert_eq!(latest.shift, MilkShift::Evening);

    let status = state
        .milk_api
        .get_milking_status("C001", today.and_hms_opt(19, 30, 0).unwrap())
        .unwrap();
    assert!(status.milked);
    assert!(status.milked_this_shift);
    assert_eq!(status.shift, Some(MilkShift::Evening));
    assert_eq!(status.today_total_liters, 22.0);
}

#[test]
fn test_zero_evening_entry_does_not_mask_morning_milking() {
    let (_temp_file, state) = create_test_state();
    register_cow(&state, "C001");
    let today = d(2024, 6, 10);

    state
        .milk_api
        .record_milk_yield("C001", milk_yield(today, MilkShift::Morning, 9.5), "milker", today)
        .unwrap();
    state
        .milk_api
        .record_milk_yield("C001", milk_yield(today, MilkShift::Evening, 0.0), "milker", today)
        .unwrap();

    let status = state
        .milk_api
        .get_milking_status("C001", today.and_hms_opt(20, 0, 0).unwrap())
        .unwrap();
    assert!(status.milked);
    assert!(!status.milked_this_shift);
    assert_eq!(status.shift, Some(MilkShift::Morning));
}

#[test]
fn test_morning_only_status_before_and_after_noon() {
    let (_temp_file, state) = create_test_state();
    register_cow(&state, "C001");
    let today = d(2024, 6, 10);

    let before = state
        .milk_api
        .get_milking_status("C001", today.and_hms_opt(6, 0, 0).unwrap())
        .unwrap();
    assert!(!before.milked);
    assert_eq!(before.shift, None);
    assert_eq!(before.current_shift, MilkShift::Morning);

    state
        .milk_api
        .record_milk_yield("C001", milk_yield(today, MilkShift::Morning, 11.0), "milker", today)
        .unwrap();

    let morning = state
        .milk_api
        .get_milking_status("C001", today.and_hms_opt(9, 0, 0).unwrap())
        .unwrap();
    assert!(morning.milked);
    assert!(morning.milked_this_shift);

    let afternoon = state
        .milk_api
        .get_milking_status("C001", today.and_hms_opt(15, 0, 0).unwrap())
        .unwrap();
    assert!(afternoon.milked);
    assert_eq!(afternoon.current_shift, MilkShift::Evening);
    assert!(!afternoon.milked_this_shift);
}

#[test]
fn test_recent_daily_yield_falls_back_to_yesterday() {
    let (_temp_file, state) = create_test_state();
    register_cow(&state, "C001");
    let yesterday = d(2024, 6, 9);
    let today = d(2024, 6, 10);

    let empty = state.milk_api.get_recent_daily_yield("C001", today).unwrap();
    assert_eq!(empty.source, DailyYieldSource::NoRecord);
    assert_eq!(empty.total_liters, 0.0);

    state
        .milk_api
        .record_milk_yield("C001", milk_yield(yesterday, MilkShift::Morning, 8.0), "milker", today)
        .unwrap();
    state
        .milk_api
        .record_milk_yield("C001", milk_yield(yesterday, MilkShift::Evening, 9.0), "milker", today)
        .unwrap();

    let daily = state.milk_api.get_recent_daily_yield("C001", today).unwrap();
    assert_eq!(daily.source, DailyYieldSource::Yesterday);
    assert_eq!(daily.date, Some(yesterday));
    assert_eq!(daily.total_liters, 17.0);
}

#[test]
fn test_invalid_yield_rejected_before_write() {
    let (_temp_file, state) = create_test_state();
    register_cow(&state, "C001");
    let today = d(2024, 6, 10);

    let negative = state
        .milk_api
        .record_milk_yield("C001", milk_yield(today, MilkShift::Morning, -3.0), "milker", today);
    assert!(matches!(negative, Err(ApiError::ValidationError(_))));

    let future = state.milk_api.record_milk_yield(
        "C001",
        milk_yield(d(2024, 6, 11), MilkShift::Morning, 3.0),
        "milker",
        today,
    );
    assert!(matches!(future, Err(ApiError::ValidationError(_))));

    let unknown = state
        .milk_api
        .record_milk_yield("NOPE", milk_yield(today, MilkShift::Morning, 3.0), "milker", today);
    assert!(matches!(unknown, Err(ApiError::NotFound(_))));

    assert!(state.milk_api.list_milk_yields("C001", today, today).unwrap().is_empty());
}
