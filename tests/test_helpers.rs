// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的临时数据库、应用状态、测试数据构造
// ==========================================
#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use herd_lifecycle::app::AppState;
use herd_lifecycle::db::{ensure_schema, open_sqlite_connection};
use herd_lifecycle::logging;
use herd_lifecycle::domain::types::{BreedingEventType, EventResult, MilkShift};
use herd_lifecycle::domain::{Cow, NewBreedingEvent, NewMilkYield};
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    logging::init_test();
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("临时路径不是 UTF-8")?.to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建基于临时数据库的 AppState
pub fn create_test_state() -> (NamedTempFile, AppState) {
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let state = AppState::new(db_path).expect("Failed to create AppState");
    (temp_file, state)
}

/// 登记测试牛只（耳标号 = "T-" + cow_id）
pub fn register_cow(state: &AppState, cow_id: &str) {
    state
        .cow_api
        .register_cow(
            Cow {
                cow_id: cow_id.to_string(),
                ear_tag: format!("T-{}", cow_id),
                name: None,
                breed: Some("Holstein".to_string()),
                birth_date: NaiveDate::from_ymd_opt(2020, 3, 1),
                owner_id: Some("owner-1".to_string()),
                created_at: Utc::now().naive_utc(),
            },
            "admin",
        )
        .expect("Failed to register cow");
}

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("invalid test date")
}

pub fn breeding_event(date: NaiveDate, event_type: BreedingEventType, result: EventResult) -> NewBreedingEvent {
    NewBreedingEvent {
        event_date: date,
        event_type,
        result,
        details: None,
        notes: None,
        performed_by: "vet-zhang".to_string(),
    }
}

pub fn milk_yield(date: NaiveDate, shift: MilkShift, amount_liters: f64) -> NewMilkYield {
    NewMilkYield {
        record_date: date,
        shift,
        amount_liters,
        quality: None,
        fat_percent: Some(3.7),
        snf_percent: Some(8.5),
        notes: None,
    }
}
