// ==========================================
// 牧场繁育管理系统 - 繁育事件日志仓储
// ==========================================
// 红线: 只追加, 不提供更新/删除
// 排序: (event_date ASC, seq ASC), seq 为写入序号
// ==========================================

use crate::domain::breeding::{BreedingEvent, NewBreedingEvent};
use crate::domain::types::{BreedingEventType, EventResult};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const SELECT_COLUMNS: &str = r#"
    SELECT seq, event_id, cow_id, event_date, event_type, result,
           details, notes, performed_by, created_at
    FROM breeding_event
"#;

// ==========================================
// BreedingEventRepository - 繁育事件仓储
// ==========================================
pub struct BreedingEventRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BreedingEventRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 追加繁育事件
    ///
    /// 说明: 不做业务校验（由 API 层校验器负责），只负责分配ID与写入序号
    ///
    /// # 返回
    /// - 落库后的事件（含 seq）
    pub fn append(&self, cow_id: &str, event: &NewBreedingEvent) -> RepositoryResult<BreedingEvent> {
        let conn = self.get_conn()?;

        let event_id = Uuid::new_v4().to_string();
        // 落库精度为微秒, 返回值与读回值保持一致
        let created_at = Utc::now().naive_utc().trunc_subsecs(6);

        conn.execute(
            r#"
            INSERT INTO breeding_event (
                event_id, cow_id, event_date, event_type, result,
                details, notes, performed_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                event_id,
                cow_id,
                event.event_date.format("%Y-%m-%d").to_string(),
                event.event_type.as_str(),
                event.result.as_str(),
                event.details,
                event.notes,
                event.performed_by.trim(),
                created_at.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            ],
        )?;

        let seq = conn.last_insert_rowid();

        Ok(BreedingEvent {
            seq,
            event_id,
            cow_id: cow_id.to_string(),
            event_date: event.event_date,
            event_type: event.event_type,
            result: event.result,
            details: event.details.clone(),
            notes: event.notes.clone(),
            performed_by: event.performed_by.trim().to_string(),
            created_at,
        })
    }

    /// 按事件ID查询
    pub fn find_by_id(&self, event_id: &str) -> RepositoryResult<Option<BreedingEvent>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE event_id = ?1", SELECT_COLUMNS);
        let event = conn
            .query_row(&sql, params![event_id], map_event_row)
            .optional()?;
        Ok(event)
    }

    /// 查询某头牛的全部繁育事件（因果顺序）
    pub fn list_by_cow(&self, cow_id: &str) -> RepositoryResult<Vec<BreedingEvent>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE cow_id = ?1 ORDER BY event_date ASC, seq ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let events = stmt
            .query_map(params![cow_id], map_event_row)?
            .collect::<Result<Vec<BreedingEvent>, _>>()?;
        Ok(events)
    }

    /// 查询某头牛在日期区间内的繁育事件（闭区间，因果顺序）
    pub fn list_between(
        &self,
        cow_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<BreedingEvent>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE cow_id = ?1 AND event_date >= ?2 AND event_date <= ?3
             ORDER BY event_date ASC, seq ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let events = stmt
            .query_map(
                params![
                    cow_id,
                    from.format("%Y-%m-%d").to_string(),
                    to.format("%Y-%m-%d").to_string()
                ],
                map_event_row,
            )?
            .collect::<Result<Vec<BreedingEvent>, _>>()?;
        Ok(events)
    }

    /// 某头牛的事件数量
    pub fn count_by_cow(&self, cow_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM breeding_event WHERE cow_id = ?1",
            params![cow_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn map_event_row(row: &Row) -> rusqlite::Result<BreedingEvent> {
    let event_type_raw: String = row.get(4)?;
    let result_raw: String = row.get(5)?;

    let event_type = BreedingEventType::parse(&event_type_raw)
        .ok_or_else(|| invalid_text(4, "event_type", &event_type_raw))?;
    let result =
        EventResult::parse(&result_raw).ok_or_else(|| invalid_text(5, "result", &result_raw))?;

    Ok(BreedingEvent {
        seq: row.get(0)?,
        event_id: row.get(1)?,
        cow_id: row.get(2)?,
        event_date: row.get(3)?,
        event_type,
        result,
        details: row.get(6)?,
        notes: row.get(7)?,
        performed_by: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn invalid_text(idx: usize, field: &str, raw: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("未知的 {} 取值: {}", field, raw).into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cow::Cow;
    use crate::repository::cow_repo::CowRepository;

    fn setup() -> (Arc<Mutex<Connection>>, BreedingEventRepository) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        CowRepository::new(conn.clone())
            .insert(&Cow {
                cow_id: "C1".to_string(),
                ear_tag: "T-001".to_string(),
                name: None,
                breed: None,
                birth_date: None,
                owner_id: None,
                created_at: Utc::now().naive_utc(),
            })
            .unwrap();

        (conn.clone(), BreedingEventRepository::new(conn))
    }

    fn new_event(date: (i32, u32, u32), t: BreedingEventType, r: EventResult) -> NewBreedingEvent {
        NewBreedingEvent {
            event_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            event_type: t,
            result: r,
            details: None,
            notes: None,
            performed_by: "vet".to_string(),
        }
    }

    #[test]
    fn test_list_by_cow_orders_by_date_then_insertion() {
        let (_conn, repo) = setup();

        let late = repo
            .append("C1", &new_event((2024, 3, 1), BreedingEventType::Calving, EventResult::Healthy))
            .unwrap();
        let same_day_first = repo
            .append(
                "C1",
                &new_event((2024, 1, 1), BreedingEventType::HeatDetection, EventResult::Confirmed),
            )
            .unwrap();
        let same_day_second = repo
            .append(
                "C1",
                &new_event((2024, 1, 1), BreedingEventType::Insemination, EventResult::Completed),
            )
            .unwrap();

        let events = repo.list_by_cow("C1").unwrap();
        let ids: Vec<&str> = events.iter().map(|e| e.event_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                same_day_first.event_id.as_str(),
                same_day_second.event_id.as_str(),
                late.event_id.as_str()
            ]
        );
        assert!(same_day_first.seq < same_day_second.seq);
    }

    #[test]
    fn test_append_requires_registered_cow() {
        let (_conn, repo) = setup();
        let err = repo
            .append("NOPE", &new_event((2024, 1, 1), BreedingEventType::Other, EventResult::Recorded))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
    }

    #[test]
    fn test_find_and_list_between() {
        let (_conn, repo) = setup();
        let e = repo
            .append(
                "C1",
                &new_event((2024, 2, 5), BreedingEventType::PregnancyCheck, EventResult::Positive),
            )
            .unwrap();
        repo.append("C1", &new_event((2024, 5, 5), BreedingEventType::Other, EventResult::Recorded))
            .unwrap();

        let found = repo.find_by_id(&e.event_id).unwrap().unwrap();
        assert_eq!(found, e);

        let ranged = repo
            .list_between(
                "C1",
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
            )
            .unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(repo.count_by_cow("C1").unwrap(), 2);
    }
}
