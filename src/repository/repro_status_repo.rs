// ==========================================
// 牧场繁育管理系统 - 繁育状态快照仓储
// ==========================================
// 约束: 每头牛唯一一行 (uq_repro_status_cow)
// 并发控制: revision 乐观锁, 快照整行替换, 不做增量修补
// ==========================================

use crate::domain::repro::{ReproState, ReproStatusSnapshot};
use crate::domain::types::ReproStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDateTime, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT cow_id, status, last_heat_date, next_heat_date, last_insemination_date,
           last_calving_date, calving_count, expected_calving_date, breeding_plan,
           revision, updated_at
    FROM repro_status
"#;

// ==========================================
// ReproStatusRepository - 繁育状态快照仓储
// ==========================================
pub struct ReproStatusRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReproStatusRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询某头牛的快照
    pub fn find_by_cow(&self, cow_id: &str) -> RepositoryResult<Option<ReproStatusSnapshot>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE cow_id = ?1", SELECT_COLUMNS);
        let snapshot = conn
            .query_row(&sql, params![cow_id], map_snapshot_row)
            .optional()?;
        Ok(snapshot)
    }

    /// 按状态查询快照（按 cow_id 排序）
    pub fn list_by_statuses(
        &self,
        statuses: &[ReproStatus],
    ) -> RepositoryResult<Vec<ReproStatusSnapshot>> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let placeholders = (1..=statuses.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "{} WHERE status IN ({}) ORDER BY cow_id",
            SELECT_COLUMNS, placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let values: Vec<&str> = statuses.iter().map(|s| s.as_str()).collect();
        let snapshots = stmt
            .query_map(rusqlite::params_from_iter(values), map_snapshot_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(snapshots)
    }

    /// 写入快照（带乐观锁检查）
    ///
    /// # 规则
    /// - `snapshot.revision == 0`: 首次写入, 插入 revision=1 的新行
    /// - 否则: 仅当库中 revision 等于 `snapshot.revision` 时整行替换, revision+1
    ///
    /// # 错误
    /// - `RepositoryError::OptimisticLockFailure`: 快照已被其他写入者更新
    ///
    /// # 返回
    /// - 落库后的快照（新的 revision 与 updated_at）
    pub fn save(&self, snapshot: &ReproStatusSnapshot) -> RepositoryResult<ReproStatusSnapshot> {
        let conn = self.get_conn()?;
        let updated_at = Utc::now().naive_utc().trunc_subsecs(6);
        let state = &snapshot.state;

        let fields = (
            state.status.as_str(),
            fmt_date(state.last_heat_date),
            fmt_date(state.next_heat_date),
            fmt_date(state.last_insemination_date),
            fmt_date(state.last_calving_date),
            state.calving_count,
            fmt_date(state.expected_calving_date),
            state.breeding_plan.clone(),
        );

        let new_revision = if snapshot.revision == 0 {
            let inserted = conn.execute(
                r#"
                INSERT INTO repro_status (
                    cow_id, status, last_heat_date, next_heat_date, last_insemination_date,
                    last_calving_date, calving_count, expected_calving_date, breeding_plan,
                    revision, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10)
                "#,
                params![
                    snapshot.cow_id,
                    fields.0,
                    fields.1,
                    fields.2,
                    fields.3,
                    fields.4,
                    fields.5,
                    fields.6,
                    fields.7,
                    fmt_ts(updated_at),
                ],
            );

            match inserted.map_err(RepositoryError::from) {
                Ok(_) => 1,
                Err(RepositoryError::UniqueConstraintViolation(_)) => {
                    // 并发首次写入: 另一写入者已建行
                    let actual = current_revision(&conn, &snapshot.cow_id)?.unwrap_or(0);
                    return Err(RepositoryError::OptimisticLockFailure {
                        cow_id: snapshot.cow_id.clone(),
                        expected: 0,
                        actual,
                    });
                }
                Err(e) => return Err(e),
            }
        } else {
            let rows_affected = conn.execute(
                r#"
                UPDATE repro_status
                SET status = ?2, last_heat_date = ?3, next_heat_date = ?4,
                    last_insemination_date = ?5, last_calving_date = ?6, calving_count = ?7,
                    expected_calving_date = ?8, breeding_plan = ?9,
                    revision = revision + 1, updated_at = ?10
                WHERE cow_id = ?1 AND revision = ?11
                "#,
                params![
                    snapshot.cow_id,
                    fields.0,
                    fields.1,
                    fields.2,
                    fields.3,
                    fields.4,
                    fields.5,
                    fields.6,
                    fields.7,
                    fmt_ts(updated_at),
                    snapshot.revision,
                ],
            )?;

            if rows_affected == 0 {
                // 判断是记录不存在还是revision冲突
                return match current_revision(&conn, &snapshot.cow_id)? {
                    Some(actual) => Err(RepositoryError::OptimisticLockFailure {
                        cow_id: snapshot.cow_id.clone(),
                        expected: snapshot.revision,
                        actual,
                    }),
                    None => Err(RepositoryError::NotFound {
                        entity: "ReproStatusSnapshot".to_string(),
                        id: snapshot.cow_id.clone(),
                    }),
                };
            }
            snapshot.revision + 1
        };

        Ok(ReproStatusSnapshot {
            cow_id: snapshot.cow_id.clone(),
            state: snapshot.state.clone(),
            revision: new_revision,
            updated_at,
        })
    }
}

fn current_revision(conn: &Connection, cow_id: &str) -> RepositoryResult<Option<i64>> {
    let revision = conn
        .query_row(
            "SELECT revision FROM repro_status WHERE cow_id = ?1",
            params![cow_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(revision)
}

fn fmt_date(date: Option<chrono::NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn fmt_ts(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn map_snapshot_row(row: &Row) -> rusqlite::Result<ReproStatusSnapshot> {
    let status_raw: String = row.get(1)?;

    Ok(ReproStatusSnapshot {
        cow_id: row.get(0)?,
        state: ReproState {
            status: ReproStatus::from_db_str(&status_raw),
            last_heat_date: row.get(2)?,
            next_heat_date: row.get(3)?,
            last_insemination_date: row.get(4)?,
            last_calving_date: row.get(5)?,
            calving_count: row.get(6)?,
            expected_calving_date: row.get(7)?,
            breeding_plan: row.get(8)?,
        },
        revision: row.get(9)?,
        updated_at: row.get(10)?,
    })
}
