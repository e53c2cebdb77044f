// ==========================================
// 牧场繁育管理系统 - 产奶记录仓储
// ==========================================
// 红线: (cow_id, record_date, shift) 唯一
// 说明: 唯一性由表级 UNIQUE 约束保证, 检查与写入在同一条 INSERT 内完成,
//       不存在“先查后写”的竞态窗口
// ==========================================

use crate::domain::milk::{MilkYieldRecord, NewMilkYield};
use crate::domain::types::{MilkQuality, MilkShift};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const SELECT_COLUMNS: &str = r#"
    SELECT record_id, cow_id, record_date, shift, amount_liters, quality,
           fat_percent, snf_percent, notes, created_at
    FROM milk_yield
"#;

// ==========================================
// MilkYieldRepository - 产奶记录仓储
// ==========================================
pub struct MilkYieldRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MilkYieldRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入产奶记录
    ///
    /// # 错误
    /// - `RepositoryError::DuplicateRecord`: 同一牛只同日同班次已有记录, 原记录不变
    pub fn insert(&self, cow_id: &str, record: &NewMilkYield) -> RepositoryResult<MilkYieldRecord> {
        let conn = self.get_conn()?;

        let record_id = Uuid::new_v4().to_string();
        let created_at = Utc::now().naive_utc().trunc_subsecs(6);

        let result = conn.execute(
            r#"
            INSERT INTO milk_yield (
                record_id, cow_id, record_date, shift, amount_liters, quality,
                fat_percent, snf_percent, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                record_id,
                cow_id,
                record.record_date.format("%Y-%m-%d").to_string(),
                record.shift.as_str(),
                record.amount_liters,
                record.quality.map(|q| q.as_str()),
                record.fat_percent,
                record.snf_percent,
                record.notes,
                created_at.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            ],
        );

        if let Err(e) = result {
            return Err(match RepositoryError::from(e) {
                RepositoryError::UniqueConstraintViolation(_) => RepositoryError::DuplicateRecord {
                    entity: "MilkYieldRecord".to_string(),
                    key: format!(
                        "{}/{}/{}",
                        cow_id,
                        record.record_date.format("%Y-%m-%d"),
                        record.shift
                    ),
                },
                other => other,
            });
        }

        Ok(MilkYieldRecord {
            record_id,
            cow_id: cow_id.to_string(),
            record_date: record.record_date,
            shift: record.shift,
            amount_liters: record.amount_liters,
            quality: record.quality,
            fat_percent: record.fat_percent,
            snf_percent: record.snf_percent,
            notes: record.notes.clone(),
            created_at,
        })
    }

    /// 按唯一键查询
    pub fn find_by_key(
        &self,
        cow_id: &str,
        record_date: NaiveDate,
        shift: MilkShift,
    ) -> RepositoryResult<Option<MilkYieldRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE cow_id = ?1 AND record_date = ?2 AND shift = ?3",
            SELECT_COLUMNS
        );
        let record = conn
            .query_row(
                &sql,
                params![cow_id, record_date.format("%Y-%m-%d").to_string(), shift.as_str()],
                map_record_row,
            )
            .optional()?;
        Ok(record)
    }

    /// 查询某头牛的全部产奶记录（日期升序, 同日早班在前）
    pub fn list_by_cow(&self, cow_id: &str) -> RepositoryResult<Vec<MilkYieldRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE cow_id = ?1 ORDER BY record_date ASC, shift DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![cow_id], map_record_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// 查询某头牛在日期区间内的产奶记录（闭区间）
    pub fn list_between(
        &self,
        cow_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<MilkYieldRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE cow_id = ?1 AND record_date >= ?2 AND record_date <= ?3
             ORDER BY record_date ASC, shift DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(
                params![
                    cow_id,
                    from.format("%Y-%m-%d").to_string(),
                    to.format("%Y-%m-%d").to_string()
                ],
                map_record_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

fn map_record_row(row: &Row) -> rusqlite::Result<MilkYieldRecord> {
    let shift_raw: String = row.get(3)?;
    let shift = MilkShift::parse(&shift_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("未知的班次: {}", shift_raw).into(),
        )
    })?;
    let quality_raw: Option<String> = row.get(5)?;

    Ok(MilkYieldRecord {
        record_id: row.get(0)?,
        cow_id: row.get(1)?,
        record_date: row.get(2)?,
        shift,
        amount_liters: row.get(4)?,
        quality: quality_raw.as_deref().and_then(MilkQuality::parse),
        fat_percent: row.get(6)?,
        snf_percent: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
    })
}
