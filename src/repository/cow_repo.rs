// ==========================================
// 牧场繁育管理系统 - 牛只档案仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::cow::Cow;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// CowRepository - 牛只档案仓储
// ==========================================
pub struct CowRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CowRepository {
    /// 创建新的牛只档案仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 登记牛只
    ///
    /// # 错误
    /// - `RepositoryError::DuplicateRecord`: cow_id 或耳标号已存在
    pub fn insert(&self, cow: &Cow) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let result = conn.execute(
            r#"
            INSERT INTO cow (cow_id, ear_tag, name, breed, birth_date, owner_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                cow.cow_id,
                cow.ear_tag,
                cow.name,
                cow.breed,
                cow.birth_date.map(|d| d.format("%Y-%m-%d").to_string()),
                cow.owner_id,
                cow.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) => match RepositoryError::from(e) {
                RepositoryError::UniqueConstraintViolation(_) => {
                    Err(RepositoryError::DuplicateRecord {
                        entity: "Cow".to_string(),
                        key: format!("{}/{}", cow.cow_id, cow.ear_tag),
                    })
                }
                other => Err(other),
            },
        }
    }

    /// 按ID查询牛只
    pub fn find_by_id(&self, cow_id: &str) -> RepositoryResult<Option<Cow>> {
        let conn = self.get_conn()?;

        let cow = conn
            .query_row(
                r#"
                SELECT cow_id, ear_tag, name, breed, birth_date, owner_id, created_at
                FROM cow WHERE cow_id = ?1
                "#,
                params![cow_id],
                map_cow_row,
            )
            .optional()?;

        Ok(cow)
    }

    /// 牛只是否已登记
    pub fn exists(&self, cow_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM cow WHERE cow_id = ?1",
                params![cow_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// 查询全部牛只（按耳标号排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Cow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT cow_id, ear_tag, name, breed, birth_date, owner_id, created_at
            FROM cow ORDER BY ear_tag
            "#,
        )?;

        let cows = stmt
            .query_map([], map_cow_row)?
            .collect::<Result<Vec<Cow>, _>>()?;
        Ok(cows)
    }
}

fn map_cow_row(row: &Row) -> rusqlite::Result<Cow> {
    Ok(Cow {
        cow_id: row.get(0)?,
        ear_tag: row.get(1)?,
        name: row.get(2)?,
        breed: row.get(3)?,
        birth_date: row.get(4)?,
        owner_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn setup_repo() -> CowRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        CowRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn make_cow(cow_id: &str, ear_tag: &str) -> Cow {
        Cow {
            cow_id: cow_id.to_string(),
            ear_tag: ear_tag.to_string(),
            name: Some("Daisy".to_string()),
            breed: Some("Holstein".to_string()),
            birth_date: Some(NaiveDate::from_ymd_opt(2020, 3, 1).unwrap()),
            owner_id: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let repo = setup_repo();
        repo.insert(&make_cow("C1", "T-001")).unwrap();

        let found = repo.find_by_id("C1").unwrap().unwrap();
        assert_eq!(found.ear_tag, "T-001");
        assert_eq!(found.birth_date, NaiveDate::from_ymd_opt(2020, 3, 1));
        assert!(repo.exists("C1").unwrap());
        assert!(!repo.exists("C2").unwrap());
    }

    #[test]
    fn test_duplicate_ear_tag_rejected() {
        let repo = setup_repo();
        repo.insert(&make_cow("C1", "T-001")).unwrap();

        let err = repo.insert(&make_cow("C2", "T-001")).unwrap_err();
        assert!(matches!(err, RepositoryError::DuplicateRecord { .. }));
        assert_eq!(repo.list_all().unwrap().len(), 1);
    }
}
