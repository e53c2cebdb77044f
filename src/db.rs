// ==========================================
// 牧场繁育管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表幂等, 并在建唯一索引前修复历史遗留的重复快照
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
///
/// 说明：
/// - repro_status 的“每头牛一行”由唯一索引保证；
/// - 旧库可能没有该索引且已存在重复行，建索引前先做一次修复。
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS cow (
            cow_id TEXT PRIMARY KEY,
            ear_tag TEXT NOT NULL UNIQUE,
            name TEXT,
            breed TEXT,
            birth_date TEXT,
            owner_id TEXT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS breeding_event (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT NOT NULL UNIQUE,
            cow_id TEXT NOT NULL REFERENCES cow(cow_id),
            event_date TEXT NOT NULL,
            event_type TEXT NOT NULL,
            result TEXT NOT NULL,
            details TEXT,
            notes TEXT,
            performed_by TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_breeding_event_cow_date
            ON breeding_event(cow_id, event_date, seq);

        CREATE TABLE IF NOT EXISTS repro_status (
            cow_id TEXT NOT NULL REFERENCES cow(cow_id),
            status TEXT NOT NULL,
            last_heat_date TEXT,
            next_heat_date TEXT,
            last_insemination_date TEXT,
            last_calving_date TEXT,
            calving_count INTEGER NOT NULL DEFAULT 0 CHECK (calving_count >= 0),
            expected_calving_date TEXT,
            breeding_plan TEXT,
            revision INTEGER NOT NULL DEFAULT 1,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS milk_yield (
            record_id TEXT PRIMARY KEY,
            cow_id TEXT NOT NULL REFERENCES cow(cow_id),
            record_date TEXT NOT NULL,
            shift TEXT NOT NULL CHECK (shift IN ('MORNING', 'EVENING')),
            amount_liters REAL NOT NULL CHECK (amount_liters >= 0),
            quality TEXT,
            fat_percent REAL,
            snf_percent REAL,
            notes TEXT,
            created_at TEXT NOT NULL,
            UNIQUE (cow_id, record_date, shift)
        );

        CREATE INDEX IF NOT EXISTS idx_milk_yield_cow_date
            ON milk_yield(cow_id, record_date);
        "#,
    )?;

    let repaired = reconcile_duplicate_repro_status(conn)?;
    if repaired > 0 {
        tracing::warn!(repaired, "已修复重复的繁育状态快照");
    }

    conn.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS uq_repro_status_cow ON repro_status(cow_id);",
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        params![CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 修复同一头牛存在多行快照的情况
///
/// 规则: 保留 updated_at 最新的一行（相同时取 rowid 最大者），删除其余行
///
/// # 返回
/// - 被删除的行数
pub fn reconcile_duplicate_repro_status(conn: &Connection) -> rusqlite::Result<usize> {
    let duplicated: Vec<(String, i64)> = {
        let mut stmt = conn.prepare(
            "SELECT cow_id, COUNT(*) FROM repro_status GROUP BY cow_id HAVING COUNT(*) > 1",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()?
    };

    let mut removed = 0;
    for (cow_id, count) in duplicated {
        let keep_rowid: i64 = conn.query_row(
            "SELECT rowid FROM repro_status WHERE cow_id = ?1
             ORDER BY updated_at DESC, rowid DESC LIMIT 1",
            params![cow_id],
            |row| row.get(0),
        )?;

        let deleted = conn.execute(
            "DELETE FROM repro_status WHERE cow_id = ?1 AND rowid <> ?2",
            params![cow_id, keep_rowid],
        )?;

        tracing::warn!(
            cow_id = %cow_id,
            found = count,
            deleted,
            "繁育状态快照重复, 保留最近更新的一行"
        );
        removed += deleted;
    }

    Ok(removed)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
