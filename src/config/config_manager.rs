// ==========================================
// 牧场繁育管理系统 - 配置管理器
// ==========================================
// 职责: 繁育参数加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::herd_config_trait::{HerdConfigReader, ReproductionParams};
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取整数配置; 缺失或格式错误时回落默认值
    fn get_i64_or_default(&self, key: &str, default: i64) -> Result<i64, Box<dyn Error>> {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<i64>() {
            Ok(v) if v >= 0 => Ok(v),
            _ => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default,
                    "配置值格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 写入 global scope 配置（UPSERT）
    ///
    /// # 校验
    /// - 已知数值键必须为非负整数, 周期类键必须大于 0
    /// - evening_shift_start_hour 取值 1..=23
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        validate_config_value(key, value)?;

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value.trim()],
        )?;

        tracing::info!(config_key = key, value = value.trim(), "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    ///
    /// 用于排查派生结果时记录当时生效的参数
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// HerdConfigReader Trait 实现
// ==========================================
impl HerdConfigReader for ConfigManager {
    fn reproduction_params(&self) -> Result<ReproductionParams, Box<dyn Error>> {
        let defaults = ReproductionParams::default();

        let evening_hour = self.get_i64_or_default(
            config_keys::EVENING_SHIFT_START_HOUR,
            defaults.evening_shift_start_hour as i64,
        )?;

        Ok(ReproductionParams {
            gestation_days: self
                .get_i64_or_default(config_keys::GESTATION_DAYS, defaults.gestation_days)?,
            heat_cycle_days: self
                .get_i64_or_default(config_keys::HEAT_CYCLE_DAYS, defaults.heat_cycle_days)?,
            fresh_period_days: self
                .get_i64_or_default(config_keys::FRESH_PERIOD_DAYS, defaults.fresh_period_days)?,
            due_soon_window_days: self.get_i64_or_default(
                config_keys::DUE_SOON_WINDOW_DAYS,
                defaults.due_soon_window_days,
            )?,
            max_future_event_days: self.get_i64_or_default(
                config_keys::MAX_FUTURE_EVENT_DAYS,
                defaults.max_future_event_days,
            )?,
            evening_shift_start_hour: u32::try_from(evening_hour)
                .ok()
                .filter(|h| (1..=23).contains(h))
                .unwrap_or(defaults.evening_shift_start_hour),
        })
    }
}

fn validate_config_value(key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let must_be_positive = matches!(
        key,
        config_keys::GESTATION_DAYS | config_keys::HEAT_CYCLE_DAYS | config_keys::FRESH_PERIOD_DAYS
    );
    let is_numeric = must_be_positive
        || matches!(
            key,
            config_keys::DUE_SOON_WINDOW_DAYS
                | config_keys::MAX_FUTURE_EVENT_DAYS
                | config_keys::EVENING_SHIFT_START_HOUR
        );

    if !is_numeric {
        return Ok(());
    }

    let parsed: i64 = value
        .trim()
        .parse()
        .map_err(|_| format!("配置 {} 必须为整数: {}", key, value))?;

    if parsed < 0 || (must_be_positive && parsed == 0) {
        return Err(format!("配置 {} 取值非法: {}", key, parsed).into());
    }
    if key == config_keys::EVENING_SHIFT_START_HOUR && !(1..=23).contains(&parsed) {
        return Err(format!("晚班起始小时必须在 1..=23 之间: {}", parsed).into());
    }
    Ok(())
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 繁育周期
    pub const GESTATION_DAYS: &str = "gestation_days";
    pub const HEAT_CYCLE_DAYS: &str = "heat_cycle_days";
    pub const FRESH_PERIOD_DAYS: &str = "fresh_period_days";

    // 预产提醒
    pub const DUE_SOON_WINDOW_DAYS: &str = "due_soon_window_days";

    // 事件校验
    pub const MAX_FUTURE_EVENT_DAYS: &str = "max_future_event_days";

    // 挤奶班次
    pub const EVENING_SHIFT_START_HOUR: &str = "evening_shift_start_hour";
}
