// ==========================================
// 牧场繁育管理系统 - 繁育状态快照
// ==========================================
// 说明: 快照是繁育事件的派生投影, 可随时由事件日志完整重建
// 对齐: repro_status 表 (每头牛唯一一行)
// ==========================================

use crate::domain::types::ReproStatus;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 预产期在 breeding_plan 中的编码前缀
pub const DUE_DATE_PLAN_PREFIX: &str = "DUE ";

// ==========================================
// ReproState - 重放得到的繁育状态 (纯派生字段)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReproState {
    pub status: ReproStatus,
    pub last_heat_date: Option<NaiveDate>,
    pub next_heat_date: Option<NaiveDate>,
    pub last_insemination_date: Option<NaiveDate>,
    pub last_calving_date: Option<NaiveDate>,
    pub calving_count: u32,
    pub expected_calving_date: Option<NaiveDate>,
    pub breeding_plan: Option<String>,
}

impl ReproState {
    /// 设置预产期, 同时写入 breeding_plan 编码
    pub fn set_expected_calving(&mut self, date: NaiveDate) {
        self.expected_calving_date = Some(date);
        self.breeding_plan = Some(encode_due_date(date));
    }

    pub fn clear_expected_calving(&mut self) {
        self.expected_calving_date = None;
        self.breeding_plan = None;
    }
}

// ==========================================
// ReproStatusSnapshot - 落库快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReproStatusSnapshot {
    pub cow_id: String,
    pub state: ReproState,
    pub revision: i64,              // 乐观锁版本号 (0 表示尚未落库)
    pub updated_at: NaiveDateTime,
}

impl ReproStatusSnapshot {
    pub fn status(&self) -> ReproStatus {
        self.state.status
    }
}

pub fn encode_due_date(date: NaiveDate) -> String {
    format!("{}{}", DUE_DATE_PLAN_PREFIX, date.format("%Y-%m-%d"))
}

/// 从 breeding_plan 解析预产期 (非编码格式返回 None)
pub fn decode_due_date(plan: &str) -> Option<NaiveDate> {
    plan.trim()
        .strip_prefix(DUE_DATE_PLAN_PREFIX)
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
}
