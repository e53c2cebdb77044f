// ==========================================
// 牧场繁育管理系统 - 产奶记录领域模型
// ==========================================
// 红线: (cow_id, date, shift) 唯一, 重复写入必须失败
// 对齐: milk_yield 表
// ==========================================

use crate::domain::types::{MilkQuality, MilkShift};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// MilkYieldRecord - 产奶记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilkYieldRecord {
    pub record_id: String,
    pub cow_id: String,
    pub record_date: NaiveDate,
    pub shift: MilkShift,
    pub amount_liters: f64,            // 产量 (升, >= 0)
    pub quality: Option<MilkQuality>,
    pub fat_percent: Option<f64>,      // 乳脂率
    pub snf_percent: Option<f64>,      // 非脂乳固体
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

// ==========================================
// NewMilkYield - 待写入的产奶记录 (未校验)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMilkYield {
    pub record_date: NaiveDate,
    pub shift: MilkShift,
    pub amount_liters: f64,
    pub quality: Option<MilkQuality>,
    pub fat_percent: Option<f64>,
    pub snf_percent: Option<f64>,
    pub notes: Option<String>,
}
