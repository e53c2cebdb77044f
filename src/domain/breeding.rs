// ==========================================
// 牧场繁育管理系统 - 繁育事件领域模型
// ==========================================
// 红线: 繁育事件只追加, 不修改、不删除
// 对齐: breeding_event 表
// ==========================================

use crate::domain::types::{BreedingEventType, EventResult};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// ==========================================
// BreedingEvent - 已落库的繁育事件
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreedingEvent {
    pub seq: i64,                     // 写入序号 (同日事件的稳定排序依据)
    pub event_id: String,             // 事件ID
    pub cow_id: String,               // 牛只ID
    pub event_date: NaiveDate,        // 事件日期 (无时刻)
    pub event_type: BreedingEventType,
    pub result: EventResult,
    pub details: Option<String>,      // 详情 (公牛/精液批号等)
    pub notes: Option<String>,        // 备注
    pub performed_by: String,         // 操作人
    pub created_at: NaiveDateTime,    // 写入时间
}

impl BreedingEvent {
    /// 因果顺序: 先按日期升序, 同日按写入序号升序
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        self.event_date
            .cmp(&other.event_date)
            .then(self.seq.cmp(&other.seq))
    }
}

// ==========================================
// NewBreedingEvent - 待追加的繁育事件 (未校验)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBreedingEvent {
    pub event_date: NaiveDate,
    pub event_type: BreedingEventType,
    pub result: EventResult,
    pub details: Option<String>,
    pub notes: Option<String>,
    pub performed_by: String,
}
