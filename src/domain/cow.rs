// ==========================================
// 牧场繁育管理系统 - 牛只档案领域模型
// ==========================================
// 职责: 牛只登记信息 (繁育/产奶记录的聚合根标识)
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Cow - 牛只档案
// ==========================================
// 对齐: cow 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cow {
    pub cow_id: String,                 // 牛只ID
    pub ear_tag: String,                // 耳标号 (唯一)
    pub name: Option<String>,           // 名称
    pub breed: Option<String>,          // 品种
    pub birth_date: Option<NaiveDate>,  // 出生日期
    pub owner_id: Option<String>,       // 所属牧户 (通知投递对象)
    pub created_at: NaiveDateTime,      // 登记时间
}
