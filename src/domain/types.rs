// ==========================================
// 牧场繁育管理系统 - 领域类型定义
// ==========================================
// 职责: 繁育事件类型/结果、繁育状态、挤奶班次等枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 繁育事件类型 (Breeding Event Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreedingEventType {
    HeatDetection,  // 发情检测
    Insemination,   // 配种
    PregnancyCheck, // 妊检
    Calving,        // 产犊
    Other,          // 其他
}

impl BreedingEventType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            BreedingEventType::HeatDetection => "HEAT_DETECTION",
            BreedingEventType::Insemination => "INSEMINATION",
            BreedingEventType::PregnancyCheck => "PREGNANCY_CHECK",
            BreedingEventType::Calving => "CALVING",
            BreedingEventType::Other => "OTHER",
        }
    }

    /// 从字符串解析（大小写、分隔符不敏感）
    ///
    /// 未知类型返回 None，由调用方转换为校验错误
    pub fn parse(s: &str) -> Option<Self> {
        match normalize_token(s).as_str() {
            "HEAT_DETECTION" | "HEATDETECTION" | "HEAT" => Some(BreedingEventType::HeatDetection),
            "INSEMINATION" => Some(BreedingEventType::Insemination),
            "PREGNANCY_CHECK" | "PREGNANCYCHECK" => Some(BreedingEventType::PregnancyCheck),
            "CALVING" => Some(BreedingEventType::Calving),
            "OTHER" => Some(BreedingEventType::Other),
            _ => None,
        }
    }

    /// 该事件类型允许的结果集合
    pub fn valid_results(&self) -> &'static [EventResult] {
        match self {
            BreedingEventType::HeatDetection => &[EventResult::Confirmed, EventResult::Suspected],
            BreedingEventType::Insemination => &[EventResult::Completed, EventResult::Failed],
            BreedingEventType::PregnancyCheck => &[
                EventResult::Positive,
                EventResult::Negative,
                EventResult::Inconclusive,
            ],
            BreedingEventType::Calving => &[
                EventResult::Healthy,
                EventResult::Complications,
                EventResult::Stillborn,
            ],
            BreedingEventType::Other => &[EventResult::Recorded],
        }
    }

    pub fn accepts(&self, result: EventResult) -> bool {
        self.valid_results().contains(&result)
    }
}

impl fmt::Display for BreedingEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 繁育事件结果 (Event Result)
// ==========================================
// 合法取值取决于事件类型, 见 BreedingEventType::valid_results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventResult {
    // 发情检测
    Confirmed,
    Suspected,
    // 配种
    Completed,
    Failed,
    // 妊检
    Positive,
    Negative,
    Inconclusive,
    // 产犊
    Healthy,
    Complications,
    Stillborn,
    // 其他
    Recorded,
}

impl EventResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventResult::Confirmed => "CONFIRMED",
            EventResult::Suspected => "SUSPECTED",
            EventResult::Completed => "COMPLETED",
            EventResult::Failed => "FAILED",
            EventResult::Positive => "POSITIVE",
            EventResult::Negative => "NEGATIVE",
            EventResult::Inconclusive => "INCONCLUSIVE",
            EventResult::Healthy => "HEALTHY",
            EventResult::Complications => "COMPLICATIONS",
            EventResult::Stillborn => "STILLBORN",
            EventResult::Recorded => "RECORDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match normalize_token(s).as_str() {
            "CONFIRMED" => Some(EventResult::Confirmed),
            "SUSPECTED" => Some(EventResult::Suspected),
            "COMPLETED" => Some(EventResult::Completed),
            "FAILED" => Some(EventResult::Failed),
            "POSITIVE" => Some(EventResult::Positive),
            "NEGATIVE" => Some(EventResult::Negative),
            "INCONCLUSIVE" => Some(EventResult::Inconclusive),
            "HEALTHY" => Some(EventResult::Healthy),
            "COMPLICATIONS" => Some(EventResult::Complications),
            "STILLBORN" => Some(EventResult::Stillborn),
            "RECORDED" => Some(EventResult::Recorded),
            _ => None,
        }
    }
}

impl fmt::Display for EventResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 繁育状态 (Reproductive Status)
// ==========================================
// 状态机: Open 为初始状态; Fresh 超过产后期自动回落 Open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReproStatus {
    #[default]
    Open,        // 空怀
    InHeat,      // 发情
    Inseminated, // 已配种
    Pregnant,    // 妊娠
    Fresh,       // 产后
}

impl ReproStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReproStatus::Open => "OPEN",
            ReproStatus::InHeat => "IN_HEAT",
            ReproStatus::Inseminated => "INSEMINATED",
            ReproStatus::Pregnant => "PREGNANT",
            ReproStatus::Fresh => "FRESH",
        }
    }

    /// 从数据库字符串解析; 未知值回落为 Open (快照可随时重放重建)
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "IN_HEAT" => ReproStatus::InHeat,
            "INSEMINATED" => ReproStatus::Inseminated,
            "PREGNANT" => ReproStatus::Pregnant,
            "FRESH" => ReproStatus::Fresh,
            _ => ReproStatus::Open,
        }
    }
}

impl fmt::Display for ReproStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 挤奶班次 (Milking Shift)
// ==========================================
// 顺序: Morning < Evening (同日内 Evening 为较晚记录)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilkShift {
    Morning, // 早班
    Evening, // 晚班
}

impl MilkShift {
    pub fn as_str(&self) -> &'static str {
        match self {
            MilkShift::Morning => "MORNING",
            MilkShift::Evening => "EVENING",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match normalize_token(s).as_str() {
            "MORNING" | "AM" => Some(MilkShift::Morning),
            "EVENING" | "PM" => Some(MilkShift::Evening),
            _ => None,
        }
    }

    /// 中文名称 (用于提示消息)
    pub fn label_cn(&self) -> &'static str {
        match self {
            MilkShift::Morning => "早班",
            MilkShift::Evening => "晚班",
        }
    }
}

impl fmt::Display for MilkShift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 奶质等级 (Milk Quality)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilkQuality {
    Good,     // 合格
    Fair,     // 一般
    Poor,     // 较差
    Rejected, // 废弃 (抗生素残留等)
}

impl MilkQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            MilkQuality::Good => "GOOD",
            MilkQuality::Fair => "FAIR",
            MilkQuality::Poor => "POOR",
            MilkQuality::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match normalize_token(s).as_str() {
            "GOOD" => Some(MilkQuality::Good),
            "FAIR" => Some(MilkQuality::Fair),
            "POOR" => Some(MilkQuality::Poor),
            "REJECTED" => Some(MilkQuality::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for MilkQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 统一为大写下划线形式: "Heat Detection" / "heat-detection" → "HEAT_DETECTION"
fn normalize_token(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_parse_is_lenient() {
        assert_eq!(
            BreedingEventType::parse("heat-detection"),
            Some(BreedingEventType::HeatDetection)
        );
        assert_eq!(
            BreedingEventType::parse(" Pregnancy Check "),
            Some(BreedingEventType::PregnancyCheck)
        );
        assert_eq!(BreedingEventType::parse("vaccination"), None);
    }

    #[test]
    fn test_result_membership_per_type() {
        assert!(BreedingEventType::Calving.accepts(EventResult::Complications));
        assert!(!BreedingEventType::Calving.accepts(EventResult::Positive));
        assert!(!BreedingEventType::Other.accepts(EventResult::Confirmed));
    }

    #[test]
    fn test_shift_order() {
        assert!(MilkShift::Evening > MilkShift::Morning);
        assert_eq!(MilkShift::parse("pm"), Some(MilkShift::Evening));
    }

    #[test]
    fn test_repro_status_db_roundtrip_defaults_to_open() {
        assert_eq!(ReproStatus::from_db_str("IN_HEAT"), ReproStatus::InHeat);
        assert_eq!(ReproStatus::from_db_str("garbage"), ReproStatus::Open);
    }
}
