// ==========================================
// 牧场繁育管理系统 - 挤奶状态判定
// ==========================================
// 职责: 按需从产奶记录计算“今日/本班次是否已挤奶”, 不缓存快照
//
// 口径（唯一）:
// - 某日已挤奶 ⇔ 该日所有班次产量之和 > 0
// - “最近一条记录”(日期降序, 同日晚班优先) 只用于展示最近挤奶的班次,
//   不参与是否已挤奶的判定
// ==========================================

use crate::domain::milk::MilkYieldRecord;
use crate::domain::types::MilkShift;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

// ==========================================
// 近日产量
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DailyYieldSource {
    Today,     // 今日有记录
    Yesterday, // 今日无记录, 回退昨日
    NoRecord,  // 今昨两日均无记录
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyYield {
    pub date: Option<NaiveDate>,
    pub total_liters: f64,
    pub source: DailyYieldSource,
}

// ==========================================
// 挤奶状态
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilkingStatus {
    pub cow_id: String,
    pub as_of: NaiveDateTime,
    pub milked: bool,                 // 今日是否已挤奶 (日合计 > 0)
    pub shift: Option<MilkShift>,     // 今日最近一次有产量的班次
    pub current_shift: MilkShift,     // 参考时刻所在班次
    pub milked_this_shift: bool,      // 当前班次是否已有产量
    pub today_total_liters: f64,
    pub message: String,
}

/// 按日期汇总产量
pub fn daily_totals(records: &[MilkYieldRecord]) -> BTreeMap<NaiveDate, f64> {
    let mut totals = BTreeMap::new();
    for record in records {
        *totals.entry(record.record_date).or_insert(0.0) += record.amount_liters;
    }
    totals
}

/// 近日产量: 今日有记录取今日合计, 否则取昨日合计, 否则为 0
pub fn recent_daily_total(records: &[MilkYieldRecord], today: NaiveDate) -> DailyYield {
    let totals = daily_totals(records);

    if let Some(total) = totals.get(&today) {
        return DailyYield {
            date: Some(today),
            total_liters: *total,
            source: DailyYieldSource::Today,
        };
    }

    if let Some(yesterday) = today.pred_opt() {
        if let Some(total) = totals.get(&yesterday) {
            return DailyYield {
                date: Some(yesterday),
                total_liters: *total,
                source: DailyYieldSource::Yesterday,
            };
        }
    }

    DailyYield {
        date: None,
        total_liters: 0.0,
        source: DailyYieldSource::NoRecord,
    }
}

/// 最近一条记录: 日期降序, 同日晚班排在早班之前
pub fn latest_record(records: &[MilkYieldRecord]) -> Option<&MilkYieldRecord> {
    records.iter().max_by(|a, b| recency_cmp(a, b))
}

fn recency_cmp(a: &MilkYieldRecord, b: &MilkYieldRecord) -> Ordering {
    a.record_date
        .cmp(&b.record_date)
        .then(a.shift.cmp(&b.shift))
}

/// 参考时刻所在班次
pub fn shift_at(time: NaiveTime, evening_start_hour: u32) -> MilkShift {
    if time.hour() >= evening_start_hour {
        MilkShift::Evening
    } else {
        MilkShift::Morning
    }
}

// ==========================================
// MilkingStatusResolver
// ==========================================
pub struct MilkingStatusResolver {
    evening_start_hour: u32,
}

impl MilkingStatusResolver {
    pub fn new(evening_start_hour: u32) -> Self {
        Self { evening_start_hour }
    }

    /// 计算某头牛在参考时刻的挤奶状态
    ///
    /// # 参数
    /// - records: 该牛的产奶记录（顺序不限, 只需包含参考日当天）
    /// - as_of: 参考时刻
    pub fn resolve(&self, cow_id: &str, records: &[MilkYieldRecord], as_of: NaiveDateTime) -> MilkingStatus {
        let today = as_of.date();
        let current_shift = shift_at(as_of.time(), self.evening_start_hour);

        let todays: Vec<&MilkYieldRecord> =
            records.iter().filter(|r| r.record_date == today).collect();
        let today_total_liters: f64 = todays.iter().map(|r| r.amount_liters).sum();
        let milked = today_total_liters > 0.0;

        let shift = todays
            .iter()
            .filter(|r| r.amount_liters > 0.0)
            .map(|r| r.shift)
            .max();
        let milked_this_shift = todays
            .iter()
            .any(|r| r.shift == current_shift && r.amount_liters > 0.0);

        let message = match (milked, shift) {
            (true, Some(last)) if milked_this_shift || last == current_shift => format!(
                "今日已挤奶 {:.1} 升（最近班次: {}）",
                today_total_liters,
                last.label_cn()
            ),
            (true, Some(last)) => format!(
                "今日已挤奶 {:.1} 升（最近班次: {}），{}尚未挤奶",
                today_total_liters,
                last.label_cn(),
                current_shift.label_cn()
            ),
            _ if !todays.is_empty() => "今日记录产量为 0，视为未挤奶".to_string(),
            _ => "今日尚未挤奶".to_string(),
        };

        MilkingStatus {
            cow_id: cow_id.to_string(),
            as_of,
            milked,
            shift,
            current_shift,
            milked_this_shift,
            today_total_liters,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn rec(day: u32, shift: MilkShift, amount: f64) -> MilkYieldRecord {
        MilkYieldRecord {
            record_id: format!("{}-{}", day, shift),
            cow_id: "C1".to_string(),
            record_date: d(day),
            shift,
            amount_liters: amount,
            quality: None,
            fat_percent: None,
            snf_percent: None,
            notes: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        d(day).and_hms_opt(hour, 0, 0).unwrap()
    }

    #[test]
    fn test_two_shifts_sum_and_evening_wins_tie_break() {
        let records = vec![rec(10, MilkShift::Morning, 10.0), rec(10, MilkShift::Evening, 12.0)];

        let total = recent_daily_total(&records, d(10));
        assert_eq!(total.total_liters, 22.0);
        assert_eq!(total.source, DailyYieldSource::Today);

        let latest = latest_record(&records).unwrap();
        assert_eq!(latest.shift, MilkShift::Evening);
        assert_eq!(latest.amount_liters, 12.0);
    }

    #[test]
    fn test_recent_total_falls_back_to_yesterday_then_zero() {
        let records = vec![rec(9, MilkShift::Morning, 8.0), rec(9, MilkShift::Evening, 7.5)];

        let fallback = recent_daily_total(&records, d(10));
        assert_eq!(fallback.source, DailyYieldSource::Yesterday);
        assert_eq!(fallback.date, Some(d(9)));
        assert_eq!(fallback.total_liters, 15.5);

        let none = recent_daily_total(&records, d(12));
        assert_eq!(none.source, DailyYieldSource::NoRecord);
        assert_eq!(none.total_liters, 0.0);
    }

    #[test]
    fn test_zero_evening_does_not_hide_positive_morning() {
        // 晚班 0 产量在“最近记录”排序中胜出, 但不影响已挤奶判定
        let records = vec![rec(10, MilkShift::Morning, 9.0), rec(10, MilkShift::Evening, 0.0)];

        assert_eq!(latest_record(&records).unwrap().shift, MilkShift::Evening);

        let status = MilkingStatusResolver::new(12).resolve("C1", &records, at(10, 20));
        assert!(status.milked);
        assert_eq!(status.shift, Some(MilkShift::Morning));
        assert_eq!(status.current_shift, MilkShift::Evening);
        assert!(!status.milked_this_shift);
        assert_eq!(status.today_total_liters, 9.0);
        assert!(status.message.contains("晚班尚未挤奶"));
    }

    #[test]
    fn test_only_zero_records_today_is_not_milked() {
        let records = vec![rec(10, MilkShift::Morning, 0.0)];
        let status = MilkingStatusResolver::new(12).resolve("C1", &records, at(10, 8));
        assert!(!status.milked);
        assert_eq!(status.shift, None);
        assert_eq!(status.message, "今日记录产量为 0，视为未挤奶");
    }

    #[test]
    fn test_yesterday_records_do_not_count_as_today() {
        let records = vec![rec(9, MilkShift::Evening, 12.0)];
        let status = MilkingStatusResolver::new(12).resolve("C1", &records, at(10, 7));
        assert!(!status.milked);
        assert_eq!(status.current_shift, MilkShift::Morning);
        assert_eq!(status.message, "今日尚未挤奶");
    }

    #[test]
    fn test_shift_boundary() {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let before = NaiveTime::from_hms_opt(11, 59, 59).unwrap();
        assert_eq!(shift_at(noon, 12), MilkShift::Evening);
        assert_eq!(shift_at(before, 12), MilkShift::Morning);
    }

    #[test]
    fn test_daily_totals_groups_by_date() {
        let records = vec![
            rec(1, MilkShift::Morning, 5.0),
            rec(2, MilkShift::Morning, 6.0),
            rec(1, MilkShift::Evening, 4.0),
        ];
        let totals = daily_totals(&records);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&d(1)], 9.0);
        assert_eq!(totals[&d(2)], 6.0);
    }
}
