// ==========================================
// 牧场繁育管理系统 - 输入校验器
// ==========================================
// 职责: 繁育事件与产奶记录写入前的校验
// 红线: 校验失败时不写入任何数据
// ==========================================

use chrono::NaiveDate;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ReproductionParams;
use crate::domain::breeding::NewBreedingEvent;
use crate::domain::cow::Cow;
use crate::domain::milk::NewMilkYield;
use crate::domain::types::{BreedingEventType, EventResult, MilkShift};
use crate::engine::repro_derivation::add_days;
use crate::repository::cow_repo::CowRepository;

// ==========================================
// 繁育事件校验
// ==========================================

/// 校验待追加的繁育事件
///
/// # 规则
/// 1. 结果必须属于该事件类型的合法结果集合
/// 2. 事件日期不得晚于 today + max_future_event_days
/// 3. 操作人不能为空
pub fn validate_breeding_event(
    event: &NewBreedingEvent,
    today: NaiveDate,
    params: &ReproductionParams,
) -> ApiResult<()> {
    if !event.event_type.accepts(event.result) {
        let allowed: Vec<&str> = event
            .event_type
            .valid_results()
            .iter()
            .map(|r| r.as_str())
            .collect();
        return Err(ApiError::ValidationError(format!(
            "事件类型{}不接受结果{}（允许: {}）",
            event.event_type,
            event.result,
            allowed.join("/")
        )));
    }

    let latest_allowed = add_days(today, params.max_future_event_days);
    if event.event_date > latest_allowed {
        return Err(ApiError::ValidationError(format!(
            "事件日期{}晚于允许的最晚日期{}",
            event.event_date, latest_allowed
        )));
    }

    if event.performed_by.trim().is_empty() {
        return Err(ApiError::ValidationError("操作人不能为空".to_string()));
    }

    Ok(())
}

// ==========================================
// 产奶记录校验
// ==========================================

/// 校验待写入的产奶记录
///
/// # 规则
/// 1. 产量为有限数且 >= 0
/// 2. 乳脂率/非脂乳固体（如有）在 0..=100
/// 3. 记录日期不得晚于今天
pub fn validate_milk_yield(record: &NewMilkYield, today: NaiveDate) -> ApiResult<()> {
    if !record.amount_liters.is_finite() || record.amount_liters < 0.0 {
        return Err(ApiError::ValidationError(format!(
            "产量必须为非负数: {}",
            record.amount_liters
        )));
    }

    for (field, value) in [("fat_percent", record.fat_percent), ("snf_percent", record.snf_percent)] {
        if let Some(v) = value {
            if !v.is_finite() || !(0.0..=100.0).contains(&v) {
                return Err(ApiError::ValidationError(format!(
                    "{}超出范围(0~100): {}",
                    field, v
                )));
            }
        }
    }

    if record.record_date > today {
        return Err(ApiError::ValidationError(format!(
            "记录日期{}不能晚于今天{}",
            record.record_date, today
        )));
    }

    Ok(())
}

// ==========================================
// 牛只登记校验
// ==========================================

pub fn validate_cow(cow: &Cow) -> ApiResult<()> {
    if cow.cow_id.trim().is_empty() {
        return Err(ApiError::ValidationError("牛只ID不能为空".to_string()));
    }
    if cow.ear_tag.trim().is_empty() {
        return Err(ApiError::ValidationError("耳标号不能为空".to_string()));
    }
    Ok(())
}

/// 牛只必须已登记（事件/记录类操作不自动建档）
pub fn require_cow(cow_repo: &CowRepository, cow_id: &str) -> ApiResult<()> {
    if cow_repo.exists(cow_id)? {
        Ok(())
    } else {
        Err(ApiError::NotFound(format!("牛只(id={})不存在", cow_id)))
    }
}

// ==========================================
// 字符串解析（供表单/命令层调用）
// ==========================================

pub fn parse_date(field: &str, raw: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::ValidationError(format!("{}不是有效日期(YYYY-MM-DD): {}", field, raw)))
}

pub fn parse_event_type(raw: &str) -> ApiResult<BreedingEventType> {
    BreedingEventType::parse(raw)
        .ok_or_else(|| ApiError::ValidationError(format!("未知的繁育事件类型: {}", raw)))
}

pub fn parse_event_result(raw: &str) -> ApiResult<EventResult> {
    EventResult::parse(raw)
        .ok_or_else(|| ApiError::ValidationError(format!("未知的事件结果: {}", raw)))
}

pub fn parse_shift(raw: &str) -> ApiResult<MilkShift> {
    MilkShift::parse(raw).ok_or_else(|| ApiError::ValidationError(format!("未知的班次: {}", raw)))
}
