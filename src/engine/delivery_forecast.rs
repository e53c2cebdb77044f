// ==========================================
// 牧场繁育管理系统 - 预产期预测引擎
// ==========================================
// 职责: 基于繁育状态快照与原始事件, 推算在孕/已配种牛只的预产期并分组
// 分组: 已超期 (days_until < 0) / 临产 (0..=窗口) / 待产 (> 窗口)
// 红线: 纯函数, 不访问仓储; 每头牛至多一条预测
// ==========================================

use crate::config::ReproductionParams;
use crate::domain::breeding::BreedingEvent;
use crate::domain::repro::ReproStatusSnapshot;
use crate::domain::types::{BreedingEventType, EventResult, ReproStatus};
use crate::engine::repro_derivation::add_days;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// 预测分组
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryBucket {
    Overdue,
    DueSoon,
    Upcoming,
}

impl DeliveryBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryBucket::Overdue => "OVERDUE",
            DeliveryBucket::DueSoon => "DUE_SOON",
            DeliveryBucket::Upcoming => "UPCOMING",
        }
    }

    /// 按距今天数分组（window 为负时按 0 处理）
    pub fn classify(days_until: i64, window: i64) -> Self {
        if days_until < 0 {
            DeliveryBucket::Overdue
        } else if days_until <= window.max(0) {
            DeliveryBucket::DueSoon
        } else {
            DeliveryBucket::Upcoming
        }
    }
}

/// 预产期推算依据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForecastAnchor {
    PregnancyCheck, // 妊检阳性（以妊检日推算）
    Insemination,   // 已配种尚未妊检（以配种日推算）
}

// ==========================================
// 预测结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryForecast {
    pub cow_id: String,
    pub expected_date: NaiveDate,
    pub days_until: i64,
    pub bucket: DeliveryBucket,
    pub anchor: ForecastAnchor,
    pub anchor_date: NaiveDate, // 依据事件日期
    pub source_event_id: String,
}

/// 单头牛的预测输入
#[derive(Debug, Clone)]
pub struct ForecastInput {
    pub snapshot: ReproStatusSnapshot,
    pub events: Vec<BreedingEvent>,
}

// ==========================================
// DeliveryForecaster
// ==========================================
pub struct DeliveryForecaster {
    params: ReproductionParams,
}

impl DeliveryForecaster {
    pub fn new(params: ReproductionParams) -> Self {
        Self { params }
    }

    /// 批量预测（主入口）
    ///
    /// # 返回
    /// - 按 (预产期, cow_id) 升序, 每头牛一条
    pub fn forecast(&self, inputs: &[ForecastInput], today: NaiveDate, window: i64) -> Vec<DeliveryForecast> {
        // cow_id -> (来源事件排序键, 预测)
        let mut by_cow: BTreeMap<&str, ((NaiveDate, i64), DeliveryForecast)> = BTreeMap::new();

        for input in inputs {
            let Some((source_key, forecast)) = self.project_keyed(input, today, window) else {
                continue;
            };

            match by_cow.get(input.snapshot.cow_id.as_str()) {
                Some((existing_key, _)) if *existing_key >= source_key => {}
                _ => {
                    by_cow.insert(input.snapshot.cow_id.as_str(), (source_key, forecast));
                }
            }
        }

        let mut forecasts: Vec<DeliveryForecast> =
            by_cow.into_values().map(|(_, forecast)| forecast).collect();
        forecasts.sort_by(|a, b| {
            a.expected_date
                .cmp(&b.expected_date)
                .then_with(|| a.cow_id.cmp(&b.cow_id))
        });

        tracing::debug!(
            "预产期预测完成: 输入 {} 头, 输出 {} 条, today={}, window={}",
            inputs.len(),
            forecasts.len(),
            today,
            window
        );
        forecasts
    }

    /// 单头牛预测
    ///
    /// 快照状态不是 Pregnant/Inseminated, 或事件中找不到有效依据时返回 None
    pub fn project(&self, input: &ForecastInput, today: NaiveDate, window: i64) -> Option<DeliveryForecast> {
        self.project_keyed(input, today, window).map(|(_, f)| f)
    }

    fn project_keyed(
        &self,
        input: &ForecastInput,
        today: NaiveDate,
        window: i64,
    ) -> Option<((NaiveDate, i64), DeliveryForecast)> {
        if !matches!(
            input.snapshot.status(),
            ReproStatus::Pregnant | ReproStatus::Inseminated
        ) {
            return None;
        }

        let anchor = latest_anchor(&input.events)?;
        let anchor_date = anchor.source.event_date;
        let expected_date = add_days(anchor_date, self.params.gestation_days);
        let days_until = expected_date.signed_duration_since(today).num_days();

        let forecast = DeliveryForecast {
            cow_id: input.snapshot.cow_id.clone(),
            expected_date,
            days_until,
            bucket: DeliveryBucket::classify(days_until, window),
            anchor: anchor.kind,
            anchor_date,
            source_event_id: anchor.source.event_id.clone(),
        };
        Some(((anchor.source.event_date, anchor.source.seq), forecast))
    }
}

struct Anchor<'a> {
    kind: ForecastAnchor,
    source: &'a BreedingEvent,
}

/// 按因果顺序扫描, 取最后一个有效依据（依据事件日 + 妊娠期 = 预产期）
///
/// 妊检阴性与正常产犊结束当前胎次, 之前的依据作废
fn latest_anchor(events: &[BreedingEvent]) -> Option<Anchor<'_>> {
    let mut ordered: Vec<&BreedingEvent> = events.iter().collect();
    ordered.sort_by(|a, b| a.chronological_cmp(b));

    let mut anchor: Option<Anchor> = None;

    for event in ordered {
        match (event.event_type, event.result) {
            (BreedingEventType::Insemination, EventResult::Completed) => {
                anchor = Some(Anchor {
                    kind: ForecastAnchor::Insemination,
                    source: event,
                });
            }
            (BreedingEventType::PregnancyCheck, EventResult::Positive) => {
                anchor = Some(Anchor {
                    kind: ForecastAnchor::PregnancyCheck,
                    source: event,
                });
            }
            (BreedingEventType::PregnancyCheck, EventResult::Negative)
            | (BreedingEventType::Calving, EventResult::Healthy | EventResult::Complications) => {
                anchor = None;
            }
            _ => {}
        }
    }

    anchor
}
