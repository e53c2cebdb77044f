// ==========================================
// 牧场繁育管理系统 - 领域事件发布
// ==========================================
// 职责: 定义牧场事件发布 trait，由外部通知组件实现（如提醒牛主）
// 说明: 核心只负责发出事件, 不关心投递方式; 发布失败不影响业务写入
// ==========================================

use crate::domain::types::ReproStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 牧场事件类型
// ==========================================

/// 牧场事件触发类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HerdEventType {
    /// 新增繁育事件
    BreedingEventRecorded,
    /// 繁育状态变化（重放结果与原快照不同）
    ReproStatusChanged,
    /// 新增产奶记录
    MilkYieldRecorded,
}

impl HerdEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            HerdEventType::BreedingEventRecorded => "BreedingEventRecorded",
            HerdEventType::ReproStatusChanged => "ReproStatusChanged",
            HerdEventType::MilkYieldRecorded => "MilkYieldRecorded",
        }
    }
}

/// 牧场事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HerdEvent {
    /// 牛只ID
    pub cow_id: String,
    /// 事件类型
    pub event_type: HerdEventType,
    /// 关联记录ID（繁育事件ID / 产奶记录ID）
    pub record_id: Option<String>,
    /// 业务日期
    pub occurred_on: Option<NaiveDate>,
    /// 状态变化 (旧, 新)
    pub status_change: Option<(ReproStatus, ReproStatus)>,
}

impl HerdEvent {
    pub fn breeding_recorded(cow_id: &str, event_id: &str, event_date: NaiveDate) -> Self {
        Self {
            cow_id: cow_id.to_string(),
            event_type: HerdEventType::BreedingEventRecorded,
            record_id: Some(event_id.to_string()),
            occurred_on: Some(event_date),
            status_change: None,
        }
    }

    pub fn status_changed(cow_id: &str, from: ReproStatus, to: ReproStatus) -> Self {
        Self {
            cow_id: cow_id.to_string(),
            event_type: HerdEventType::ReproStatusChanged,
            record_id: None,
            occurred_on: None,
            status_change: Some((from, to)),
        }
    }

    pub fn milk_recorded(cow_id: &str, record_id: &str, record_date: NaiveDate) -> Self {
        Self {
            cow_id: cow_id.to_string(),
            event_type: HerdEventType::MilkYieldRecorded,
            record_id: Some(record_id.to_string()),
            occurred_on: Some(record_date),
            status_change: None,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 牧场事件发布者 Trait
///
/// 由通知组件实现（消息推送、站内提醒等）
pub trait HerdEventPublisher: Send + Sync {
    /// 发布牧场事件
    ///
    /// # 返回
    /// - `Ok(())`: 已受理
    /// - `Err`: 发布失败（调用方记录告警后继续）
    fn publish(&self, event: HerdEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl HerdEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: HerdEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - cow_id={}, event_type={}",
            event.cow_id,
            event.event_type.as_str()
        );
        Ok(())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn HerdEventPublisher>> 的使用; 发布失败只记录告警
#[derive(Clone)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn HerdEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn HerdEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）, 失败时记录 WARN 并吞掉错误
    pub fn publish(&self, event: HerdEvent) {
        match &self.inner {
            Some(publisher) => {
                let cow_id = event.cow_id.clone();
                let event_type = event.event_type;
                if let Err(e) = publisher.publish(event) {
                    tracing::warn!(
                        "事件发布失败(已忽略): cow_id={}, event_type={}, error={}",
                        cow_id,
                        event_type.as_str(),
                        e
                    );
                }
            }
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - cow_id={}, event_type={}",
                    event.cow_id,
                    event.event_type.as_str()
                );
            }
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording(Mutex<Vec<HerdEventType>>);

    impl HerdEventPublisher for Recording {
        fn publish(&self, event: HerdEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.0.lock().unwrap().push(event.event_type);
            Ok(())
        }
    }

    struct Failing;

    impl HerdEventPublisher for Failing {
        fn publish(&self, _event: HerdEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
            Err("通知服务不可用".into())
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_event_constructors() {
        let e = HerdEvent::breeding_recorded("C1", "E1", day());
        assert_eq!(e.event_type, HerdEventType::BreedingEventRecorded);
        assert_eq!(e.record_id.as_deref(), Some("E1"));

        let s = HerdEvent::status_changed("C1", ReproStatus::Open, ReproStatus::InHeat);
        assert_eq!(s.status_change, Some((ReproStatus::Open, ReproStatus::InHeat)));
        assert!(s.record_id.is_none());
    }

    #[test]
    fn test_noop_publisher() {
        let result = NoOpEventPublisher.publish(HerdEvent::milk_recorded("C1", "M1", day()));
        assert!(result.is_ok());
    }

    #[test]
    fn test_optional_publisher_none() {
        let publisher = OptionalEventPublisher::none();
        assert!(!publisher.is_configured());
        publisher.publish(HerdEvent::milk_recorded("C1", "M1", day()));
    }

    #[test]
    fn test_optional_publisher_forwards() {
        let recording = Arc::new(Recording(Mutex::new(Vec::new())));
        let publisher = OptionalEventPublisher::with_publisher(recording.clone());
        assert!(publisher.is_configured());

        publisher.publish(HerdEvent::breeding_recorded("C1", "E1", day()));
        assert_eq!(
            *recording.0.lock().unwrap(),
            vec![HerdEventType::BreedingEventRecorded]
        );
    }

    #[test]
    fn test_optional_publisher_swallows_failure() {
        let publisher = OptionalEventPublisher::with_publisher(Arc::new(Failing));
        publisher.publish(HerdEvent::status_changed("C1", ReproStatus::Open, ReproStatus::Fresh));
    }
}
