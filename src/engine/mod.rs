// ==========================================
// 牧场繁育管理系统 - 引擎层
// ==========================================
// 职责: 繁育状态派生、挤奶状态判定、预产期预测
// 红线: Engine 不拼 SQL, 输入为已加载的事件/记录
// ==========================================

pub mod delivery_forecast;
pub mod events;
pub mod milking_status;
pub mod repro_derivation;

// 重导出核心引擎
pub use delivery_forecast::{
    DeliveryBucket, DeliveryForecast, DeliveryForecaster, ForecastAnchor, ForecastInput,
};
pub use events::{
    HerdEvent, HerdEventPublisher, HerdEventType, NoOpEventPublisher, OptionalEventPublisher,
};
pub use milking_status::{DailyYield, DailyYieldSource, MilkingStatus, MilkingStatusResolver};
pub use repro_derivation::ReproStatusDeriver;
