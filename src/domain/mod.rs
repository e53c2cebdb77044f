// ==========================================
// 牧场繁育管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod breeding;
pub mod cow;
pub mod milk;
pub mod repro;
pub mod types;

// 重导出核心类型
pub use breeding::{BreedingEvent, NewBreedingEvent};
pub use cow::Cow;
pub use milk::{MilkYieldRecord, NewMilkYield};
pub use repro::{ReproState, ReproStatusSnapshot};
pub use types::{BreedingEventType, EventResult, MilkQuality, MilkShift, ReproStatus};
