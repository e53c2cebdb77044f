// ==========================================
// 牧场繁育管理系统 - 繁育参数读取 Trait
// ==========================================
// 职责: 定义派生/预测引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;

/// 妊娠期默认天数
///
/// 历史数据中曾同时出现 280 与 283 两个取值, 统一以 280 为准, 可通过
/// config_kv 的 gestation_days 覆写
pub const DEFAULT_GESTATION_DAYS: i64 = 280;
/// 发情周期默认天数
pub const DEFAULT_HEAT_CYCLE_DAYS: i64 = 21;
/// 产后期默认天数
pub const DEFAULT_FRESH_PERIOD_DAYS: i64 = 60;
/// 临产提醒窗口默认天数
pub const DEFAULT_DUE_SOON_WINDOW_DAYS: i64 = 14;
/// 事件日期允许超前今天的天数
pub const DEFAULT_MAX_FUTURE_EVENT_DAYS: i64 = 0;
/// 晚班起始小时
pub const DEFAULT_EVENING_SHIFT_START_HOUR: u32 = 12;

// ==========================================
// ReproductionParams - 繁育参数快照
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReproductionParams {
    pub gestation_days: i64,
    pub heat_cycle_days: i64,
    pub fresh_period_days: i64,
    pub due_soon_window_days: i64,
    pub max_future_event_days: i64,
    pub evening_shift_start_hour: u32,
}

impl Default for ReproductionParams {
    fn default() -> Self {
        Self {
            gestation_days: DEFAULT_GESTATION_DAYS,
            heat_cycle_days: DEFAULT_HEAT_CYCLE_DAYS,
            fresh_period_days: DEFAULT_FRESH_PERIOD_DAYS,
            due_soon_window_days: DEFAULT_DUE_SOON_WINDOW_DAYS,
            max_future_event_days: DEFAULT_MAX_FUTURE_EVENT_DAYS,
            evening_shift_start_hour: DEFAULT_EVENING_SHIFT_START_HOUR,
        }
    }
}

// ==========================================
// HerdConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait HerdConfigReader: Send + Sync {
    /// 读取当前生效的繁育参数
    ///
    /// # 默认值
    /// - 见 ReproductionParams::default
    fn reproduction_params(&self) -> Result<ReproductionParams, Box<dyn Error>>;
}

/// 固定参数 (测试与嵌入场景使用)
impl HerdConfigReader for ReproductionParams {
    fn reproduction_params(&self) -> Result<ReproductionParams, Box<dyn Error>> {
        Ok(*self)
    }
}
