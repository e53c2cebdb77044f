// ==========================================
// 牧场繁育管理系统 - 核心库
// ==========================================
// 职责: 繁育事件日志、繁育状态派生、产奶记录与挤奶状态、预产期预测
// 技术栈: Rust + SQLite
// 系统定位: 由表单/看板等展示层调用的库边界
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/表结构）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BreedingEventType, EventResult, MilkQuality, MilkShift, ReproStatus};

// 领域实体
pub use domain::{
    BreedingEvent, Cow, MilkYieldRecord, NewBreedingEvent, NewMilkYield, ReproState,
    ReproStatusSnapshot,
};

// 引擎
pub use engine::{
    DeliveryBucket, DeliveryForecast, DeliveryForecaster, MilkingStatus, MilkingStatusResolver,
    ReproStatusDeriver,
};

// API
pub use api::{ApiError, ApiResult, BreedingApi, ConfigApi, CowApi, ForecastApi, MilkApi};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "牧场繁育管理系统";
