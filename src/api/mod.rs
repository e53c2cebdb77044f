// ==========================================
// 牧场繁育管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供表单/看板等展示层调用
// 说明: 权限 → 校验 → 落库 → 重算 → 通知
// ==========================================

pub mod access;
pub mod breeding_api;
pub mod config_api;
pub mod cow_api;
pub mod error;
pub mod forecast_api;
pub mod milk_api;
pub mod validator;

// 重导出核心类型
pub use access::{AllowAll, HerdAction, PermissionChecker};
pub use breeding_api::{BreedingApi, BreedingEventAppended, MAX_RECOMPUTE_ATTEMPTS};
pub use config_api::ConfigApi;
pub use cow_api::CowApi;
pub use error::{ApiError, ApiResult};
pub use forecast_api::ForecastApi;
pub use milk_api::MilkApi;
