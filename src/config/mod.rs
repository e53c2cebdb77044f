// ==========================================
// 牧场繁育管理系统 - 配置层
// ==========================================
// 职责: 繁育参数管理, 支持 global 覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod herd_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use herd_config_trait::{HerdConfigReader, ReproductionParams};
