// ==========================================
// 牧场繁育管理系统 - 配置管理 API
// ==========================================
// 职责: 繁育参数查询、更新、快照导出
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::config::{HerdConfigReader, ReproductionParams};

pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 当前生效的繁育参数（未配置项取默认值）
    pub fn get_reproduction_params(&self) -> ApiResult<ReproductionParams> {
        self.config_manager
            .reproduction_params()
            .map_err(|e| ApiError::InternalError(format!("读取繁育参数失败: {}", e)))
    }

    /// 更新单个配置项
    ///
    /// 说明: 参数变更只影响之后的重算, 已落库快照需调用 recompute 才会按新参数刷新
    pub fn update_config(&self, key: &str, value: &str, operator: &str) -> ApiResult<()> {
        if key.trim().is_empty() {
            return Err(ApiError::ValidationError("配置键不能为空".to_string()));
        }

        self.config_manager
            .set_global_config_value(key.trim(), value)
            .map_err(|e| ApiError::ValidationError(e.to_string()))?;

        tracing::info!(config_key = key, operator = %operator, "配置项已由人工更新");
        Ok(())
    }

    /// 导出全部 global 配置（JSON）
    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        self.config_manager
            .get_config_snapshot()
            .map_err(|e| ApiError::InternalError(format!("导出配置失败: {}", e)))
    }
}
