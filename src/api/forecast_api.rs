// ==========================================
// 牧场繁育管理系统 - 预产期预测 API
// ==========================================
// 职责: 汇总在孕/已配种牛只的预产期预测
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::config::HerdConfigReader;
use crate::domain::types::ReproStatus;
use crate::engine::delivery_forecast::{DeliveryForecast, DeliveryForecaster, ForecastInput};
use crate::repository::breeding_event_repo::BreedingEventRepository;
use crate::repository::repro_status_repo::ReproStatusRepository;

pub struct ForecastApi {
    event_repo: Arc<BreedingEventRepository>,
    status_repo: Arc<ReproStatusRepository>,
    config: Arc<dyn HerdConfigReader>,
}

impl ForecastApi {
    pub fn new(
        event_repo: Arc<BreedingEventRepository>,
        status_repo: Arc<ReproStatusRepository>,
        config: Arc<dyn HerdConfigReader>,
    ) -> Self {
        Self {
            event_repo,
            status_repo,
            config,
        }
    }

    /// 预产期预测
    ///
    /// # 参数
    /// - window: 临产窗口天数; None 时取配置 due_soon_window_days
    /// - today: 当前日期
    ///
    /// # 返回
    /// - 按 (预产期, cow_id) 升序, 每头牛一条
    pub fn forecast_deliveries(
        &self,
        window: Option<i64>,
        today: NaiveDate,
    ) -> ApiResult<Vec<DeliveryForecast>> {
        let params = self
            .config
            .reproduction_params()
            .map_err(|e| ApiError::InternalError(format!("读取繁育参数失败: {}", e)))?;

        let window = window.unwrap_or(params.due_soon_window_days);
        if window < 0 {
            return Err(ApiError::ValidationError(format!(
                "临产窗口天数不能为负: {}",
                window
            )));
        }

        let snapshots = self
            .status_repo
            .list_by_statuses(&[ReproStatus::Pregnant, ReproStatus::Inseminated])?;

        let mut inputs = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            let events = self.event_repo.list_by_cow(&snapshot.cow_id)?;
            inputs.push(ForecastInput { snapshot, events });
        }
        debug!(candidates = inputs.len(), window, "开始预产期预测");

        Ok(DeliveryForecaster::new(params).forecast(&inputs, today, window))
    }
}
