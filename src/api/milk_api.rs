// ==========================================
// 牧场繁育管理系统 - 产奶 API
// ==========================================
// 职责: 产奶记录写入、挤奶状态与近日产量查询
// 红线: (cow_id, date, shift) 唯一, 重复写入返回 DuplicateRecord, 原记录不变
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::info;

use crate::api::access::{require_permission, HerdAction, PermissionChecker};
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{require_cow, validate_milk_yield};
use crate::config::HerdConfigReader;
use crate::domain::milk::{MilkYieldRecord, NewMilkYield};
use crate::engine::events::{HerdEvent, OptionalEventPublisher};
use crate::engine::milking_status::{
    latest_record, recent_daily_total, DailyYield, MilkingStatus, MilkingStatusResolver,
};
use crate::repository::cow_repo::CowRepository;
use crate::repository::milk_yield_repo::MilkYieldRepository;

// ==========================================
// MilkApi - 产奶 API
// ==========================================
pub struct MilkApi {
    cow_repo: Arc<CowRepository>,
    milk_repo: Arc<MilkYieldRepository>,
    config: Arc<dyn HerdConfigReader>,
    permissions: Arc<dyn PermissionChecker>,
    publisher: OptionalEventPublisher,
}

impl MilkApi {
    pub fn new(
        cow_repo: Arc<CowRepository>,
        milk_repo: Arc<MilkYieldRepository>,
        config: Arc<dyn HerdConfigReader>,
        permissions: Arc<dyn PermissionChecker>,
        publisher: OptionalEventPublisher,
    ) -> Self {
        Self {
            cow_repo,
            milk_repo,
            config,
            permissions,
            publisher,
        }
    }

    /// 写入产奶记录
    ///
    /// # 参数
    /// - operator: 录入人（权限检查）
    /// - today: 当前日期（记录日期不得晚于今天）
    ///
    /// # 错误
    /// - `ApiError::ValidationError`: 产量/比例/日期不合法
    /// - `ApiError::NotFound`: 牛只未登记
    /// - `ApiError::DuplicateRecord`: 同日同班次已有记录
    pub fn record_milk_yield(
        &self,
        cow_id: &str,
        record: NewMilkYield,
        operator: &str,
        today: NaiveDate,
    ) -> ApiResult<MilkYieldRecord> {
        require_permission(self.permissions.as_ref(), operator, HerdAction::RecordMilkYield)?;
        validate_milk_yield(&record, today)?;
        require_cow(&self.cow_repo, cow_id)?;

        let stored = self.milk_repo.insert(cow_id, &record)?;
        info!(
            cow_id = %cow_id,
            record_date = %stored.record_date,
            shift = %stored.shift,
            amount_liters = stored.amount_liters,
            operator = %operator,
            "产奶记录已写入"
        );
        self.publisher.publish(HerdEvent::milk_recorded(
            cow_id,
            &stored.record_id,
            stored.record_date,
        ));

        Ok(stored)
    }

    /// 查询挤奶状态
    ///
    /// 已挤奶口径: 参考日当天各班次产量之和 > 0
    pub fn get_milking_status(&self, cow_id: &str, as_of: NaiveDateTime) -> ApiResult<MilkingStatus> {
        require_cow(&self.cow_repo, cow_id)?;
        let params = self
            .config
            .reproduction_params()
            .map_err(|e| ApiError::InternalError(format!("读取配置失败: {}", e)))?;

        let day = as_of.date();
        let records = self.milk_repo.list_between(cow_id, day, day)?;
        Ok(MilkingStatusResolver::new(params.evening_shift_start_hour).resolve(cow_id, &records, as_of))
    }

    /// 近日产量（今日合计, 无记录时回退昨日）
    pub fn get_recent_daily_yield(&self, cow_id: &str, today: NaiveDate) -> ApiResult<DailyYield> {
        require_cow(&self.cow_repo, cow_id)?;
        let from = today.pred_opt().unwrap_or(today);
        let records = self.milk_repo.list_between(cow_id, from, today)?;
        Ok(recent_daily_total(&records, today))
    }

    /// 最近一条产奶记录（日期降序, 同日晚班优先）
    pub fn get_latest_milk_yield(&self, cow_id: &str) -> ApiResult<Option<MilkYieldRecord>> {
        require_cow(&self.cow_repo, cow_id)?;
        let records = self.milk_repo.list_by_cow(cow_id)?;
        Ok(latest_record(&records).cloned())
    }

    /// 查询某头牛在日期区间内的产奶记录（闭区间）
    pub fn list_milk_yields(
        &self,
        cow_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ApiResult<Vec<MilkYieldRecord>> {
        if from > to {
            return Err(ApiError::ValidationError(format!(
                "起始日期{}晚于结束日期{}",
                from, to
            )));
        }
        require_cow(&self.cow_repo, cow_id)?;
        Ok(self.milk_repo.list_between(cow_id, from, to)?)
    }
}
