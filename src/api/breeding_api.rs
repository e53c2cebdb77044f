// ==========================================
// 牧场繁育管理系统 - 繁育 API
// ==========================================
// 职责: 繁育事件追加、繁育状态查询、快照重算
// 红线: 事件日志是唯一事实来源, 快照可随时由 recompute 完整重建
// 并发: 快照写入使用 revision 乐观锁, 冲突时整体重放重试
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::access::{require_permission, HerdAction, PermissionChecker};
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{require_cow, validate_breeding_event};
use crate::config::{HerdConfigReader, ReproductionParams};
use crate::domain::breeding::{BreedingEvent, NewBreedingEvent};
use crate::domain::repro::ReproStatusSnapshot;
use crate::engine::events::{HerdEvent, OptionalEventPublisher};
use crate::engine::repro_derivation::ReproStatusDeriver;
use crate::repository::breeding_event_repo::BreedingEventRepository;
use crate::repository::cow_repo::CowRepository;
use crate::repository::error::RepositoryError;
use crate::repository::repro_status_repo::ReproStatusRepository;

/// 快照写入冲突时的最大重放次数
pub const MAX_RECOMPUTE_ATTEMPTS: u32 = 3;

// ==========================================
// BreedingEventAppended - 追加结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreedingEventAppended {
    /// 已落库的事件
    pub event: BreedingEvent,
    /// 重算后的快照; 重算失败时为 None（事件仍然有效, 可调用 recompute 修复）
    pub status: Option<ReproStatusSnapshot>,
    /// 重算失败原因
    pub recompute_error: Option<String>,
}

// ==========================================
// BreedingApi - 繁育 API
// ==========================================
pub struct BreedingApi {
    cow_repo: Arc<CowRepository>,
    event_repo: Arc<BreedingEventRepository>,
    status_repo: Arc<ReproStatusRepository>,
    config: Arc<dyn HerdConfigReader>,
    permissions: Arc<dyn PermissionChecker>,
    publisher: OptionalEventPublisher,
}

impl BreedingApi {
    pub fn new(
        cow_repo: Arc<CowRepository>,
        event_repo: Arc<BreedingEventRepository>,
        status_repo: Arc<ReproStatusRepository>,
        config: Arc<dyn HerdConfigReader>,
        permissions: Arc<dyn PermissionChecker>,
        publisher: OptionalEventPublisher,
    ) -> Self {
        Self {
            cow_repo,
            event_repo,
            status_repo,
            config,
            permissions,
            publisher,
        }
    }

    fn params(&self) -> ApiResult<ReproductionParams> {
        self.config
            .reproduction_params()
            .map_err(|e| ApiError::InternalError(format!("读取繁育参数失败: {}", e)))
    }

    /// 追加繁育事件并重算快照
    ///
    /// # 参数
    /// - cow_id: 牛只ID（必须已登记）
    /// - event: 待追加事件（performed_by 同时作为权限检查的操作人）
    /// - today: 当前日期（未来日期校验与产后期判定）
    ///
    /// # 错误
    /// - `ApiError::ValidationError`: 校验失败, 事件未写入
    /// - `ApiError::NotFound`: 牛只未登记
    /// - `ApiError::PermissionDenied`: 操作人无权限
    ///
    /// # 说明
    /// 事件落库后重算失败不会回滚事件, 只记录 WARN 并在返回值中标明
    pub fn append_breeding_event(
        &self,
        cow_id: &str,
        event: NewBreedingEvent,
        today: NaiveDate,
    ) -> ApiResult<BreedingEventAppended> {
        require_permission(
            self.permissions.as_ref(),
            event.performed_by.trim(),
            HerdAction::RecordBreedingEvent,
        )?;

        let params = self.params()?;
        validate_breeding_event(&event, today, &params)?;
        require_cow(&self.cow_repo, cow_id)?;

        let stored = self.event_repo.append(cow_id, &event)?;
        info!(
            cow_id = %cow_id,
            event_id = %stored.event_id,
            event_type = %stored.event_type,
            result = %stored.result,
            event_date = %stored.event_date,
            "繁育事件已追加"
        );
        self.publisher.publish(HerdEvent::breeding_recorded(
            cow_id,
            &stored.event_id,
            stored.event_date,
        ));

        let (status, recompute_error) = match self.replay_and_store(cow_id, today, &params) {
            Ok(snapshot) => (Some(snapshot), None),
            Err(e) => {
                warn!(
                    cow_id = %cow_id,
                    event_id = %stored.event_id,
                    error = %e,
                    "事件已落库但快照重算失败, 快照暂时过期"
                );
                (None, Some(e.to_string()))
            }
        };

        Ok(BreedingEventAppended {
            event: stored,
            status,
            recompute_error,
        })
    }

    /// 查询繁育状态
    ///
    /// - 快照不存在时由事件日志重建（无事件即 Open/0 默认快照）
    /// - 产后期已过的 Fresh 快照在读取时回落为 Open 并落库
    ///
    /// # 错误
    /// - `ApiError::NotFound`: 牛只未登记
    pub fn get_reproductive_status(&self, cow_id: &str, today: NaiveDate) -> ApiResult<ReproStatusSnapshot> {
        require_cow(&self.cow_repo, cow_id)?;
        let params = self.params()?;

        match self.status_repo.find_by_cow(cow_id)? {
            None => {
                debug!(cow_id = %cow_id, "快照不存在, 由事件日志重建");
                self.replay_and_store(cow_id, today, &params)
            }
            Some(snapshot)
                if ReproStatusDeriver::new(params).fresh_period_elapsed(&snapshot.state, today) =>
            {
                debug!(cow_id = %cow_id, "产后期已过, 重算快照");
                self.replay_and_store(cow_id, today, &params)
            }
            Some(snapshot) => Ok(snapshot),
        }
    }

    /// 重算快照（幂等）
    ///
    /// 事件无变化时连续调用返回完全相同的快照（revision 与 updated_at 不变）
    pub fn recompute(&self, cow_id: &str, today: NaiveDate) -> ApiResult<ReproStatusSnapshot> {
        require_cow(&self.cow_repo, cow_id)?;
        let params = self.params()?;
        self.replay_and_store(cow_id, today, &params)
    }

    /// 查询某头牛的繁育事件（因果顺序）
    pub fn list_breeding_events(&self, cow_id: &str) -> ApiResult<Vec<BreedingEvent>> {
        require_cow(&self.cow_repo, cow_id)?;
        Ok(self.event_repo.list_by_cow(cow_id)?)
    }

    /// 查询某头牛在日期区间内的繁育事件（闭区间）
    pub fn list_breeding_events_between(
        &self,
        cow_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ApiResult<Vec<BreedingEvent>> {
        if from > to {
            return Err(ApiError::ValidationError(format!(
                "起始日期{}晚于结束日期{}",
                from, to
            )));
        }
        require_cow(&self.cow_repo, cow_id)?;
        Ok(self.event_repo.list_between(cow_id, from, to)?)
    }

    /// 从空状态重放全部事件并写入快照
    ///
    /// 先读快照再读事件: 读取事件之后发生的任何快照写入都会使本次 revision 失效
    fn replay_and_store(
        &self,
        cow_id: &str,
        today: NaiveDate,
        params: &ReproductionParams,
    ) -> ApiResult<ReproStatusSnapshot> {
        let deriver = ReproStatusDeriver::new(*params);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let current = self.status_repo.find_by_cow(cow_id)?;
            let events = self.event_repo.list_by_cow(cow_id)?;
            let derived = deriver.derive(&events, today);

            if let Some(stored) = &current {
                if stored.state == derived {
                    debug!(cow_id = %cow_id, revision = stored.revision, "快照无变化");
                    return Ok(stored.clone());
                }
            }

            let previous_status = current.as_ref().map(|s| s.status()).unwrap_or_default();
            let candidate = ReproStatusSnapshot {
                cow_id: cow_id.to_string(),
                state: derived,
                revision: current.as_ref().map(|s| s.revision).unwrap_or(0),
                updated_at: Utc::now().naive_utc(),
            };

            match self.status_repo.save(&candidate) {
                Ok(saved) => {
                    info!(
                        cow_id = %cow_id,
                        status = %saved.status(),
                        calving_count = saved.state.calving_count,
                        revision = saved.revision,
                        events = events.len(),
                        "繁育状态快照已更新"
                    );
                    if saved.status() != previous_status {
                        self.publisher.publish(HerdEvent::status_changed(
                            cow_id,
                            previous_status,
                            saved.status(),
                        ));
                    }
                    return Ok(saved);
                }
                Err(RepositoryError::OptimisticLockFailure { expected, actual, .. })
                    if attempt < MAX_RECOMPUTE_ATTEMPTS =>
                {
                    warn!(
                        cow_id = %cow_id,
                        attempt,
                        expected,
                        actual,
                        "快照并发写入冲突, 重新重放"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
