// ==========================================
// 牧场繁育管理系统 - 牛只档案 API
// ==========================================
// 职责: 牛只登记与查询（繁育/产奶记录的前置条件）
// ==========================================

use std::sync::Arc;

use tracing::info;

use crate::api::access::{require_permission, HerdAction, PermissionChecker};
use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::validate_cow;
use crate::domain::cow::Cow;
use crate::repository::cow_repo::CowRepository;

pub struct CowApi {
    cow_repo: Arc<CowRepository>,
    permissions: Arc<dyn PermissionChecker>,
}

impl CowApi {
    pub fn new(cow_repo: Arc<CowRepository>, permissions: Arc<dyn PermissionChecker>) -> Self {
        Self {
            cow_repo,
            permissions,
        }
    }

    /// 登记牛只
    ///
    /// # 错误
    /// - `ApiError::ValidationError`: ID 或耳标号为空
    /// - `ApiError::DuplicateRecord`: ID 或耳标号已存在
    pub fn register_cow(&self, cow: Cow, operator: &str) -> ApiResult<Cow> {
        require_permission(self.permissions.as_ref(), operator, HerdAction::RegisterCow)?;
        validate_cow(&cow)?;

        let cow = Cow {
            cow_id: cow.cow_id.trim().to_string(),
            ear_tag: cow.ear_tag.trim().to_string(),
            ..cow
        };
        self.cow_repo.insert(&cow)?;
        info!(cow_id = %cow.cow_id, ear_tag = %cow.ear_tag, operator = %operator, "牛只已登记");
        Ok(cow)
    }

    pub fn get_cow(&self, cow_id: &str) -> ApiResult<Cow> {
        self.cow_repo
            .find_by_id(cow_id)?
            .ok_or_else(|| ApiError::NotFound(format!("牛只(id={})不存在", cow_id)))
    }

    pub fn list_cows(&self) -> ApiResult<Vec<Cow>> {
        Ok(self.cow_repo.list_all()?)
    }
}
