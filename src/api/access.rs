// ==========================================
// 牧场繁育管理系统 - 操作权限检查
// ==========================================
// 职责: 定义权限检查能力, 由外部认证组件注入
// 说明: 核心不维护角色表; 未注入时默认放行
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 需要权限检查的写操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HerdAction {
    RegisterCow,
    RecordBreedingEvent,
    RecordMilkYield,
}

impl HerdAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HerdAction::RegisterCow => "REGISTER_COW",
            HerdAction::RecordBreedingEvent => "RECORD_BREEDING_EVENT",
            HerdAction::RecordMilkYield => "RECORD_MILK_YIELD",
        }
    }
}

impl fmt::Display for HerdAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 权限检查 Trait
pub trait PermissionChecker: Send + Sync {
    /// actor 是否允许执行 action
    fn check(&self, actor: &str, action: HerdAction) -> bool;
}

/// 全部放行
#[derive(Debug, Clone, Default)]
pub struct AllowAll;

impl PermissionChecker for AllowAll {
    fn check(&self, _actor: &str, _action: HerdAction) -> bool {
        true
    }
}

/// 写操作前的权限检查; 拒绝时返回 PermissionDenied
pub fn require_permission(
    checker: &dyn PermissionChecker,
    actor: &str,
    action: HerdAction,
) -> ApiResult<()> {
    if checker.check(actor, action) {
        Ok(())
    } else {
        tracing::warn!(actor = %actor, action = %action, "操作被拒绝");
        Err(ApiError::PermissionDenied {
            actor: actor.to_string(),
            action: action.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_all() {
        assert!(AllowAll.check("anyone", HerdAction::RecordMilkYield));
        assert_eq!(HerdAction::RecordBreedingEvent.to_string(), "RECORD_BREEDING_EVENT");
    }

    struct VetsOnly;

    impl PermissionChecker for VetsOnly {
        fn check(&self, actor: &str, action: HerdAction) -> bool {
            action != HerdAction::RecordBreedingEvent || actor.starts_with("vet")
        }
    }

    #[test]
    fn test_require_permission_denies() {
        assert!(require_permission(&VetsOnly, "vet-li", HerdAction::RecordBreedingEvent).is_ok());
        assert!(require_permission(&VetsOnly, "milker", HerdAction::RecordMilkYield).is_ok());
        assert!(matches!(
            require_permission(&VetsOnly, "milker", HerdAction::RecordBreedingEvent),
            Err(ApiError::PermissionDenied { .. })
        ));
    }
}
