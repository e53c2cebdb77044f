// ==========================================
// 牧场繁育管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为调用方可理解的错误消息
// 约定: 校验错误在任何写入之前返回; 写入后的重算失败不回滚已落库的事件
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与业务规则错误
    // ==========================================
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("重复记录: {0}")]
    DuplicateRecord(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无操作权限: actor={actor}, action={action}")]
    PermissionDenied { actor: String, action: String },

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("乐观锁冲突: {0}")]
    OptimisticLockFailure(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::OptimisticLockFailure {
                cow_id,
                expected,
                actual,
            } => ApiError::OptimisticLockFailure(format!(
                "牛只{}的繁育状态已被并发更新（期望revision={}，实际revision={}），可调用 recompute 修复",
                cow_id, expected, actual
            )),

            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DuplicateRecord(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::DuplicateRecord { entity, key } => {
                ApiError::DuplicateRecord(format!("{}(key={})已存在", entity, key))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::NotFound(format!("关联记录不存在: {}", msg))
            }

            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
