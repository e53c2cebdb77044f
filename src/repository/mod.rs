// ==========================================
// 牧场繁育管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod breeding_event_repo;
pub mod cow_repo;
pub mod error;
pub mod milk_yield_repo;
pub mod repro_status_repo;

// 重导出核心仓储
pub use breeding_event_repo::BreedingEventRepository;
pub use cow_repo::CowRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use milk_yield_repo::MilkYieldRepository;
pub use repro_status_repo::ReproStatusRepository;
