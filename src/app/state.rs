// ==========================================
// 牧场繁育管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 所有仓储共享同一个 SQLite 连接
// ==========================================

use std::sync::{Arc, Mutex};

use anyhow::Context;

use crate::api::{
    AllowAll, BreedingApi, ConfigApi, CowApi, ForecastApi, MilkApi, PermissionChecker,
};
use crate::config::config_manager::ConfigManager;
use crate::config::HerdConfigReader;
use crate::db::{ensure_schema, open_sqlite_connection, read_schema_version};
use crate::engine::{HerdEventPublisher, OptionalEventPublisher};
use crate::repository::{
    BreedingEventRepository, CowRepository, MilkYieldRepository, ReproStatusRepository,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "HERD_LIFECYCLE_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 牛只档案API
    pub cow_api: Arc<CowApi>,

    /// 繁育API
    pub breeding_api: Arc<BreedingApi>,

    /// 产奶API
    pub milk_api: Arc<MilkApi>,

    /// 预产期预测API
    pub forecast_api: Arc<ForecastApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,
}

impl AppState {
    /// 创建新的AppState实例（默认放行所有操作, 不发布事件）
    pub fn new(db_path: String) -> anyhow::Result<Self> {
        Self::with_collaborators(db_path, None, Arc::new(AllowAll))
    }

    /// 创建带外部协作者的AppState实例
    ///
    /// # 参数
    /// - publisher: 事件发布者（通知牛主等）, None 表示不发布
    /// - permissions: 权限检查
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并确保表结构（含历史重复快照的修复）
    /// 2. 初始化所有Repository与配置管理器
    /// 3. 创建所有API实例
    pub fn with_collaborators(
        db_path: String,
        publisher: Option<Arc<dyn HerdEventPublisher>>,
        permissions: Arc<dyn PermissionChecker>,
    ) -> anyhow::Result<Self> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .with_context(|| format!("无法打开数据库: {}", db_path))?;
        ensure_schema(&conn).context("数据库表结构初始化失败")?;
        let schema_version = read_schema_version(&conn).context("读取 schema_version 失败")?;
        tracing::info!(schema_version = ?schema_version, "数据库表结构已就绪");
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let cow_repo = Arc::new(CowRepository::new(conn.clone()));
        let event_repo = Arc::new(BreedingEventRepository::new(conn.clone()));
        let status_repo = Arc::new(ReproStatusRepository::new(conn.clone()));
        let milk_repo = Arc::new(MilkYieldRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| anyhow::anyhow!("无法创建ConfigManager: {}", e))?,
        );
        let config: Arc<dyn HerdConfigReader> = config_manager.clone();

        let publisher = match publisher {
            Some(p) => OptionalEventPublisher::with_publisher(p),
            None => OptionalEventPublisher::none(),
        };

        // ==========================================
        // 初始化API层
        // ==========================================
        let cow_api = Arc::new(CowApi::new(cow_repo.clone(), permissions.clone()));
        let breeding_api = Arc::new(BreedingApi::new(
            cow_repo.clone(),
            event_repo.clone(),
            status_repo.clone(),
            config.clone(),
            permissions.clone(),
            publisher.clone(),
        ));
        let milk_api = Arc::new(MilkApi::new(
            cow_repo,
            milk_repo,
            config.clone(),
            permissions,
            publisher,
        ));
        let forecast_api = Arc::new(ForecastApi::new(event_repo, status_repo, config));
        let config_api = Arc::new(ConfigApi::new(config_manager));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            cow_api,
            breeding_api,
            milk_api,
            forecast_api,
            config_api,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 HERD_LIFECYCLE_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./herd_lifecycle.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("herd-lifecycle");
        match std::fs::create_dir_all(&dir) {
            Ok(()) => path = dir.join("herd_lifecycle.db"),
            Err(e) => tracing::warn!("无法创建数据目录 {:?}, 使用当前目录: {}", dir, e),
        }
    }

    path.to_string_lossy().to_string()
}
