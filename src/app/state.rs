// ==========================================
// 钢材炉号库存台账 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ConfigApi, DashboardApi, HeatApi, ProductionApi};
use crate::config::{ConfigManager, InventoryConfigReader};
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::engine::AllocationEngine;
use crate::repository::{HeatRepository, ProductionRepository};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "HEAT_INVENTORY_DB";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 炉号API
    pub heat_api: Arc<HeatApi>,

    /// 生产记录API
    pub production_api: Arc<ProductionApi>,

    /// 驾驶舱API
    pub dashboard_api: Arc<DashboardApi>,

    /// 配置管理API
    pub config_api: Arc<ConfigApi>,

    /// 领料引擎（HeatApi / ProductionApi 共享同一实例,钢种锁才能生效）
    pub engine: Arc<AllocationEngine<HeatRepository>>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并建表（幂等）
    /// 2. 初始化Repository与配置
    /// 3. 初始化领料引擎
    /// 4. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let heat_repo = Arc::new(HeatRepository::from_connection(conn.clone()));
        let production_repo = Arc::new(ProductionRepository::from_connection(conn.clone()));

        // ==========================================
        // 初始化配置
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let config_reader: Arc<dyn InventoryConfigReader> = config_manager.clone();

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let engine = Arc::new(AllocationEngine::new(heat_repo.clone()));

        // ==========================================
        // 创建API实例
        // ==========================================
        let heat_api = Arc::new(HeatApi::new(heat_repo.clone(), engine.clone()));
        let production_api = Arc::new(ProductionApi::new(
            production_repo.clone(),
            engine.clone(),
            config_reader.clone(),
        ));
        let dashboard_api = Arc::new(DashboardApi::new(heat_repo, production_repo, config_reader));
        let config_api = Arc::new(ConfigApi::new(config_manager));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            heat_api,
            production_api,
            dashboard_api,
            config_api,
            engine,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 HEAT_INVENTORY_DB > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./heat_inventory.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("heat-inventory");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("heat_inventory.db");
        }
    }

    path.to_string_lossy().to_string()
}
