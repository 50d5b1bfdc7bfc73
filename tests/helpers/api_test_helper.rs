// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用辅助函数
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::sync::Arc;
use tempfile::NamedTempFile;

use heat_inventory::api::{ConfigApi, DashboardApi, HeatApi, ProductionApi};
use heat_inventory::config::{ConfigManager, InventoryConfigReader};
use heat_inventory::domain::{Heat, NewHeat};
use heat_inventory::engine::AllocationEngine;
use heat_inventory::repository::{HeatRepository, ProductionRepository};

use super::mock_config::MockConfig;

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 包含所有API实例和必要的依赖
pub struct ApiTestEnv {
    pub db_path: String,
    pub heat_api: Arc<HeatApi>,
    pub production_api: Arc<ProductionApi>,
    pub dashboard_api: Arc<DashboardApi>,
    pub config_api: Arc<ConfigApi>,

    // Repository层（用于测试数据准备和绕过引擎制造漂移）
    pub heat_repo: Arc<HeatRepository>,
    pub production_repo: Arc<ProductionRepository>,
    pub config_manager: Arc<ConfigManager>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 使用 MockConfig::default() 创建测试环境
    pub fn new() -> Result<Self, String> {
        Self::with_config(Arc::new(MockConfig::default()))
    }

    /// 使用数据库配置（ConfigManager）创建测试环境
    pub fn with_db_config() -> Result<Self, String> {
        Self::build(None)
    }

    /// 使用指定配置读取器创建测试环境
    pub fn with_config(config: Arc<dyn InventoryConfigReader>) -> Result<Self, String> {
        Self::build(Some(config))
    }

    fn build(config: Option<Arc<dyn InventoryConfigReader>>) -> Result<Self, String> {
        // 创建临时数据库文件并初始化schema
        let (temp_file, db_path) =
            test_helpers::create_test_db().map_err(|e| format!("无法创建测试数据库: {}", e))?;
        let conn = test_helpers::open_shared_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;

        let heat_repo = Arc::new(HeatRepository::from_connection(conn.clone()));
        let production_repo = Arc::new(ProductionRepository::from_connection(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn).map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let config_reader: Arc<dyn InventoryConfigReader> = match config {
            Some(config) => config,
            None => config_manager.clone(),
        };

        let engine = Arc::new(AllocationEngine::new(heat_repo.clone()));

        Ok(Self {
            db_path,
            heat_api: Arc::new(HeatApi::new(heat_repo.clone(), engine.clone())),
            production_api: Arc::new(ProductionApi::new(
                production_repo.clone(),
                engine,
                config_reader.clone(),
            )),
            dashboard_api: Arc::new(DashboardApi::new(
                heat_repo.clone(),
                production_repo.clone(),
                config_reader,
            )),
            config_api: Arc::new(ConfigApi::new(config_manager.clone())),
            heat_repo,
            production_repo,
            config_manager,
            _temp_file: temp_file,
        })
    }

    /// 批量入库炉号（按传入顺序）
    pub fn prepare_heats(&self, heats: Vec<NewHeat>) -> Result<Vec<Heat>, String> {
        heats
            .into_iter()
            .map(|h| self.heat_api.create_heat(h).map_err(|e| e.to_string()))
            .collect()
    }

    /// 重新读取炉号的剩余量
    pub fn remaining_of(&self, heat_id: &str) -> f64 {
        self.heat_api
            .get_heat(heat_id)
            .map(|h| h.remaining_kg)
            .unwrap_or(f64::NAN)
    }
}

/// 浮点比较（0.01kg 容差）
pub fn assert_kg_eq(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 0.01,
        "重量不符: actual={}kg, expected={}kg",
        actual,
        expected
    );
}
