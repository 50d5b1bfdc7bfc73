// ==========================================
// 钢材炉号库存台账 - 配置管理 API
// ==========================================
// 职责: 材料规则、库存阈值、驾驶舱参数的查询与更新
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::config::{config_keys, ConfigManager, InventoryConfigReader};
use crate::domain::inventory::StockThresholds;
use crate::domain::production::MaterialRule;
use crate::domain::types::SteelType;

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    /// 创建新的ConfigApi实例
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 全部材料规则（内置 + 已配置）
    pub async fn list_material_rules(&self) -> ApiResult<BTreeMap<String, MaterialRule>> {
        self.config_manager
            .list_material_rules()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    /// 新增或覆盖产品型号的材料规则
    ///
    /// # 说明
    /// - 只影响之后录入的生产记录,已有记录的耗料不变
    pub fn set_material_rule(&self, product_type: &str, steel_type: &str, kg_per_unit: f64) -> ApiResult<()> {
        validator::validate_label("产品型号", product_type)?;
        validator::validate_label("钢种", steel_type)?;
        validator::validate_quantity_kg("单件耗料", kg_per_unit)?;

        let rule = MaterialRule::new(SteelType::new(steel_type), kg_per_unit);
        self.config_manager
            .set_material_rule(product_type, &rule)
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        info!(product_type, steel_type, kg_per_unit, "材料规则已更新");
        Ok(())
    }

    /// 当前库存预警阈值
    pub async fn get_stock_thresholds(&self) -> ApiResult<StockThresholds> {
        self.config_manager
            .get_stock_thresholds()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    /// 更新库存预警阈值
    ///
    /// # 校验
    /// - 均为非负有限数,且 urgent <= low <= medium
    pub fn update_stock_thresholds(&self, thresholds: StockThresholds) -> ApiResult<()> {
        let values = [thresholds.urgent_kg, thresholds.low_kg, thresholds.medium_kg];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ApiError::InvalidInput(format!("库存阈值必须为非负数: {:?}", thresholds)));
        }
        if !(thresholds.urgent_kg <= thresholds.low_kg && thresholds.low_kg <= thresholds.medium_kg) {
            return Err(ApiError::InvalidInput(format!(
                "库存阈值必须满足 urgent <= low <= medium: {:?}",
                thresholds
            )));
        }

        for (key, value) in [
            (config_keys::STOCK_THRESHOLD_URGENT_KG, thresholds.urgent_kg),
            (config_keys::STOCK_THRESHOLD_LOW_KG, thresholds.low_kg),
            (config_keys::STOCK_THRESHOLD_MEDIUM_KG, thresholds.medium_kg),
        ] {
            self.config_manager
                .set_config_value(key, &value.to_string())
                .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        }

        info!(?thresholds, "库存预警阈值已更新");
        Ok(())
    }

    /// 更新驾驶舱最近记录条数
    pub fn set_dashboard_recent_limit(&self, limit: usize) -> ApiResult<()> {
        if limit == 0 {
            return Err(ApiError::InvalidInput("最近记录条数必须大于0".to_string()));
        }
        self.config_manager
            .set_config_value(config_keys::DASHBOARD_RECENT_LIMIT, &limit.to_string())
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    /// 配置快照（JSON）
    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        self.config_manager
            .get_config_snapshot()
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }
}
