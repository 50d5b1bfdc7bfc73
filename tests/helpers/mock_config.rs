// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use heat_inventory::config::{ConfigResult, InventoryConfigReader};
use heat_inventory::domain::{MaterialRule, StockThresholds};
use std::collections::BTreeMap;

/// 测试钢种 A（1 kg/件,便于按公斤直接换算）
pub const GAUGE_A: &str = "20.64mm";
/// 测试钢种 B
pub const GAUGE_B: &str = "23mm";

/// 1 件 = 1kg 的测试产品型号
pub const PRODUCT_A_1KG: &str = "TEST-A";
pub const PRODUCT_B_1KG: &str = "TEST-B";

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub rules: BTreeMap<String, MaterialRule>,
    pub thresholds: StockThresholds,
    pub recent_limit: usize,
}

impl MockConfig {
    /// 创建默认配置
    ///
    /// - TEST-A → 20.64mm @ 1kg/件
    /// - TEST-B → 23mm @ 1kg/件
    pub fn default() -> Self {
        let mut rules = BTreeMap::new();
        rules.insert(PRODUCT_A_1KG.to_string(), MaterialRule::new(GAUGE_A, 1.0));
        rules.insert(PRODUCT_B_1KG.to_string(), MaterialRule::new(GAUGE_B, 1.0));
        Self {
            rules,
            thresholds: StockThresholds::default(),
            recent_limit: 10,
        }
    }

    /// 追加材料规则
    pub fn with_rule(mut self, product_type: &str, steel_type: &str, kg_per_unit: f64) -> Self {
        self.rules
            .insert(product_type.to_string(), MaterialRule::new(steel_type, kg_per_unit));
        self
    }

    /// 设置驾驶舱最近记录条数
    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }
}

#[async_trait]
impl InventoryConfigReader for MockConfig {
    async fn get_material_rule(&self, product_type: &str) -> ConfigResult<Option<MaterialRule>> {
        Ok(self.rules.get(product_type).cloned())
    }

    async fn list_material_rules(&self) -> ConfigResult<BTreeMap<String, MaterialRule>> {
        Ok(self.rules.clone())
    }

    async fn get_stock_thresholds(&self) -> ConfigResult<StockThresholds> {
        Ok(self.thresholds)
    }

    async fn get_dashboard_recent_limit(&self) -> ConfigResult<usize> {
        Ok(self.recent_limit)
    }
}
