// ==========================================
// 钢材炉号库存台账 - 库存配置读取 Trait
// ==========================================
// 职责: 定义 API 层所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::inventory::StockThresholds;
use crate::domain::production::MaterialRule;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::error::Error;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// InventoryConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait InventoryConfigReader: Send + Sync {
    // ===== 材料规则 =====

    /// 获取某产品型号的材料规则
    ///
    /// # 返回
    /// - Some(MaterialRule): 钢种 + 单件耗料
    /// - None: 未配置的产品型号
    async fn get_material_rule(&self, product_type: &str) -> ConfigResult<Option<MaterialRule>>;

    /// 获取全部材料规则（产品型号 → 规则）
    async fn list_material_rules(&self) -> ConfigResult<BTreeMap<String, MaterialRule>>;

    // ===== 库存预警 =====

    /// 获取库存预警阈值
    ///
    /// # 默认值
    /// - urgent 50kg / low 100kg / medium 200kg
    async fn get_stock_thresholds(&self) -> ConfigResult<StockThresholds>;

    // ===== 驾驶舱 =====

    /// 驾驶舱“最近记录”条数
    ///
    /// # 默认值
    /// - 10
    async fn get_dashboard_recent_limit(&self) -> ConfigResult<usize>;
}
