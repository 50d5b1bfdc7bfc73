// ==========================================
// 钢材炉号库存台账 - 配置层
// ==========================================
// 职责: 系统配置管理（材料规则、库存阈值、驾驶舱参数）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod inventory_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, default_material_rules, ConfigManager};
pub use inventory_config_trait::{ConfigResult, InventoryConfigReader};
