// ==========================================
// 钢材炉号库存台账 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod heat;
pub mod inventory;
pub mod production;
pub mod types;

// 重导出核心类型
pub use heat::{Heat, HeatUpdate, NewHeat};
pub use inventory::{
    DashboardData, HeatStockDetail, InventoryStatus, LedgerBalance, ProductTotal, StockThresholds,
};
pub use production::{MaterialRule, NewProduction, Production, ProductionDeletion};
pub use types::{clamp_near_zero, round_kg, StockLevel, SteelType, KG_EPSILON};
