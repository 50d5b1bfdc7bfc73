// ==========================================
// 钢材炉号库存台账 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 核心: 按炉号 FIFO 领料,删除生产记录时无损回冲
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - FIFO 领料 / 回冲
pub mod engine;

// 配置层 - 材料规则与阈值
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型与实体
pub use domain::{
    DashboardData, Heat, HeatUpdate, InventoryStatus, LedgerBalance, MaterialRule, NewHeat,
    NewProduction, Production, ProductionDeletion, StockLevel, StockThresholds, SteelType,
};

// 引擎
pub use engine::{AllocationEngine, AllocationError, AllocationReport, HeatLedger, RestorationReport};

// API
pub use api::{ApiError, ApiResult, ConfigApi, DashboardApi, HeatApi, ProductionApi};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "钢材炉号库存台账";
