// ==========================================
// 钢材炉号库存台账 - API 层
// ==========================================
// 职责: 提供类型化业务 API,供上层（命令行/传输层）调用
// ==========================================

pub mod config_api;
pub mod dashboard_api;
pub mod error;
pub mod heat_api;
pub mod production_api;
pub mod validator;

// 重导出核心类型
pub use config_api::ConfigApi;
pub use dashboard_api::DashboardApi;
pub use error::{ApiError, ApiResult};
pub use heat_api::HeatApi;
pub use production_api::ProductionApi;
