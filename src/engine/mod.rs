// ==========================================
// 钢材炉号库存台账 - 引擎层
// ==========================================
// 职责: FIFO 领料与回冲,不拼 SQL
// 红线: Engine 只通过 HeatLedger 读写炉号台账
// ==========================================

pub mod allocation;
pub mod error;
pub mod gauge_lock;
pub mod ledger;

// 重导出核心引擎
pub use allocation::{
    plan_allocation, plan_restoration, AllocationEngine, AllocationReport, HeatMovement,
    RestorationReport,
};
pub use error::{AllocationError, AllocationResult};
pub use gauge_lock::GaugeLocks;
pub use ledger::HeatLedger;
