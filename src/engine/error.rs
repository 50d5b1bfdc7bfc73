// ==========================================
// 钢材炉号库存台账 - 领料引擎错误类型
// ==========================================
// 红线: 校验类错误必须在任何写入之前被发现
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::SteelType;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 领料引擎错误类型
#[derive(Error, Debug)]
pub enum AllocationError {
    #[error("无效的领料重量: {0}kg")]
    InvalidAmount(f64),

    #[error("钢种 {steel_type} 无可用库存")]
    OutOfStock { steel_type: SteelType },

    #[error("库存不足: steel_type={steel_type}, 可用={available_kg:.2}kg, 需要={required_kg:.2}kg")]
    InsufficientStock {
        steel_type: SteelType,
        available_kg: f64,
        required_kg: f64,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type AllocationResult<T> = Result<T, AllocationError>;
