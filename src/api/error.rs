// ==========================================
// 钢材炉号库存台账 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository/Engine错误为用户友好的错误消息
// ==========================================

use crate::engine::error::AllocationError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 台账守卫错误
    // ==========================================
    #[error("钢种 {steel_type} 无可用库存")]
    OutOfStock { steel_type: String },

    #[error("库存不足: steel_type={steel_type}, 可用={available_kg:.2}kg, 需要={required_kg:.2}kg")]
    InsufficientStock {
        steel_type: String,
        available_kg: f64,
        required_kg: f64,
    },

    #[error("更正数量低于已消耗量: heat_id={heat_id}, 已消耗={consumed_kg}kg, 请求={requested_kg}kg")]
    BelowConsumed {
        heat_id: String,
        consumed_kg: f64,
        requested_kg: f64,
    },

    #[error("炉号已被领用,禁止删除: heat_id={heat_id}, 已消耗={consumed_kg}kg")]
    HasConsumption { heat_id: String, consumed_kg: f64 },

    #[error("炉号已被领用,禁止变更钢种: heat_id={heat_id}, {from} -> {to}, 已消耗={consumed_kg}kg")]
    SteelTypeLocked {
        heat_id: String,
        from: String,
        to: String,
        consumed_kg: f64,
    },

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("唯一键重复: {field}={value}")]
    DuplicateKey { field: String, value: String },

    #[error("未配置材料规则的产品型号: {0}")]
    UnknownProductType(String),

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("乐观锁冲突: {0}")]
    OptimisticLockFailure(String),

    // ==========================================
    // 配置/数据访问错误
    // ==========================================
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 台账守卫
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DuplicateKey { field, value } => ApiError::DuplicateKey { field, value },
            RepositoryError::BelowConsumed {
                heat_id,
                consumed_kg,
                requested_kg,
            } => ApiError::BelowConsumed {
                heat_id,
                consumed_kg,
                requested_kg,
            },
            RepositoryError::HasConsumption { heat_id, consumed_kg } => {
                ApiError::HasConsumption { heat_id, consumed_kg }
            }
            RepositoryError::SteelTypeLocked {
                heat_id,
                from,
                to,
                consumed_kg,
            } => ApiError::SteelTypeLocked {
                heat_id,
                from,
                to,
                consumed_kg,
            },

            // 并发控制错误
            RepositoryError::StaleHeatState {
                heat_id,
                expected_kg,
                actual_kg,
            } => ApiError::OptimisticLockFailure(format!(
                "炉号{}已被其他操作修改（期望剩余={}kg，实际剩余={}kg）",
                heat_id, expected_kg, actual_kg
            )),

            // 数据库错误
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseTransactionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }

            // 数据质量错误
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 AllocationError 转换
// ==========================================
impl From<AllocationError> for ApiError {
    fn from(err: AllocationError) -> Self {
        match err {
            AllocationError::InvalidAmount(kg) => {
                ApiError::InvalidInput(format!("领料重量必须为正数: {}kg", kg))
            }
            AllocationError::OutOfStock { steel_type } => ApiError::OutOfStock {
                steel_type: steel_type.to_string(),
            },
            AllocationError::InsufficientStock {
                steel_type,
                available_kg,
                required_kg,
            } => ApiError::InsufficientStock {
                steel_type: steel_type.to_string(),
                available_kg,
                required_kg,
            },
            AllocationError::Repository(e) => ApiError::from(e),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
