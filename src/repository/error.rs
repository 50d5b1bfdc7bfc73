// ==========================================
// 钢材炉号库存台账 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 台账守卫错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("唯一键重复: {field}={value}")]
    DuplicateKey { field: String, value: String },

    #[error("更正数量低于已消耗量: heat_id={heat_id}, consumed={consumed_kg}kg, requested={requested_kg}kg")]
    BelowConsumed {
        heat_id: String,
        consumed_kg: f64,
        requested_kg: f64,
    },

    #[error("炉号已被领用,禁止删除: heat_id={heat_id}, consumed={consumed_kg}kg")]
    HasConsumption { heat_id: String, consumed_kg: f64 },

    #[error("炉号已被领用,禁止变更钢种: heat_id={heat_id}, {from} -> {to}, consumed={consumed_kg}kg")]
    SteelTypeLocked {
        heat_id: String,
        from: String,
        to: String,
        consumed_kg: f64,
    },

    // ===== 并发控制错误 =====
    #[error("炉号剩余量已被修改: heat_id={heat_id}, expected={expected_kg}kg, actual={actual_kg}kg")]
    StaleHeatState {
        heat_id: String,
        expected_kg: f64,
        actual_kg: f64,
    },

    // ===== 数据库错误 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    // ===== 数据质量错误 =====
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("字段值错误 (field={field}): {message}")]
    FieldValueError { field: String, message: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    pub fn heat_not_found(heat_id: &str) -> Self {
        RepositoryError::NotFound {
            entity: "Heat".to_string(),
            id: heat_id.to_string(),
        }
    }

    pub fn production_not_found(production_id: &str) -> Self {
        RepositoryError::NotFound {
            entity: "Production".to_string(),
            id: production_id.to_string(),
        }
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if msg.contains("UNIQUE") {
                    RepositoryError::UniqueConstraintViolation(msg)
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
