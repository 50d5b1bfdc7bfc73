// ==========================================
// 钢材炉号库存台账 - 输入校验器
// ==========================================
// 职责: API 入参的格式校验（在任何写入之前执行）
// 红线: 只做无状态校验,存在性/唯一性由仓储层事务内判定
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::heat::{HeatUpdate, NewHeat};
use crate::domain::production::NewProduction;
use crate::domain::types::SteelType;

/// 炉号/钢种/产品型号最大长度
pub const MAX_LABEL_LEN: usize = 64;

/// 校验重量: 必须为有限正数
pub fn validate_quantity_kg(field: &str, quantity_kg: f64) -> ApiResult<()> {
    if !quantity_kg.is_finite() || quantity_kg <= 0.0 {
        return Err(ApiError::InvalidInput(format!(
            "{}必须为正数: {}",
            field, quantity_kg
        )));
    }
    Ok(())
}

/// 校验文本标签: 去除首尾空白后非空且不超长
pub fn validate_label(field: &str, value: &str) -> ApiResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    if trimmed.chars().count() > MAX_LABEL_LEN {
        return Err(ApiError::InvalidInput(format!(
            "{}长度不能超过{}个字符",
            field, MAX_LABEL_LEN
        )));
    }
    Ok(())
}

fn validate_steel_type(steel_type: &SteelType) -> ApiResult<()> {
    validate_label("钢种", steel_type.as_str())
}

/// 校验 ID 参数
pub fn validate_id(field: &str, id: &str) -> ApiResult<()> {
    if id.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(())
}

/// 校验新增炉号请求
pub fn validate_new_heat(req: &NewHeat) -> ApiResult<()> {
    validate_label("炉号", &req.heat_number)?;
    validate_steel_type(&req.steel_type)?;
    validate_quantity_kg("到货重量", req.quantity_kg)
}

/// 校验炉号更正请求
pub fn validate_heat_update(req: &HeatUpdate) -> ApiResult<()> {
    validate_label("炉号", &req.heat_number)?;
    validate_steel_type(&req.steel_type)?;
    validate_quantity_kg("到货重量", req.quantity_kg)
}

/// 校验录入生产请求
pub fn validate_new_production(req: &NewProduction) -> ApiResult<()> {
    validate_label("产品型号", &req.product_type)?;
    if req.quantity_produced == 0 {
        return Err(ApiError::InvalidInput("产量必须大于0".to_string()));
    }
    Ok(())
}
