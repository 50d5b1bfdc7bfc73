// ==========================================
// 钢材炉号库存台账 - 生产记录领域模型
// ==========================================
// 红线: material_consumed_kg 创建后不可变,是回冲的唯一依据
// ==========================================

use crate::domain::types::{round_kg, SteelType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Production - 生产记录
// ==========================================
// 对齐: production 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Production {
    pub production_id: String,
    pub production_date: NaiveDate,
    pub product_type: String,      // 产品型号（引擎不关心）
    pub steel_type: SteelType,     // 创建时由材料规则派生,之后固定
    pub quantity_produced: u32,    // 产量（件）
    pub material_consumed_kg: f64, // 实际扣减的重量
    pub created_at: DateTime<Utc>,
}

// ==========================================
// NewProduction - 录入生产请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduction {
    pub production_date: Option<NaiveDate>, // 为空时取当天
    pub product_type: String,
    pub quantity_produced: u32,
}

// ==========================================
// MaterialRule - 产品材料规则
// ==========================================
// 产品型号 → (钢种, 单件耗料 kg)
// 来源: config_kv（material_rule/{product_type}），缺省值见 ConfigManager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRule {
    pub steel_type: SteelType,
    pub kg_per_unit: f64,
}

impl MaterialRule {
    pub fn new(steel_type: impl Into<SteelType>, kg_per_unit: f64) -> Self {
        Self {
            steel_type: steel_type.into(),
            kg_per_unit,
        }
    }

    /// 计算耗料重量（按克取整）
    pub fn consumption_for(&self, quantity_produced: u32) -> f64 {
        round_kg(f64::from(quantity_produced) * self.kg_per_unit)
    }
}

/// 生产记录删除结果
///
/// material_unrestored_kg > 0 表示台账漂移（炉号被删除或更正）,
/// 删除本身仍然成功
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionDeletion {
    pub production_id: String,
    pub steel_type: SteelType,
    pub material_restored_kg: f64,
    pub material_unrestored_kg: f64,
    pub partial: bool,
}
