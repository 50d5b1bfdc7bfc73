// ==========================================
// 钢材炉号库存台账 - 炉号领域模型
// ==========================================
// 红线: remaining_kg 只能由领料引擎（及数量更正路径）修改
// 不变量: 0 <= remaining_kg <= quantity_kg
// ==========================================

use crate::domain::types::{clamp_near_zero, SteelType};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Heat - 炉号（一批到货钢材）
// ==========================================
// 对齐: heat 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heat {
    // ===== 主键 =====
    pub heat_id: String,     // 不透明唯一标识（创建后不可变）
    pub heat_number: String, // 炉号（业务唯一）

    // ===== 材料池 =====
    pub steel_type: SteelType, // 钢种（分区键）

    // ===== 数量 =====
    pub quantity_kg: f64,  // 到货重量
    pub remaining_kg: f64, // 剩余重量

    // ===== FIFO 排序键 =====
    pub date_received: NaiveDate, // 到货日期
    pub seq_no: i64,              // 创建顺序（同日稳定排序）

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Heat {
    /// 已消耗重量 = 到货 - 剩余
    pub fn consumed_kg(&self) -> f64 {
        clamp_near_zero(self.quantity_kg - self.remaining_kg)
    }

    /// 回冲可容纳的重量（room）
    pub fn room_kg(&self) -> f64 {
        self.consumed_kg()
    }

    /// 是否从未被领用
    pub fn is_untouched(&self) -> bool {
        self.consumed_kg() <= 0.0
    }
}

// ==========================================
// NewHeat - 新增炉号请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHeat {
    pub heat_number: String,
    pub steel_type: SteelType,
    pub quantity_kg: f64,
    pub date_received: Option<NaiveDate>, // 为空时取当天
}

impl NewHeat {
    /// 生成待入库的 Heat（remaining_kg = quantity_kg）
    ///
    /// seq_no 由数据库分配，此处置 0
    pub fn into_heat(self, today: NaiveDate) -> Heat {
        let now = Utc::now();
        Heat {
            heat_id: uuid::Uuid::new_v4().to_string(),
            heat_number: self.heat_number.trim().to_string(),
            steel_type: self.steel_type,
            quantity_kg: self.quantity_kg,
            remaining_kg: self.quantity_kg,
            date_received: self.date_received.unwrap_or(today),
            seq_no: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

// ==========================================
// HeatUpdate - 炉号更正请求
// ==========================================
// 说明: 数量更正会按已消耗量重新推导 remaining_kg
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatUpdate {
    pub heat_number: String,
    pub steel_type: SteelType,
    pub quantity_kg: f64,
    pub date_received: Option<NaiveDate>, // 为空时保持原值
}

impl HeatUpdate {
    /// 仅更正数量，其余字段沿用现值
    pub fn quantity_only(heat: &Heat, new_quantity_kg: f64) -> Self {
        Self {
            heat_number: heat.heat_number.clone(),
            steel_type: heat.steel_type.clone(),
            quantity_kg: new_quantity_kg,
            date_received: Some(heat.date_received),
        }
    }
}
