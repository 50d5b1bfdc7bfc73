// ==========================================
// 钢材炉号库存台账 - 库存视图模型
// ==========================================
// 用途: 驾驶舱/库存状态只读视图,不参与领料计算
// ==========================================

use crate::domain::heat::Heat;
use crate::domain::production::Production;
use crate::domain::types::{clamp_near_zero, StockLevel, SteelType};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 台账平衡校验容差（kg）
pub const BALANCE_TOLERANCE_KG: f64 = 0.01;

// ==========================================
// StockThresholds - 库存预警阈值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockThresholds {
    pub urgent_kg: f64, // 低于此值: URGENT
    pub low_kg: f64,    // 低于此值: LOW（同时触发低库存预警）
    pub medium_kg: f64, // 低于此值: MEDIUM
}

impl Default for StockThresholds {
    fn default() -> Self {
        Self {
            urgent_kg: 50.0,
            low_kg: 100.0,
            medium_kg: 200.0,
        }
    }
}

impl StockThresholds {
    pub fn classify(&self, current_stock_kg: f64) -> StockLevel {
        if current_stock_kg < self.urgent_kg {
            StockLevel::Urgent
        } else if current_stock_kg < self.low_kg {
            StockLevel::Low
        } else if current_stock_kg < self.medium_kg {
            StockLevel::Medium
        } else {
            StockLevel::Good
        }
    }

    pub fn is_low_stock(&self, current_stock_kg: f64) -> bool {
        current_stock_kg < self.low_kg
    }
}

// ==========================================
// HeatStockDetail - 单炉号库存明细
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatStockDetail {
    pub heat_id: String,
    pub heat_number: String,
    pub original_quantity_kg: f64,
    pub remaining_quantity_kg: f64,
    pub date_received: NaiveDate,
}

impl From<&Heat> for HeatStockDetail {
    fn from(heat: &Heat) -> Self {
        Self {
            heat_id: heat.heat_id.clone(),
            heat_number: heat.heat_number.clone(),
            original_quantity_kg: heat.quantity_kg,
            remaining_quantity_kg: heat.remaining_kg,
            date_received: heat.date_received,
        }
    }
}

// ==========================================
// InventoryStatus - 钢种库存状态
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryStatus {
    pub steel_type: SteelType,
    pub total_received_kg: f64,
    pub total_consumed_kg: f64,
    pub current_stock_kg: f64,
    pub heats: Vec<HeatStockDetail>,
    pub stock_level: StockLevel,
    pub low_stock_alert: bool,
    pub reorder_recommendation: String,
}

impl InventoryStatus {
    /// 由某钢种的全部炉号汇总库存状态
    pub fn from_heats(steel_type: SteelType, heats: &[Heat], thresholds: &StockThresholds) -> Self {
        let total_received_kg: f64 = heats.iter().map(|h| h.quantity_kg).sum();
        let current_stock_kg: f64 = heats.iter().map(|h| h.remaining_kg).sum();
        let total_consumed_kg = clamp_near_zero(total_received_kg - current_stock_kg);
        let stock_level = thresholds.classify(current_stock_kg);

        Self {
            steel_type,
            total_received_kg,
            total_consumed_kg,
            current_stock_kg,
            heats: heats.iter().map(HeatStockDetail::from).collect(),
            stock_level,
            low_stock_alert: thresholds.is_low_stock(current_stock_kg),
            reorder_recommendation: stock_level.recommendation().to_string(),
        }
    }
}

// ==========================================
// ProductTotal - 产品产量汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTotal {
    pub product_type: String,
    pub total_quantity: u64,
    pub total_material_kg: f64,
}

// ==========================================
// DashboardData - 驾驶舱数据
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardData {
    pub inventory_status: Vec<InventoryStatus>,
    pub recent_productions: Vec<Production>,
    pub recent_heats: Vec<Heat>,
    pub production_totals: Vec<ProductTotal>,
}

// ==========================================
// LedgerBalance - 台账平衡校验结果
// ==========================================
// 校验: sum(remaining) == sum(quantity) - sum(有效生产记录耗料)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerBalance {
    pub steel_type: SteelType,
    pub total_received_kg: f64,
    pub total_remaining_kg: f64,
    pub total_consumed_by_productions_kg: f64,
    pub drift_kg: f64, // 正数: 台账剩余偏多; 负数: 偏少
    pub balanced: bool,
}

impl LedgerBalance {
    pub fn compute(
        steel_type: SteelType,
        total_received_kg: f64,
        total_remaining_kg: f64,
        total_consumed_by_productions_kg: f64,
    ) -> Self {
        let expected_remaining = total_received_kg - total_consumed_by_productions_kg;
        let drift_kg = clamp_near_zero(total_remaining_kg - expected_remaining);
        Self {
            steel_type,
            total_received_kg,
            total_remaining_kg,
            total_consumed_by_productions_kg,
            drift_kg,
            balanced: drift_kg.abs() < BALANCE_TOLERANCE_KG,
        }
    }
}
