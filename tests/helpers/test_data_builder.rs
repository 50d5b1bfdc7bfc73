// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::NaiveDate;
use heat_inventory::domain::{NewHeat, NewProduction, SteelType};

// ==========================================
// NewHeat 构建器
// ==========================================

pub struct HeatBuilder {
    heat_number: String,
    steel_type: String,
    quantity_kg: f64,
    date_received: Option<NaiveDate>,
}

impl HeatBuilder {
    pub fn new(heat_number: &str) -> Self {
        Self {
            heat_number: heat_number.to_string(),
            steel_type: "20.64mm".to_string(),
            quantity_kg: 300.0,
            date_received: None,
        }
    }

    pub fn steel(mut self, steel_type: &str) -> Self {
        self.steel_type = steel_type.to_string();
        self
    }

    pub fn quantity(mut self, quantity_kg: f64) -> Self {
        self.quantity_kg = quantity_kg;
        self
    }

    /// 到货日期（2024-01-{day}）
    pub fn received_day(mut self, day: u32) -> Self {
        self.date_received = NaiveDate::from_ymd_opt(2024, 1, day);
        self
    }

    pub fn build(self) -> NewHeat {
        NewHeat {
            heat_number: self.heat_number,
            steel_type: SteelType::new(self.steel_type),
            quantity_kg: self.quantity_kg,
            date_received: self.date_received,
        }
    }
}

/// 构建录入生产请求
pub fn production(product_type: &str, quantity_produced: u32) -> NewProduction {
    NewProduction {
        production_date: NaiveDate::from_ymd_opt(2024, 2, 1),
        product_type: product_type.to_string(),
        quantity_produced,
    }
}
