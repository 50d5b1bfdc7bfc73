// ==========================================
// 钢材炉号库存台账 - 领域类型定义
// ==========================================
// 红线: 钢种只是分区键,引擎不得硬编码钢种集合
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 重量比较容差（kg）
///
/// 浮点扣减后出现的 -1e-12 之类的残差一律视为 0
pub const KG_EPSILON: f64 = 1e-9;

/// 将接近 0 的数量（含微小负数）归一为精确的 0.0
pub fn clamp_near_zero(value_kg: f64) -> f64 {
    if value_kg.abs() < KG_EPSILON {
        0.0
    } else {
        value_kg
    }
}

/// 重量按克取整（保留 3 位小数）
pub fn round_kg(value_kg: f64) -> f64 {
    (value_kg * 1000.0).round() / 1000.0
}

// ==========================================
// 钢种 (Steel Type / Gauge)
// ==========================================
// 不可互换的材料池分区键,例如 "20.64mm" / "23mm"
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SteelType(String);

impl SteelType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SteelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SteelType {
    fn from(value: &str) -> Self {
        SteelType::new(value)
    }
}

impl From<String> for SteelType {
    fn from(value: String) -> Self {
        SteelType::new(value)
    }
}

// ==========================================
// 库存等级 (Stock Level)
// ==========================================
// 依据当前库存与配置阈值判定,用于补货建议
// 序列化格式: SCREAMING_SNAKE_CASE
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockLevel {
    Urgent, // 立即补货
    Low,    // 低库存
    Medium, // 关注
    Good,   // 充足
}

impl StockLevel {
    /// 补货建议文案
    pub fn recommendation(&self) -> &'static str {
        match self {
            StockLevel::Urgent => "紧急: 请立即订货",
            StockLevel::Low => "低库存: 建议尽快订货",
            StockLevel::Medium => "中等库存: 密切关注",
            StockLevel::Good => "库存充足: 暂无需处理",
        }
    }
}

impl fmt::Display for StockLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockLevel::Urgent => write!(f, "URGENT"),
            StockLevel::Low => write!(f, "LOW"),
            StockLevel::Medium => write!(f, "MEDIUM"),
            StockLevel::Good => write!(f, "GOOD"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_near_zero() {
        assert_eq!(clamp_near_zero(-1e-12), 0.0);
        assert_eq!(clamp_near_zero(1e-12), 0.0);
        assert_eq!(clamp_near_zero(-0.5), -0.5);
        assert_eq!(clamp_near_zero(12.5), 12.5);
    }

    #[test]
    fn test_round_kg() {
        assert_eq!(round_kg(93.00000000000001), 93.0);
        assert_eq!(round_kg(57.5004), 57.5);
        assert_eq!(round_kg(0.930 * 3.0), 2.79);
    }

    #[test]
    fn test_steel_type_trims_and_serializes_transparently() {
        let gauge = SteelType::new(" 20.64mm ");
        assert_eq!(gauge.as_str(), "20.64mm");
        assert_eq!(serde_json::to_string(&gauge).unwrap(), "\"20.64mm\"");
    }
}
