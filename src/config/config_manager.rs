// ==========================================
// 钢材炉号库存台账 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::inventory_config_trait::{ConfigResult, InventoryConfigReader};
use crate::domain::inventory::StockThresholds;
use crate::domain::production::MaterialRule;
use crate::domain::types::round_kg;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    /// 材料规则前缀: material_rule/{product_type} → {"steel_type": "...", "kg_per_unit": 0.93}
    pub const MATERIAL_RULE_PREFIX: &str = "material_rule/";

    pub const STOCK_THRESHOLD_URGENT_KG: &str = "stock_threshold_urgent_kg";
    pub const STOCK_THRESHOLD_LOW_KG: &str = "stock_threshold_low_kg";
    pub const STOCK_THRESHOLD_MEDIUM_KG: &str = "stock_threshold_medium_kg";

    pub const DASHBOARD_RECENT_LIMIT: &str = "dashboard_recent_limit";
}

const DEFAULT_DASHBOARD_RECENT_LIMIT: usize = 10;

/// 内置材料规则（可被 config_kv 覆写或扩充）
pub fn default_material_rules() -> BTreeMap<String, MaterialRule> {
    let mut rules = BTreeMap::new();
    rules.insert("MK-III".to_string(), MaterialRule::new("20.64mm", 0.930));
    rules.insert("MK-V".to_string(), MaterialRule::new("23mm", 1.15));
    rules
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 写入某产品型号的材料规则
    pub fn set_material_rule(&self, product_type: &str, rule: &MaterialRule) -> ConfigResult<()> {
        let product_type = product_type.trim();
        if product_type.is_empty() {
            return Err("产品型号不能为空".into());
        }
        validate_material_rule(product_type, rule)?;

        let key = format!("{}{}", config_keys::MATERIAL_RULE_PREFIX, product_type);
        self.set_config_value(&key, &serde_json::to_string(rule)?)
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_f64_or_default(&self, key: &str, default: f64) -> ConfigResult<f64> {
        match self.get_config_value(key)? {
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("配置值格式错误 (key: {}, value: {}): {}", key, raw, e).into()),
            None => Ok(default),
        }
    }

    fn stored_material_rules(&self) -> ConfigResult<Vec<(String, MaterialRule)>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' AND key LIKE ?1 ORDER BY key",
        )?;
        let pattern = format!("{}%", config_keys::MATERIAL_RULE_PREFIX);
        let rows = stmt.query_map(params![pattern], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut rules = Vec::new();
        for row in rows {
            let (key, raw) = row?;
            // LIKE 不区分大小写且 '_' 为通配符,这里按前缀精确过滤
            let Some(product_type) = key.strip_prefix(config_keys::MATERIAL_RULE_PREFIX) else {
                continue;
            };
            let product_type = product_type.to_string();
            let rule: MaterialRule = serde_json::from_str(&raw)
                .map_err(|e| format!("材料规则格式错误 (key: {}): {}", key, e))?;
            validate_material_rule(&product_type, &rule)?;
            rules.push((product_type, rule));
        }
        Ok(rules)
    }

    fn material_rules(&self) -> ConfigResult<BTreeMap<String, MaterialRule>> {
        let mut rules = default_material_rules();
        for (product_type, rule) in self.stored_material_rules()? {
            rules.insert(product_type, rule);
        }
        Ok(rules)
    }

    fn stock_thresholds(&self) -> ConfigResult<StockThresholds> {
        let defaults = StockThresholds::default();
        let thresholds = StockThresholds {
            urgent_kg: self.get_f64_or_default(config_keys::STOCK_THRESHOLD_URGENT_KG, defaults.urgent_kg)?,
            low_kg: self.get_f64_or_default(config_keys::STOCK_THRESHOLD_LOW_KG, defaults.low_kg)?,
            medium_kg: self.get_f64_or_default(config_keys::STOCK_THRESHOLD_MEDIUM_KG, defaults.medium_kg)?,
        };

        if !(thresholds.urgent_kg <= thresholds.low_kg && thresholds.low_kg <= thresholds.medium_kg) {
            return Err(format!(
                "库存阈值必须满足 urgent <= low <= medium: {:?}",
                thresholds
            )
            .into());
        }
        Ok(thresholds)
    }
}

fn validate_material_rule(product_type: &str, rule: &MaterialRule) -> ConfigResult<()> {
    if rule.steel_type.is_empty() {
        return Err(format!("材料规则 {} 缺少钢种", product_type).into());
    }
    if !rule.kg_per_unit.is_finite() || rule.kg_per_unit <= 0.0 {
        return Err(format!(
            "材料规则 {} 单件耗料必须为正数: {}",
            product_type, rule.kg_per_unit
        )
        .into());
    }
    // 耗料按克记账,单件不足 1g 会取整为 0
    if round_kg(rule.kg_per_unit) <= 0.0 {
        return Err(format!(
            "材料规则 {} 单件耗料 {}kg 不足 1g,按克取整为 0",
            product_type, rule.kg_per_unit
        )
        .into());
    }
    Ok(())
}

#[async_trait]
impl InventoryConfigReader for ConfigManager {
    async fn get_material_rule(&self, product_type: &str) -> ConfigResult<Option<MaterialRule>> {
        Ok(self.material_rules()?.remove(product_type.trim()))
    }

    async fn list_material_rules(&self) -> ConfigResult<BTreeMap<String, MaterialRule>> {
        self.material_rules()
    }

    async fn get_stock_thresholds(&self) -> ConfigResult<StockThresholds> {
        self.stock_thresholds()
    }

    async fn get_dashboard_recent_limit(&self) -> ConfigResult<usize> {
        match self.get_config_value(config_keys::DASHBOARD_RECENT_LIMIT)? {
            Some(raw) => Ok(raw.trim().parse::<usize>().map_err(|e| {
                format!("配置值格式错误 (key: {}, value: {}): {}", config_keys::DASHBOARD_RECENT_LIMIT, raw, e)
            })?),
            None => Ok(DEFAULT_DASHBOARD_RECENT_LIMIT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;
    use crate::domain::types::SteelType;

    fn setup_config() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_default_material_rules() {
        let config = setup_config();

        let mk3 = config.get_material_rule("MK-III").await.unwrap().unwrap();
        assert_eq!(mk3.steel_type, SteelType::new("20.64mm"));
        assert_eq!(mk3.kg_per_unit, 0.930);
        assert!(config.get_material_rule("MK-X").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stored_rule_overrides_and_extends_defaults() {
        let config = setup_config();
        config.set_material_rule("MK-V", &MaterialRule::new("23mm", 1.2)).unwrap();
        config.set_material_rule("MK-X", &MaterialRule::new("30mm", 2.0)).unwrap();

        let rules = config.list_material_rules().await.unwrap();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules["MK-V"].kg_per_unit, 1.2);
        assert_eq!(rules["MK-X"].steel_type, SteelType::new("30mm"));
    }

    #[tokio::test]
    async fn test_invalid_rule_rejected() {
        let config = setup_config();
        assert!(config.set_material_rule("MK-Y", &MaterialRule::new("23mm", 0.0)).is_err());
        assert!(config.set_material_rule("  ", &MaterialRule::new("23mm", 1.0)).is_err());
        // 单件不足 1g
        assert!(config.set_material_rule("MK-Y", &MaterialRule::new("23mm", 0.0004)).is_err());
        assert!(config.set_material_rule("MK-Y", &MaterialRule::new("23mm", 0.001)).is_ok());
    }

    #[tokio::test]
    async fn test_thresholds_and_recent_limit() {
        let config = setup_config();
        assert_eq!(config.get_stock_thresholds().await.unwrap(), StockThresholds::default());
        assert_eq!(config.get_dashboard_recent_limit().await.unwrap(), 10);

        config.set_config_value(config_keys::STOCK_THRESHOLD_LOW_KG, "150").unwrap();
        config.set_config_value(config_keys::DASHBOARD_RECENT_LIMIT, "5").unwrap();
        assert_eq!(config.get_stock_thresholds().await.unwrap().low_kg, 150.0);
        assert_eq!(config.get_dashboard_recent_limit().await.unwrap(), 5);

        config.set_config_value(config_keys::STOCK_THRESHOLD_URGENT_KG, "500").unwrap();
        assert!(config.get_stock_thresholds().await.is_err());
    }

    #[test]
    fn test_config_snapshot() {
        let config = setup_config();
        config.set_config_value(config_keys::DASHBOARD_RECENT_LIMIT, "7").unwrap();
        let snapshot: HashMap<String, String> =
            serde_json::from_str(&config.get_config_snapshot().unwrap()).unwrap();
        assert_eq!(snapshot[config_keys::DASHBOARD_RECENT_LIMIT], "7");
    }
}
