// ==========================================
// 钢材炉号库存台账 - 驾驶舱 API
// ==========================================
// 职责: 钢种库存状态、驾驶舱聚合查询、台账平衡校验
// 红线: 钢种集合来自配置规则 + 台账数据,不写死
// ==========================================

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::InventoryConfigReader;
use crate::domain::inventory::{DashboardData, InventoryStatus, LedgerBalance};
use crate::domain::types::SteelType;
use crate::repository::{HeatRepository, ProductionRepository};

// ==========================================
// DashboardApi - 驾驶舱 API
// ==========================================

/// 驾驶舱API
///
/// 职责：
/// 1. 按钢种汇总库存与预警
/// 2. 最近生产/到货记录与产量汇总
/// 3. 台账平衡校验（reconcile）
pub struct DashboardApi {
    heat_repo: Arc<HeatRepository>,
    production_repo: Arc<ProductionRepository>,
    config: Arc<dyn InventoryConfigReader>,
}

impl DashboardApi {
    /// 创建新的DashboardApi实例
    pub fn new(
        heat_repo: Arc<HeatRepository>,
        production_repo: Arc<ProductionRepository>,
        config: Arc<dyn InventoryConfigReader>,
    ) -> Self {
        Self {
            heat_repo,
            production_repo,
            config,
        }
    }

    /// 需要展示的钢种: 材料规则中的钢种 ∪ 台账中出现过的钢种
    async fn known_steel_types(&self) -> ApiResult<BTreeSet<SteelType>> {
        let rules = self
            .config
            .list_material_rules()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let mut steel_types: BTreeSet<SteelType> =
            rules.into_values().map(|rule| rule.steel_type).collect();
        steel_types.extend(self.heat_repo.list_steel_types()?);
        Ok(steel_types)
    }

    /// 各钢种库存状态
    ///
    /// # 返回
    /// - 每个钢种: 到货合计、已消耗、当前库存、炉号明细、预警等级与补货建议
    pub async fn inventory_status(&self) -> ApiResult<Vec<InventoryStatus>> {
        let thresholds = self
            .config
            .get_stock_thresholds()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let mut statuses = Vec::new();
        for steel_type in self.known_steel_types().await? {
            let heats = self.heat_repo.heats_all(&steel_type)?;
            let status = InventoryStatus::from_heats(steel_type, &heats, &thresholds);
            debug!(
                steel_type = %status.steel_type,
                current_stock_kg = status.current_stock_kg,
                stock_level = %status.stock_level,
                "钢种库存"
            );
            statuses.push(status);
        }
        Ok(statuses)
    }

    /// 驾驶舱聚合数据
    pub async fn dashboard(&self) -> ApiResult<DashboardData> {
        let limit = self
            .config
            .get_dashboard_recent_limit()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        Ok(DashboardData {
            inventory_status: self.inventory_status().await?,
            recent_productions: self.production_repo.list_recent(limit)?,
            recent_heats: self.heat_repo.list_recent(limit)?,
            production_totals: self.production_repo.totals_by_product_type()?,
        })
    }

    /// 台账平衡校验
    ///
    /// 每个钢种校验 sum(remaining) == sum(quantity) - sum(有效生产记录耗料)
    pub async fn reconcile(&self) -> ApiResult<Vec<LedgerBalance>> {
        let mut steel_types = self.known_steel_types().await?;
        steel_types.extend(self.production_repo.list_steel_types()?);

        let mut balances = Vec::new();
        for steel_type in steel_types {
            let heats = self.heat_repo.heats_all(&steel_type)?;
            let received: f64 = heats.iter().map(|h| h.quantity_kg).sum();
            let remaining: f64 = heats.iter().map(|h| h.remaining_kg).sum();
            let consumed = self.production_repo.total_consumed_for(&steel_type)?;

            let balance = LedgerBalance::compute(steel_type, received, remaining, consumed);
            if !balance.balanced {
                warn!(
                    steel_type = %balance.steel_type,
                    drift_kg = balance.drift_kg,
                    "台账不平衡"
                );
            }
            balances.push(balance);
        }
        Ok(balances)
    }
}
