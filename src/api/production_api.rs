// ==========================================
// 钢材炉号库存台账 - 生产记录 API
// ==========================================
// 职责: 录入生产（规则换算 → FIFO 领料 → 落库）、删除生产（回冲 → 删除）
// 红线:
// - 领料失败不落库生产记录
// - 生产记录落库失败必须回冲已扣减的重量
// - 回冲不足（台账漂移）不阻断删除,以 partial 标记返回
// ==========================================

use std::sync::{Arc, Mutex};
use tracing::{error, info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::config::InventoryConfigReader;
use crate::domain::production::{NewProduction, Production, ProductionDeletion};
use crate::engine::AllocationEngine;
use crate::repository::{HeatRepository, ProductionRepository};

// ==========================================
// ProductionApi - 生产记录 API
// ==========================================

/// 生产记录API
///
/// 职责：
/// 1. 录入生产并按 FIFO 扣减炉号
/// 2. 删除生产并回冲其耗料
/// 3. 生产记录查询
pub struct ProductionApi {
    production_repo: Arc<ProductionRepository>,
    engine: Arc<AllocationEngine<HeatRepository>>,
    config: Arc<dyn InventoryConfigReader>,
    // 串行化删除,避免同一记录被重复回冲
    delete_guard: Mutex<()>,
}

impl ProductionApi {
    /// 创建新的ProductionApi实例
    ///
    /// # 参数
    /// - production_repo: 生产记录仓储
    /// - engine: 领料引擎
    /// - config: 配置读取器（材料规则）
    pub fn new(
        production_repo: Arc<ProductionRepository>,
        engine: Arc<AllocationEngine<HeatRepository>>,
        config: Arc<dyn InventoryConfigReader>,
    ) -> Self {
        Self {
            production_repo,
            engine,
            config,
            delete_guard: Mutex::new(()),
        }
    }

    /// 录入生产
    ///
    /// # 流程
    /// 1. 按产品型号查材料规则 → 钢种 + 耗料
    /// 2. FIFO 领料（库存不足时不做任何修改）
    /// 3. 写入生产记录,失败时回冲
    ///
    /// # 返回
    /// - Err(ApiError::UnknownProductType): 产品型号未配置规则
    /// - Err(ApiError::InvalidInput): 耗料按克取整为 0
    /// - Err(ApiError::OutOfStock / InsufficientStock): 库存不足
    #[instrument(skip(self, req), fields(product_type = %req.product_type, quantity = req.quantity_produced))]
    pub async fn record_production(&self, req: NewProduction) -> ApiResult<Production> {
        validator::validate_new_production(&req)?;
        let product_type = req.product_type.trim().to_string();

        let rule = self
            .config
            .get_material_rule(&product_type)
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?
            .ok_or_else(|| ApiError::UnknownProductType(product_type.clone()))?;

        let consumed_kg = rule.consumption_for(req.quantity_produced);
        if consumed_kg <= 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "产品型号 {} 单件耗料 {}kg × {} 件按克取整为 0kg,请检查材料规则",
                product_type, rule.kg_per_unit, req.quantity_produced
            )));
        }
        let report = self.engine.allocate(&rule.steel_type, consumed_kg)?;

        let production = Production {
            production_id: uuid::Uuid::new_v4().to_string(),
            production_date: req
                .production_date
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
            product_type,
            steel_type: rule.steel_type.clone(),
            quantity_produced: req.quantity_produced,
            material_consumed_kg: consumed_kg,
            created_at: chrono::Utc::now(),
        };

        if let Err(insert_err) = self.production_repo.insert(&production) {
            warn!(error = %insert_err, consumed_kg, "生产记录写入失败,回冲已扣减重量");
            match self.engine.reverse(&rule.steel_type, consumed_kg) {
                Ok(restoration) if restoration.is_partial() => {
                    error!(
                        unrestored_kg = restoration.unrestored_kg,
                        "补偿回冲未能全部回补"
                    );
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, consumed_kg, "补偿回冲失败,台账存在漂移"),
            }
            return Err(insert_err.into());
        }

        info!(
            production_id = %production.production_id,
            steel_type = %production.steel_type,
            material_consumed_kg = consumed_kg,
            heats_touched = report.deductions.len(),
            "生产记录已录入"
        );
        Ok(production)
    }

    /// 全部生产记录（生产日期倒序）
    pub fn list_productions(&self) -> ApiResult<Vec<Production>> {
        Ok(self.production_repo.list_all()?)
    }

    /// 查询单条生产记录
    pub fn get_production(&self, production_id: &str) -> ApiResult<Production> {
        validator::validate_id("生产记录ID", production_id)?;
        self.production_repo
            .find_by_id(production_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Production(id={})不存在", production_id)))
    }

    /// 删除生产记录
    ///
    /// # 流程
    /// 1. 读取记录的钢种与耗料
    /// 2. 回冲（最早优先,按 room 封顶）
    /// 3. 删除记录; 删除失败时重新扣减已回补的重量
    ///
    /// # 返回
    /// - Ok(ProductionDeletion): partial = true 表示台账漂移,回冲不足
    /// - Err(ApiError::NotFound): 记录不存在
    #[instrument(skip(self))]
    pub fn delete_production(&self, production_id: &str) -> ApiResult<ProductionDeletion> {
        validator::validate_id("生产记录ID", production_id)?;

        let _guard = self
            .delete_guard
            .lock()
            .map_err(|e| ApiError::InternalError(format!("删除锁获取失败: {}", e)))?;

        let production = self.get_production(production_id)?;
        let restoration = self
            .engine
            .reverse(&production.steel_type, production.material_consumed_kg)?;

        if let Err(delete_err) = self.production_repo.delete(production_id) {
            warn!(error = %delete_err, "生产记录删除失败,撤销回冲");
            if restoration.restored_kg > 0.0 {
                if let Err(e) = self
                    .engine
                    .allocate(&production.steel_type, restoration.restored_kg)
                {
                    error!(
                        error = %e,
                        restored_kg = restoration.restored_kg,
                        "撤销回冲失败,台账存在漂移"
                    );
                }
            }
            return Err(delete_err.into());
        }

        let deletion = ProductionDeletion {
            production_id: production.production_id,
            steel_type: production.steel_type,
            material_restored_kg: restoration.restored_kg,
            material_unrestored_kg: restoration.unrestored_kg,
            partial: restoration.is_partial(),
        };

        if deletion.partial {
            warn!(
                material_unrestored_kg = deletion.material_unrestored_kg,
                "生产记录已删除,但耗料未能全部回补"
            );
        } else {
            info!(material_restored_kg = deletion.material_restored_kg, "生产记录已删除");
        }
        Ok(deletion)
    }
}
