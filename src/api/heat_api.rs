// ==========================================
// 钢材炉号库存台账 - 炉号 API
// ==========================================
// 职责: 炉号入库、查询、更正、删除
// 红线: 更正/删除经由领料引擎,与领料共用钢种锁
// ==========================================

use std::sync::Arc;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator;
use crate::domain::heat::{Heat, HeatUpdate, NewHeat};
use crate::domain::types::SteelType;
use crate::engine::AllocationEngine;
use crate::repository::HeatRepository;

// ==========================================
// HeatApi - 炉号 API
// ==========================================

/// 炉号API
///
/// 职责：
/// 1. 新增炉号（remaining = quantity）
/// 2. 炉号查询（全部倒序 / 按钢种 FIFO 顺序）
/// 3. 炉号更正（数量不得低于已消耗量）
/// 4. 删除从未领用的炉号
pub struct HeatApi {
    heat_repo: Arc<HeatRepository>,
    engine: Arc<AllocationEngine<HeatRepository>>,
}

impl HeatApi {
    /// 创建新的HeatApi实例
    ///
    /// # 参数
    /// - heat_repo: 炉号仓储
    /// - engine: 领料引擎（与 ProductionApi 共享同一实例）
    pub fn new(heat_repo: Arc<HeatRepository>, engine: Arc<AllocationEngine<HeatRepository>>) -> Self {
        Self { heat_repo, engine }
    }

    /// 新增炉号
    ///
    /// # 返回
    /// - Ok(Heat): 新炉号（含 heat_id / seq_no）
    /// - Err(ApiError::DuplicateKey): 炉号已存在
    /// - Err(ApiError::InvalidInput): 入参非法
    pub fn create_heat(&self, req: NewHeat) -> ApiResult<Heat> {
        validator::validate_new_heat(&req)?;

        let today = chrono::Local::now().date_naive();
        let heat = self.heat_repo.insert(&req.into_heat(today))?;

        info!(
            heat_id = %heat.heat_id,
            heat_number = %heat.heat_number,
            steel_type = %heat.steel_type,
            quantity_kg = heat.quantity_kg,
            "炉号已入库"
        );
        Ok(heat)
    }

    /// 全部炉号（到货日期倒序）
    pub fn list_heats(&self) -> ApiResult<Vec<Heat>> {
        Ok(self.heat_repo.list_all()?)
    }

    /// 查询单个炉号
    pub fn get_heat(&self, heat_id: &str) -> ApiResult<Heat> {
        validator::validate_id("炉号ID", heat_id)?;
        self.heat_repo
            .find_by_id(heat_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Heat(id={})不存在", heat_id)))
    }

    /// 某钢种全部炉号（FIFO 顺序）
    pub fn list_heats_by_steel_type(&self, steel_type: &str) -> ApiResult<Vec<Heat>> {
        validator::validate_label("钢种", steel_type)?;
        Ok(self.heat_repo.heats_all(&SteelType::new(steel_type))?)
    }

    /// 更正炉号
    ///
    /// # 返回
    /// - Err(ApiError::BelowConsumed): 新数量低于已消耗量（未做修改）
    /// - Err(ApiError::DuplicateKey): 新炉号与其他炉号重复
    /// - Err(ApiError::SteelTypeLocked): 已领用炉号不得变更钢种
    /// - Err(ApiError::NotFound): 炉号不存在
    pub fn update_heat(&self, heat_id: &str, update: HeatUpdate) -> ApiResult<Heat> {
        validator::validate_id("炉号ID", heat_id)?;
        validator::validate_heat_update(&update)?;

        let update = HeatUpdate {
            heat_number: update.heat_number.trim().to_string(),
            steel_type: SteelType::new(update.steel_type.as_str()),
            ..update
        };
        Ok(self.engine.update_heat(heat_id, &update)?)
    }

    /// 仅更正到货重量
    pub fn update_heat_quantity(&self, heat_id: &str, new_quantity_kg: f64) -> ApiResult<Heat> {
        validator::validate_id("炉号ID", heat_id)?;
        validator::validate_quantity_kg("到货重量", new_quantity_kg)?;
        Ok(self.engine.update_heat_quantity(heat_id, new_quantity_kg)?)
    }

    /// 删除炉号
    ///
    /// # 返回
    /// - Ok(Heat): 被删除的炉号
    /// - Err(ApiError::HasConsumption): 已被领用
    /// - Err(ApiError::NotFound): 炉号不存在
    pub fn delete_heat(&self, heat_id: &str) -> ApiResult<Heat> {
        validator::validate_id("炉号ID", heat_id)?;
        Ok(self.engine.delete_heat(heat_id)?)
    }
}
