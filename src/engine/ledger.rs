// ==========================================
// 钢材炉号库存台账 - 炉号台账接口
// ==========================================
// 职责: 定义领料引擎所需的存储协作方接口（不包含实现细节）
// 实现者: HeatRepository（SQLite）
// ==========================================

use crate::domain::heat::{Heat, HeatUpdate};
use crate::domain::types::SteelType;
use crate::repository::error::RepositoryResult;
use crate::repository::heat_repo::{CommitOutcome, HeatRepository, MissingHeatPolicy, RemainingUpdate};

// ==========================================
// HeatLedger Trait
// ==========================================
// 约束:
// - 所有列表按 date_received ASC, 创建顺序 ASC 返回
// - commit_remaining 必须整批原子提交
pub trait HeatLedger: Send + Sync {
    /// 有剩余的炉号（领料用）
    fn heats_with_stock(&self, steel_type: &SteelType) -> RepositoryResult<Vec<Heat>>;

    /// 全部炉号（回冲用,剩余为 0 的炉号仍可能有 room）
    fn heats_all(&self, steel_type: &SteelType) -> RepositoryResult<Vec<Heat>>;

    fn find_heat(&self, heat_id: &str) -> RepositoryResult<Option<Heat>>;

    /// 单炉号覆写剩余量; 炉号不存在时返回 NotFound
    fn set_remaining(&self, heat_id: &str, remaining_kg: f64) -> RepositoryResult<()>;

    /// 批量原子写入剩余量
    fn commit_remaining(
        &self,
        updates: &[RemainingUpdate],
        policy: MissingHeatPolicy,
    ) -> RepositoryResult<CommitOutcome>;

    fn exists_by_number(&self, heat_number: &str, excluding_id: Option<&str>) -> RepositoryResult<bool>;

    fn insert(&self, heat: &Heat) -> RepositoryResult<Heat>;

    fn delete_if_untouched(&self, heat_id: &str) -> RepositoryResult<Heat>;

    fn update_heat(&self, heat_id: &str, update: &HeatUpdate) -> RepositoryResult<Heat>;

    fn update_quantity_with_consumption_check(
        &self,
        heat_id: &str,
        new_quantity_kg: f64,
    ) -> RepositoryResult<Heat>;
}

impl HeatLedger for HeatRepository {
    fn heats_with_stock(&self, steel_type: &SteelType) -> RepositoryResult<Vec<Heat>> {
        HeatRepository::heats_with_stock(self, steel_type)
    }

    fn heats_all(&self, steel_type: &SteelType) -> RepositoryResult<Vec<Heat>> {
        HeatRepository::heats_all(self, steel_type)
    }

    fn find_heat(&self, heat_id: &str) -> RepositoryResult<Option<Heat>> {
        self.find_by_id(heat_id)
    }

    fn set_remaining(&self, heat_id: &str, remaining_kg: f64) -> RepositoryResult<()> {
        HeatRepository::set_remaining(self, heat_id, remaining_kg)
    }

    fn commit_remaining(
        &self,
        updates: &[RemainingUpdate],
        policy: MissingHeatPolicy,
    ) -> RepositoryResult<CommitOutcome> {
        HeatRepository::commit_remaining(self, updates, policy)
    }

    fn exists_by_number(&self, heat_number: &str, excluding_id: Option<&str>) -> RepositoryResult<bool> {
        HeatRepository::exists_by_number(self, heat_number, excluding_id)
    }

    fn insert(&self, heat: &Heat) -> RepositoryResult<Heat> {
        HeatRepository::insert(self, heat)
    }

    fn delete_if_untouched(&self, heat_id: &str) -> RepositoryResult<Heat> {
        HeatRepository::delete_if_untouched(self, heat_id)
    }

    fn update_heat(&self, heat_id: &str, update: &HeatUpdate) -> RepositoryResult<Heat> {
        HeatRepository::update_heat(self, heat_id, update)
    }

    fn update_quantity_with_consumption_check(
        &self,
        heat_id: &str,
        new_quantity_kg: f64,
    ) -> RepositoryResult<Heat> {
        HeatRepository::update_quantity_with_consumption_check(self, heat_id, new_quantity_kg)
    }
}
