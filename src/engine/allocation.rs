// ==========================================
// 钢材炉号库存台账 - FIFO 领料 / 回冲引擎
// ==========================================
// 红线:
// - 领料按 date_received 最早优先逐炉扣减
// - 回冲与领料同向（最早优先）,每炉最多回补到 quantity_kg
// - 库存校验在任何写入之前完成
// - 一次领料/回冲的全部写入在同一事务内提交
// ==========================================
// 不变量: 每个钢种 sum(remaining) == sum(quantity) - sum(有效生产记录耗料)
// ==========================================

use crate::domain::heat::{Heat, HeatUpdate};
use crate::domain::types::{clamp_near_zero, SteelType, KG_EPSILON};
use crate::engine::error::{AllocationError, AllocationResult};
use crate::engine::gauge_lock::GaugeLocks;
use crate::engine::ledger::HeatLedger;
use crate::repository::error::RepositoryError;
use crate::repository::heat_repo::{MissingHeatPolicy, RemainingUpdate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// ==========================================
// 结果结构
// ==========================================

/// 单炉号数量变动
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatMovement {
    pub heat_id: String,
    pub heat_number: String,
    pub amount_kg: f64,
    pub remaining_before_kg: f64,
    pub remaining_after_kg: f64,
}

impl HeatMovement {
    fn to_update(&self) -> RemainingUpdate {
        RemainingUpdate {
            heat_id: self.heat_id.clone(),
            expected_remaining_kg: self.remaining_before_kg,
            new_remaining_kg: self.remaining_after_kg,
        }
    }
}

/// 领料结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationReport {
    pub steel_type: SteelType,
    pub requested_kg: f64,
    pub available_before_kg: f64,
    pub deductions: Vec<HeatMovement>,
}

/// 回冲结果
///
/// unrestored_kg > 0 表示台账漂移（炉号已删除或被更正）,属于带告警的成功
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestorationReport {
    pub steel_type: SteelType,
    pub requested_kg: f64,
    pub restored_kg: f64,
    pub unrestored_kg: f64,
    pub restorations: Vec<HeatMovement>,
    pub missing_heat_ids: Vec<String>,
}

impl RestorationReport {
    pub fn is_partial(&self) -> bool {
        self.unrestored_kg > KG_EPSILON
    }
}

// ==========================================
// 纯计算: 逐炉分配
// ==========================================

/// 计算领料扣减（最早优先）
///
/// 调用方保证 heats 已按 FIFO 排序且总剩余 >= amount_kg
pub fn plan_allocation(heats: &[Heat], amount_kg: f64) -> Vec<HeatMovement> {
    let mut deductions = Vec::new();
    let mut remaining_needed = amount_kg;

    for heat in heats {
        if remaining_needed <= 0.0 {
            break;
        }
        if heat.remaining_kg <= 0.0 {
            continue;
        }

        let before = heat.remaining_kg;
        let (taken, after) = if before >= remaining_needed {
            let taken = remaining_needed;
            remaining_needed = 0.0;
            (taken, clamp_near_zero(before - taken))
        } else {
            remaining_needed = clamp_near_zero(remaining_needed - before);
            (before, 0.0)
        };

        deductions.push(HeatMovement {
            heat_id: heat.heat_id.clone(),
            heat_number: heat.heat_number.clone(),
            amount_kg: taken,
            remaining_before_kg: before,
            remaining_after_kg: after,
        });
    }

    deductions
}

/// 计算回冲（最早优先,按 room 封顶）
///
/// # 返回
/// (回补明细, 未能回补的重量)
pub fn plan_restoration(heats: &[Heat], amount_kg: f64) -> (Vec<HeatMovement>, f64) {
    let mut restorations = Vec::new();
    let mut remaining_to_restore = amount_kg;

    for heat in heats {
        if remaining_to_restore <= 0.0 {
            break;
        }
        let room = heat.room_kg();
        if room <= 0.0 {
            continue;
        }

        let restore_amount = remaining_to_restore.min(room);
        let after = (heat.remaining_kg + restore_amount).min(heat.quantity_kg);
        remaining_to_restore = clamp_near_zero(remaining_to_restore - restore_amount);

        restorations.push(HeatMovement {
            heat_id: heat.heat_id.clone(),
            heat_number: heat.heat_number.clone(),
            amount_kg: restore_amount,
            remaining_before_kg: heat.remaining_kg,
            remaining_after_kg: after,
        });
    }

    (restorations, remaining_to_restore.max(0.0))
}

// ==========================================
// AllocationEngine - 领料引擎
// ==========================================
pub struct AllocationEngine<L: HeatLedger> {
    ledger: Arc<L>,
    locks: GaugeLocks,
}

impl<L: HeatLedger> AllocationEngine<L> {
    /// 构造函数
    ///
    /// # 参数
    /// - ledger: 炉号台账（由应用启动时注入）
    pub fn new(ledger: Arc<L>) -> Self {
        Self {
            ledger,
            locks: GaugeLocks::new(),
        }
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    // ==========================================
    // 领料
    // ==========================================

    /// 按 FIFO 从某钢种扣减 amount_kg
    ///
    /// # 返回
    /// - Ok(AllocationReport): 扣减明细
    /// - Err(OutOfStock): 无任何有剩余的炉号
    /// - Err(InsufficientStock): 总剩余不足（未做任何修改）
    #[instrument(skip(self, steel_type), fields(steel_type = %steel_type))]
    pub fn allocate(&self, steel_type: &SteelType, amount_kg: f64) -> AllocationResult<AllocationReport> {
        if !amount_kg.is_finite() || amount_kg <= 0.0 {
            return Err(AllocationError::InvalidAmount(amount_kg));
        }

        self.locks.with_gauge(steel_type, || -> AllocationResult<AllocationReport> {
            let heats = self.ledger.heats_with_stock(steel_type)?;
            if heats.is_empty() {
                return Err(AllocationError::OutOfStock {
                    steel_type: steel_type.clone(),
                });
            }

            let available_kg: f64 = heats.iter().map(|h| h.remaining_kg).sum();
            if available_kg + KG_EPSILON < amount_kg {
                return Err(AllocationError::InsufficientStock {
                    steel_type: steel_type.clone(),
                    available_kg,
                    required_kg: amount_kg,
                });
            }

            let deductions = plan_allocation(&heats, amount_kg);
            for d in &deductions {
                debug!(
                    heat_number = %d.heat_number,
                    amount_kg = d.amount_kg,
                    remaining_after_kg = d.remaining_after_kg,
                    "领料扣减"
                );
            }

            let updates: Vec<RemainingUpdate> = deductions.iter().map(HeatMovement::to_update).collect();
            self.ledger.commit_remaining(&updates, MissingHeatPolicy::Fail)?;

            info!(
                amount_kg,
                available_before_kg = available_kg,
                heats_touched = deductions.len(),
                "领料完成"
            );

            Ok(AllocationReport {
                steel_type: steel_type.clone(),
                requested_kg: amount_kg,
                available_before_kg: available_kg,
                deductions,
            })
        })
    }

    // ==========================================
    // 回冲
    // ==========================================

    /// 将 amount_kg 回补到某钢种（最早优先,按 room 封顶）
    ///
    /// # 说明
    /// - 钢种无炉号时返回 unrestored_kg = amount_kg,不报错
    /// - 提交时已被删除的炉号跳过,其份额计入 unrestored_kg
    #[instrument(skip(self, steel_type), fields(steel_type = %steel_type))]
    pub fn reverse(&self, steel_type: &SteelType, amount_kg: f64) -> AllocationResult<RestorationReport> {
        if !amount_kg.is_finite() || amount_kg < 0.0 {
            return Err(AllocationError::InvalidAmount(amount_kg));
        }

        self.locks.with_gauge(steel_type, || -> AllocationResult<RestorationReport> {
            let heats = self.ledger.heats_all(steel_type)?;
            let (mut restorations, mut unrestored_kg) = plan_restoration(&heats, amount_kg);

            let updates: Vec<RemainingUpdate> = restorations.iter().map(HeatMovement::to_update).collect();
            let outcome = self.ledger.commit_remaining(&updates, MissingHeatPolicy::Skip)?;

            if !outcome.missing_heat_ids.is_empty() {
                let (lost, kept): (Vec<HeatMovement>, Vec<HeatMovement>) = restorations
                    .into_iter()
                    .partition(|m| outcome.missing_heat_ids.contains(&m.heat_id));
                unrestored_kg += lost.iter().map(|m| m.amount_kg).sum::<f64>();
                restorations = kept;
            }

            let report = RestorationReport {
                steel_type: steel_type.clone(),
                requested_kg: amount_kg,
                restored_kg: clamp_near_zero(amount_kg - unrestored_kg),
                unrestored_kg,
                restorations,
                missing_heat_ids: outcome.missing_heat_ids,
            };

            if report.is_partial() {
                warn!(
                    amount_kg,
                    restored_kg = report.restored_kg,
                    unrestored_kg = report.unrestored_kg,
                    "回冲未能全部回补,台账存在漂移"
                );
            } else {
                info!(amount_kg, heats_touched = report.restorations.len(), "回冲完成");
            }

            Ok(report)
        })
    }

    // ==========================================
    // 炉号更正 / 删除（与领料共用钢种锁）
    // ==========================================

    /// 仅更正炉号数量
    ///
    /// # 返回
    /// - Err(Repository(BelowConsumed)): 新数量低于已消耗量,未做修改
    /// - Err(Repository(NotFound)): 炉号不存在
    pub fn update_heat_quantity(&self, heat_id: &str, new_quantity_kg: f64) -> AllocationResult<Heat> {
        self.with_heat_locked(heat_id, None, |_| {
            let heat = self
                .ledger
                .update_quantity_with_consumption_check(heat_id, new_quantity_kg)?;
            info!(heat_id, quantity_kg = heat.quantity_kg, remaining_kg = heat.remaining_kg, "炉号数量已更正");
            Ok(heat)
        })
    }

    /// 更正炉号（同时锁定新旧钢种）
    ///
    /// # 返回
    /// - Err(Repository(SteelTypeLocked)): 已领用炉号不得变更钢种,未做修改
    pub fn update_heat(&self, heat_id: &str, update: &HeatUpdate) -> AllocationResult<Heat> {
        self.with_heat_locked(heat_id, Some(&update.steel_type), |current| {
            let heat = self.ledger.update_heat(heat_id, update)?;
            if current.steel_type != heat.steel_type {
                info!(heat_id, from = %current.steel_type, to = %heat.steel_type, "炉号钢种已变更");
            }
            info!(heat_id, heat_number = %heat.heat_number, "炉号已更正");
            Ok(heat)
        })
    }

    /// 删除从未被领用的炉号
    ///
    /// # 返回
    /// - Err(Repository(HasConsumption)): 已领用,禁止删除
    /// - Err(Repository(NotFound)): 炉号不存在
    pub fn delete_heat(&self, heat_id: &str) -> AllocationResult<Heat> {
        self.with_heat_locked(heat_id, None, |_| {
            let heat = self.ledger.delete_if_untouched(heat_id)?;
            info!(heat_id, heat_number = %heat.heat_number, "炉号已删除");
            Ok(heat)
        })
    }

    /// 持有炉号所属钢种锁（及可选的目标钢种锁）执行 f
    ///
    /// 加锁后重读炉号; 若钢种在加锁前已被并发修改,释放后按新钢种重新加锁
    fn with_heat_locked<T>(
        &self,
        heat_id: &str,
        target: Option<&SteelType>,
        mut f: impl FnMut(&Heat) -> AllocationResult<T>,
    ) -> AllocationResult<T> {
        loop {
            let seen = self.require_heat(heat_id)?;
            let mut gauges = vec![&seen.steel_type];
            gauges.extend(target);

            let outcome = self.locks.with_gauges(&gauges, || -> AllocationResult<Option<T>> {
                let current = self.require_heat(heat_id)?;
                if current.steel_type != seen.steel_type {
                    return Ok(None);
                }
                f(&current).map(Some)
            })?;

            match outcome {
                Some(value) => return Ok(value),
                None => debug!(heat_id, from = %seen.steel_type, "炉号钢种在加锁前被修改,重新加锁"),
            }
        }
    }

    fn require_heat(&self, heat_id: &str) -> AllocationResult<Heat> {
        self.ledger
            .find_heat(heat_id)?
            .ok_or_else(|| AllocationError::Repository(RepositoryError::heat_not_found(heat_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::heat::NewHeat;
    use crate::repository::error::RepositoryResult;
    use crate::repository::heat_repo::CommitOutcome;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // ==========================================
    // 内存台账（测试用）
    // ==========================================

    #[derive(Default)]
    struct MemoryLedger {
        heats: Mutex<Vec<Heat>>,
        lookups: AtomicUsize,
        // 首次查询后把炉号移到另一钢种,模拟并发更正
        move_after_lookup: Mutex<Option<(String, SteelType)>>,
    }

    impl MemoryLedger {
        fn with_heats(rows: &[(&str, &str, f64, u32)]) -> Arc<Self> {
            let ledger = Arc::new(Self::default());
            for (i, (number, steel_type, quantity_kg, day)) in rows.iter().enumerate() {
                let mut heat = NewHeat {
                    heat_number: number.to_string(),
                    steel_type: SteelType::new(*steel_type),
                    quantity_kg: *quantity_kg,
                    date_received: NaiveDate::from_ymd_opt(2024, 1, *day),
                }
                .into_heat(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
                heat.heat_id = number.to_string();
                heat.seq_no = i as i64 + 1;
                ledger.heats.lock().unwrap().push(heat);
            }
            ledger
        }

        fn remaining(&self, heat_id: &str) -> f64 {
            self.heats
                .lock()
                .unwrap()
                .iter()
                .find(|h| h.heat_id == heat_id)
                .map(|h| h.remaining_kg)
                .unwrap()
        }

        fn remove(&self, heat_id: &str) {
            self.heats.lock().unwrap().retain(|h| h.heat_id != heat_id);
        }

        fn sorted(&self, steel_type: &SteelType, with_stock: bool) -> Vec<Heat> {
            let mut heats: Vec<Heat> = self
                .heats
                .lock()
                .unwrap()
                .iter()
                .filter(|h| &h.steel_type == steel_type && (!with_stock || h.remaining_kg > 0.0))
                .cloned()
                .collect();
            heats.sort_by(|a, b| (a.date_received, a.seq_no).cmp(&(b.date_received, b.seq_no)));
            heats
        }
    }

    impl HeatLedger for MemoryLedger {
        fn heats_with_stock(&self, steel_type: &SteelType) -> RepositoryResult<Vec<Heat>> {
            Ok(self.sorted(steel_type, true))
        }

        fn heats_all(&self, steel_type: &SteelType) -> RepositoryResult<Vec<Heat>> {
            Ok(self.sorted(steel_type, false))
        }

        fn find_heat(&self, heat_id: &str) -> RepositoryResult<Option<Heat>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            let mut heats = self.heats.lock().unwrap();
            let found = heats.iter().find(|h| h.heat_id == heat_id).cloned();
            if let Some((id, steel_type)) = self.move_after_lookup.lock().unwrap().take() {
                if let Some(h) = heats.iter_mut().find(|h| h.heat_id == id) {
                    h.steel_type = steel_type;
                }
            }
            Ok(found)
        }

        fn set_remaining(&self, heat_id: &str, remaining_kg: f64) -> RepositoryResult<()> {
            let mut heats = self.heats.lock().unwrap();
            let heat = heats
                .iter_mut()
                .find(|h| h.heat_id == heat_id)
                .ok_or_else(|| RepositoryError::heat_not_found(heat_id))?;
            heat.remaining_kg = remaining_kg;
            Ok(())
        }

        fn commit_remaining(
            &self,
            updates: &[RemainingUpdate],
            policy: MissingHeatPolicy,
        ) -> RepositoryResult<CommitOutcome> {
            let mut heats = self.heats.lock().unwrap();
            let mut staged = heats.clone();
            let mut outcome = CommitOutcome::default();
            for u in updates {
                match staged.iter_mut().find(|h| h.heat_id == u.heat_id) {
                    Some(h) => {
                        h.remaining_kg = u.new_remaining_kg;
                        outcome.applied += 1;
                    }
                    None if policy == MissingHeatPolicy::Skip => {
                        outcome.missing_heat_ids.push(u.heat_id.clone())
                    }
                    None => return Err(RepositoryError::heat_not_found(&u.heat_id)),
                }
            }
            *heats = staged;
            Ok(outcome)
        }

        fn exists_by_number(&self, heat_number: &str, excluding_id: Option<&str>) -> RepositoryResult<bool> {
            Ok(self
                .heats
                .lock()
                .unwrap()
                .iter()
                .any(|h| h.heat_number == heat_number && Some(h.heat_id.as_str()) != excluding_id))
        }

        fn insert(&self, heat: &Heat) -> RepositoryResult<Heat> {
            self.heats.lock().unwrap().push(heat.clone());
            Ok(heat.clone())
        }

        fn delete_if_untouched(&self, heat_id: &str) -> RepositoryResult<Heat> {
            let heat = self
                .find_heat(heat_id)?
                .ok_or_else(|| RepositoryError::heat_not_found(heat_id))?;
            if !heat.is_untouched() {
                return Err(RepositoryError::HasConsumption {
                    heat_id: heat_id.to_string(),
                    consumed_kg: heat.consumed_kg(),
                });
            }
            self.remove(heat_id);
            Ok(heat)
        }

        fn update_heat(&self, heat_id: &str, update: &HeatUpdate) -> RepositoryResult<Heat> {
            let mut heats = self.heats.lock().unwrap();
            let heat = heats
                .iter_mut()
                .find(|h| h.heat_id == heat_id)
                .ok_or_else(|| RepositoryError::heat_not_found(heat_id))?;
            if update.steel_type != heat.steel_type && !heat.is_untouched() {
                return Err(RepositoryError::SteelTypeLocked {
                    heat_id: heat_id.to_string(),
                    from: heat.steel_type.to_string(),
                    to: update.steel_type.to_string(),
                    consumed_kg: heat.consumed_kg(),
                });
            }
            let consumed_kg = heat.consumed_kg();
            if update.quantity_kg < consumed_kg {
                return Err(RepositoryError::BelowConsumed {
                    heat_id: heat_id.to_string(),
                    consumed_kg,
                    requested_kg: update.quantity_kg,
                });
            }
            heat.heat_number = update.heat_number.clone();
            heat.steel_type = update.steel_type.clone();
            heat.quantity_kg = update.quantity_kg;
            heat.remaining_kg = update.quantity_kg - consumed_kg;
            Ok(heat.clone())
        }

        fn update_quantity_with_consumption_check(
            &self,
            heat_id: &str,
            new_quantity_kg: f64,
        ) -> RepositoryResult<Heat> {
            let current = self
                .find_heat(heat_id)?
                .ok_or_else(|| RepositoryError::heat_not_found(heat_id))?;
            self.update_heat(heat_id, &HeatUpdate::quantity_only(&current, new_quantity_kg))
        }
    }

    fn gauge(s: &str) -> SteelType {
        SteelType::new(s)
    }

    fn assert_kg(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 0.01, "expected {expected}kg, got {actual}kg");
    }

    // ==========================================
    // 测试用例
    // ==========================================

    #[test]
    fn test_fifo_allocation_drains_oldest_first() {
        let ledger = MemoryLedger::with_heats(&[
            ("H3", "20.64mm", 300.0, 3),
            ("H1", "20.64mm", 300.0, 1),
            ("H2", "20.64mm", 300.0, 2),
        ]);
        let engine = AllocationEngine::new(Arc::clone(&ledger));

        let report = engine.allocate(&gauge("20.64mm"), 372.0).unwrap();

        assert_kg(ledger.remaining("H1"), 0.0);
        assert_kg(ledger.remaining("H2"), 228.0);
        assert_kg(ledger.remaining("H3"), 300.0);
        assert_eq!(report.deductions.len(), 2);
        assert_eq!(report.deductions[0].heat_id, "H1");
        assert_kg(report.available_before_kg, 900.0);
    }

    #[test]
    fn test_allocate_then_reverse_scenario() {
        let ledger = MemoryLedger::with_heats(&[("A", "23mm", 100.0, 1), ("B", "23mm", 100.0, 2)]);
        let engine = AllocationEngine::new(Arc::clone(&ledger));

        engine.allocate(&gauge("23mm"), 150.0).unwrap();
        assert_kg(ledger.remaining("A"), 0.0);
        assert_kg(ledger.remaining("B"), 50.0);

        let report = engine.reverse(&gauge("23mm"), 150.0).unwrap();
        assert_kg(ledger.remaining("A"), 100.0);
        assert_kg(ledger.remaining("B"), 100.0);
        assert_kg(report.restored_kg, 150.0);
        assert!(!report.is_partial());
    }

    #[test]
    fn test_out_of_stock_and_insufficient_stock_mutate_nothing() {
        let ledger = MemoryLedger::with_heats(&[("A", "23mm", 100.0, 1), ("B", "23mm", 60.0, 2)]);
        let engine = AllocationEngine::new(Arc::clone(&ledger));

        let err = engine.allocate(&gauge("20.64mm"), 10.0).unwrap_err();
        assert!(matches!(err, AllocationError::OutOfStock { .. }));

        let err = engine.allocate(&gauge("23mm"), 200.0).unwrap_err();
        match err {
            AllocationError::InsufficientStock {
                available_kg,
                required_kg,
                ..
            } => {
                assert_kg(available_kg, 160.0);
                assert_kg(required_kg, 200.0);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_kg(ledger.remaining("A"), 100.0);
        assert_kg(ledger.remaining("B"), 60.0);
    }

    #[test]
    fn test_invalid_amount_rejected() {
        let ledger = MemoryLedger::with_heats(&[("A", "23mm", 100.0, 1)]);
        let engine = AllocationEngine::new(ledger);

        assert!(matches!(
            engine.allocate(&gauge("23mm"), 0.0),
            Err(AllocationError::InvalidAmount(_))
        ));
        assert!(matches!(
            engine.allocate(&gauge("23mm"), f64::NAN),
            Err(AllocationError::InvalidAmount(_))
        ));
        assert!(matches!(
            engine.reverse(&gauge("23mm"), -1.0),
            Err(AllocationError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_exact_total_allocation_empties_gauge() {
        let ledger = MemoryLedger::with_heats(&[("A", "23mm", 0.1, 1), ("B", "23mm", 0.2, 2)]);
        let engine = AllocationEngine::new(Arc::clone(&ledger));

        // 0.1 + 0.2 的浮点和略大于 0.3
        engine.allocate(&gauge("23mm"), 0.3).unwrap();
        assert_kg(ledger.remaining("A"), 0.0);
        assert!(ledger.remaining("B") >= 0.0);
        assert_kg(ledger.remaining("B"), 0.0);
    }

    #[test]
    fn test_reverse_with_no_heats_reports_total_drift() {
        let ledger = MemoryLedger::with_heats(&[]);
        let engine = AllocationEngine::new(ledger);

        let report = engine.reverse(&gauge("23mm"), 75.0).unwrap();
        assert_kg(report.unrestored_kg, 75.0);
        assert_kg(report.restored_kg, 0.0);
        assert!(report.is_partial());
    }

    #[test]
    fn test_reverse_never_exceeds_quantity() {
        let ledger = MemoryLedger::with_heats(&[("A", "23mm", 100.0, 1), ("B", "23mm", 100.0, 2)]);
        let engine = AllocationEngine::new(Arc::clone(&ledger));
        engine.allocate(&gauge("23mm"), 30.0).unwrap();

        let report = engine.reverse(&gauge("23mm"), 80.0).unwrap();
        assert_kg(ledger.remaining("A"), 100.0);
        assert_kg(ledger.remaining("B"), 100.0);
        assert_kg(report.restored_kg, 30.0);
        assert_kg(report.unrestored_kg, 50.0);
    }

    #[test]
    fn test_reverse_after_heat_removed_is_partial() {
        let ledger = MemoryLedger::with_heats(&[("A", "23mm", 100.0, 1), ("B", "23mm", 100.0, 2)]);
        let engine = AllocationEngine::new(Arc::clone(&ledger));
        engine.allocate(&gauge("23mm"), 150.0).unwrap();

        ledger.remove("A");
        let report = engine.reverse(&gauge("23mm"), 150.0).unwrap();

        assert_kg(ledger.remaining("B"), 100.0);
        assert_kg(report.restored_kg, 50.0);
        assert_kg(report.unrestored_kg, 100.0);
    }

    #[test]
    fn test_invariant_holds_across_sequence() {
        let ledger = MemoryLedger::with_heats(&[
            ("A", "23mm", 120.0, 1),
            ("B", "23mm", 80.0, 2),
            ("C", "23mm", 200.0, 3),
        ]);
        let engine = AllocationEngine::new(Arc::clone(&ledger));
        let g = gauge("23mm");
        let total_quantity = 400.0;

        let mut live: Vec<f64> = Vec::new();
        for amount in [46.5, 115.0, 93.0, 11.5] {
            engine.allocate(&g, amount).unwrap();
            live.push(amount);
            let remaining: f64 = ledger.heats_all(&g).unwrap().iter().map(|h| h.remaining_kg).sum();
            assert_kg(remaining + live.iter().sum::<f64>(), total_quantity);
        }

        for amount in [115.0, 46.5] {
            let report = engine.reverse(&g, amount).unwrap();
            assert!(!report.is_partial());
            let pos = live.iter().position(|a| *a == amount).unwrap();
            live.remove(pos);
            let remaining: f64 = ledger.heats_all(&g).unwrap().iter().map(|h| h.remaining_kg).sum();
            assert_kg(remaining + live.iter().sum::<f64>(), total_quantity);
        }
    }

    #[test]
    fn test_update_quantity_and_delete_guards() {
        let ledger = MemoryLedger::with_heats(&[("A", "23mm", 300.0, 1), ("B", "23mm", 100.0, 2)]);
        let engine = AllocationEngine::new(Arc::clone(&ledger));
        engine.allocate(&gauge("23mm"), 93.0).unwrap();

        let err = engine.update_heat_quantity("A", 50.0).unwrap_err();
        assert!(matches!(
            err,
            AllocationError::Repository(RepositoryError::BelowConsumed { .. })
        ));
        assert_kg(ledger.remaining("A"), 207.0);

        let heat = engine.update_heat_quantity("A", 150.0).unwrap();
        assert_kg(heat.remaining_kg, 57.0);

        assert!(matches!(
            engine.delete_heat("A").unwrap_err(),
            AllocationError::Repository(RepositoryError::HasConsumption { .. })
        ));
        engine.delete_heat("B").unwrap();
        assert!(matches!(
            engine.delete_heat("B").unwrap_err(),
            AllocationError::Repository(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_consumed_heat_keeps_its_steel_type() {
        let ledger = MemoryLedger::with_heats(&[("A", "20.64mm", 300.0, 1), ("B", "20.64mm", 100.0, 2)]);
        let engine = AllocationEngine::new(Arc::clone(&ledger));
        engine.allocate(&gauge("20.64mm"), 93.0).unwrap();

        let heat_a = ledger.find_heat("A").unwrap().unwrap();
        let mut update = HeatUpdate::quantity_only(&heat_a, 300.0);
        update.steel_type = gauge("23mm");
        assert!(matches!(
            engine.update_heat("A", &update).unwrap_err(),
            AllocationError::Repository(RepositoryError::SteelTypeLocked { .. })
        ));
        assert!(ledger.heats_all(&gauge("23mm")).unwrap().is_empty());
        assert_kg(ledger.remaining("A"), 207.0);

        // 未领用炉号可以变更
        let heat_b = ledger.find_heat("B").unwrap().unwrap();
        let mut update = HeatUpdate::quantity_only(&heat_b, 100.0);
        update.steel_type = gauge("23mm");
        let moved = engine.update_heat("B", &update).unwrap();
        assert_eq!(moved.steel_type, gauge("23mm"));
    }

    #[test]
    fn test_heat_moved_before_lock_is_relocked() {
        let ledger = MemoryLedger::with_heats(&[("A", "23mm", 100.0, 1)]);
        let engine = AllocationEngine::new(Arc::clone(&ledger));
        *ledger.move_after_lookup.lock().unwrap() = Some(("A".to_string(), gauge("30mm")));

        let heat = engine.update_heat_quantity("A", 120.0).unwrap();
        assert_eq!(heat.steel_type, gauge("30mm"));
        assert_kg(heat.remaining_kg, 120.0);
        // 读取 → 加锁后重读(钢种已变) → 重新读取 → 加锁后重读 → 更正
        assert!(ledger.lookups.load(Ordering::SeqCst) >= 4);
    }

    #[test]
    fn test_plan_restoration_skips_full_heats() {
        let ledger = MemoryLedger::with_heats(&[("A", "23mm", 100.0, 1), ("B", "23mm", 100.0, 2)]);
        ledger.set_remaining("B", 40.0).unwrap();

        let heats = ledger.heats_all(&gauge("23mm")).unwrap();
        let (restorations, unrestored) = plan_restoration(&heats, 25.0);
        assert_eq!(restorations.len(), 1);
        assert_eq!(restorations[0].heat_id, "B");
        assert_kg(restorations[0].remaining_after_kg, 65.0);
        assert_kg(unrestored, 0.0);
    }
}
