// ==========================================
// 钢材炉号库存台账 - 钢种级串行锁
// ==========================================
// 约束: 同一钢种的“读取 → 逐炉计算 → 提交”必须串行
// 多钢种加锁按 SteelType 排序,避免死锁
// ==========================================

use crate::domain::types::SteelType;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// 钢种级互斥锁集合
#[derive(Default)]
pub struct GaugeLocks {
    locks: Mutex<HashMap<SteelType, Arc<Mutex<()>>>>,
}

impl GaugeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, steel_type: &SteelType) -> Arc<Mutex<()>> {
        // 锁内无数据,中毒后直接恢复
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks
            .entry(steel_type.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// 持有单个钢种锁执行 f
    pub fn with_gauge<T>(&self, steel_type: &SteelType, f: impl FnOnce() -> T) -> T {
        self.with_gauges(&[steel_type], f)
    }

    /// 持有多个钢种锁执行 f（排序去重后依次加锁）
    pub fn with_gauges<T>(&self, steel_types: &[&SteelType], f: impl FnOnce() -> T) -> T {
        let mut ordered: Vec<&SteelType> = steel_types.to_vec();
        ordered.sort();
        ordered.dedup();

        let handles: Vec<Arc<Mutex<()>>> = ordered.iter().map(|s| self.handle(s)).collect();
        let guards: Vec<MutexGuard<'_, ()>> = handles
            .iter()
            .map(|h| h.lock().unwrap_or_else(|e| e.into_inner()))
            .collect();

        let result = f();
        drop(guards);
        result
    }
}
