// ==========================================
// 钢材炉号库存台账 - 炉号仓储
// ==========================================
// 红线: Repository 不含领料逻辑,只负责数据访问与台账守卫
// 排序: date_received ASC, seq_no ASC（FIFO 稳定排序）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::heat::{Heat, HeatUpdate};
use crate::domain::types::{clamp_near_zero, SteelType, KG_EPSILON};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 日期存储格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const HEAT_COLUMNS: &str = r#"
    heat_id, heat_number, steel_type, quantity_kg, remaining_kg,
    date_received, seq_no, created_at, updated_at
"#;

// ==========================================
// 批量提交结构
// ==========================================

/// 单炉号剩余量写入
///
/// expected_remaining_kg 为引擎读取时的值,写入前校验未被他人修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemainingUpdate {
    pub heat_id: String,
    pub expected_remaining_kg: f64,
    pub new_remaining_kg: f64,
}

/// 批量写入时遇到已删除炉号的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingHeatPolicy {
    /// 整批回滚并返回 NotFound（领料）
    Fail,
    /// 跳过并在结果中报告（回冲）
    Skip,
}

/// 批量写入结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitOutcome {
    pub applied: usize,
    pub missing_heat_ids: Vec<String>,
}

// ==========================================
// HeatRepository - 炉号仓储
// ==========================================
/// 炉号仓储
/// 职责: 管理 heat 表的查询、原子更新与守卫校验
pub struct HeatRepository {
    conn: Arc<Mutex<Connection>>,
}

impl HeatRepository {
    /// 创建新的 HeatRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入
    // ==========================================

    /// 新增炉号
    ///
    /// # 返回
    /// - Ok(Heat): 含数据库分配的 seq_no
    /// - Err(DuplicateKey): 炉号已存在
    pub fn insert(&self, heat: &Heat) -> RepositoryResult<Heat> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        if number_taken(&tx, &heat.heat_number, None)? {
            return Err(RepositoryError::DuplicateKey {
                field: "heat_number".to_string(),
                value: heat.heat_number.clone(),
            });
        }

        tx.execute(
            r#"
            INSERT INTO heat (
                heat_id, heat_number, steel_type, quantity_kg, remaining_kg,
                date_received, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                heat.heat_id,
                heat.heat_number,
                heat.steel_type.as_str(),
                heat.quantity_kg,
                heat.remaining_kg,
                heat.date_received.format(DATE_FORMAT).to_string(),
                heat.created_at.to_rfc3339(),
                heat.updated_at.to_rfc3339(),
            ],
        )?;
        let seq_no = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Heat {
            seq_no,
            ..heat.clone()
        })
    }

    /// 覆写单个炉号的剩余量
    ///
    /// # 返回
    /// - Err(NotFound): 炉号不存在
    /// - Err(ValidationError): 新值越界（< 0 或 > quantity_kg）
    pub fn set_remaining(&self, heat_id: &str, remaining_kg: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let quantity_kg: Option<f64> = conn
            .query_row(
                "SELECT quantity_kg FROM heat WHERE heat_id = ?1",
                params![heat_id],
                |row| row.get(0),
            )
            .optional()?;
        let quantity_kg = quantity_kg.ok_or_else(|| RepositoryError::heat_not_found(heat_id))?;
        let remaining_kg = checked_remaining(heat_id, remaining_kg, quantity_kg)?;

        conn.execute(
            "UPDATE heat SET remaining_kg = ?1, updated_at = ?2 WHERE heat_id = ?3",
            params![remaining_kg, Utc::now().to_rfc3339(), heat_id],
        )?;
        Ok(())
    }

    /// 在同一事务内批量写入剩余量
    ///
    /// # 说明
    /// - 每条写入前校验当前值仍等于 expected_remaining_kg,否则整批回滚（StaleHeatState）
    /// - 炉号不存在时按 policy 处理
    /// - 任何错误都会回滚整批,不留下部分写入
    pub fn commit_remaining(
        &self,
        updates: &[RemainingUpdate],
        policy: MissingHeatPolicy,
    ) -> RepositoryResult<CommitOutcome> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let now = Utc::now().to_rfc3339();
        let mut outcome = CommitOutcome::default();

        for update in updates {
            let current: Option<(f64, f64)> = tx
                .query_row(
                    "SELECT remaining_kg, quantity_kg FROM heat WHERE heat_id = ?1",
                    params![update.heat_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some((actual_kg, quantity_kg)) = current else {
                match policy {
                    MissingHeatPolicy::Fail => {
                        return Err(RepositoryError::heat_not_found(&update.heat_id));
                    }
                    MissingHeatPolicy::Skip => {
                        outcome.missing_heat_ids.push(update.heat_id.clone());
                        continue;
                    }
                }
            };

            if (actual_kg - update.expected_remaining_kg).abs() > KG_EPSILON {
                return Err(RepositoryError::StaleHeatState {
                    heat_id: update.heat_id.clone(),
                    expected_kg: update.expected_remaining_kg,
                    actual_kg,
                });
            }

            let new_remaining = checked_remaining(&update.heat_id, update.new_remaining_kg, quantity_kg)?;
            tx.execute(
                "UPDATE heat SET remaining_kg = ?1, updated_at = ?2 WHERE heat_id = ?3",
                params![new_remaining, now, update.heat_id],
            )?;
            outcome.applied += 1;
        }

        tx.commit()?;
        Ok(outcome)
    }

    /// 删除从未被领用的炉号
    ///
    /// # 返回
    /// - Err(NotFound): 炉号不存在
    /// - Err(HasConsumption): 已有领用,禁止删除
    pub fn delete_if_untouched(&self, heat_id: &str) -> RepositoryResult<Heat> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let heat = find_in(&tx, heat_id)?.ok_or_else(|| RepositoryError::heat_not_found(heat_id))?;
        if !heat.is_untouched() {
            return Err(RepositoryError::HasConsumption {
                heat_id: heat_id.to_string(),
                consumed_kg: heat.consumed_kg(),
            });
        }

        tx.execute("DELETE FROM heat WHERE heat_id = ?1", params![heat_id])?;
        tx.commit()?;
        Ok(heat)
    }

    /// 更正炉号（炉号/钢种/到货日期/数量）
    ///
    /// # 规则
    /// - 炉号唯一（排除自身）
    /// - consumed = 原数量 - 原剩余; 新数量 < consumed 时拒绝（BelowConsumed）
    /// - 新剩余 = 新数量 - consumed
    /// - 已领用的炉号不得变更钢种（SteelTypeLocked）
    /// - 校验失败时不做任何修改
    pub fn update_heat(&self, heat_id: &str, update: &HeatUpdate) -> RepositoryResult<Heat> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let current = find_in(&tx, heat_id)?.ok_or_else(|| RepositoryError::heat_not_found(heat_id))?;
        if update.steel_type != current.steel_type && !current.is_untouched() {
            return Err(RepositoryError::SteelTypeLocked {
                heat_id: heat_id.to_string(),
                from: current.steel_type.to_string(),
                to: update.steel_type.to_string(),
                consumed_kg: current.consumed_kg(),
            });
        }

        let heat_number = update.heat_number.trim().to_string();
        if number_taken(&tx, &heat_number, Some(heat_id))? {
            return Err(RepositoryError::DuplicateKey {
                field: "heat_number".to_string(),
                value: heat_number,
            });
        }

        let consumed_kg = current.consumed_kg();
        if update.quantity_kg + KG_EPSILON < consumed_kg {
            return Err(RepositoryError::BelowConsumed {
                heat_id: heat_id.to_string(),
                consumed_kg,
                requested_kg: update.quantity_kg,
            });
        }
        let remaining_kg = clamp_near_zero(update.quantity_kg - consumed_kg).max(0.0);
        let date_received = update.date_received.unwrap_or(current.date_received);
        let updated_at = Utc::now();

        tx.execute(
            r#"
            UPDATE heat SET
                heat_number = ?1, steel_type = ?2, quantity_kg = ?3,
                remaining_kg = ?4, date_received = ?5, updated_at = ?6
            WHERE heat_id = ?7
            "#,
            params![
                heat_number,
                update.steel_type.as_str(),
                update.quantity_kg,
                remaining_kg,
                date_received.format(DATE_FORMAT).to_string(),
                updated_at.to_rfc3339(),
                heat_id,
            ],
        )?;
        tx.commit()?;

        Ok(Heat {
            heat_number,
            steel_type: update.steel_type.clone(),
            quantity_kg: update.quantity_kg,
            remaining_kg,
            date_received,
            updated_at,
            ..current
        })
    }

    /// 仅更正数量（已消耗量守卫）
    pub fn update_quantity_with_consumption_check(
        &self,
        heat_id: &str,
        new_quantity_kg: f64,
    ) -> RepositoryResult<Heat> {
        let current = self
            .find_by_id(heat_id)?
            .ok_or_else(|| RepositoryError::heat_not_found(heat_id))?;
        self.update_heat(heat_id, &HeatUpdate::quantity_only(&current, new_quantity_kg))
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按 heat_id 查询
    pub fn find_by_id(&self, heat_id: &str) -> RepositoryResult<Option<Heat>> {
        let conn = self.get_conn()?;
        find_in(&conn, heat_id)
    }

    /// 炉号是否已存在（可排除某个 heat_id）
    pub fn exists_by_number(&self, heat_number: &str, excluding_id: Option<&str>) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        number_taken(&conn, heat_number.trim(), excluding_id)
    }

    /// 某钢种有剩余的炉号（FIFO 顺序）
    pub fn heats_with_stock(&self, steel_type: &SteelType) -> RepositoryResult<Vec<Heat>> {
        self.query_heats(
            &format!(
                "SELECT {} FROM heat WHERE steel_type = ?1 AND remaining_kg > 0 \
                 ORDER BY date_received ASC, seq_no ASC",
                HEAT_COLUMNS
            ),
            params![steel_type.as_str()],
        )
    }

    /// 某钢种的全部炉号（FIFO 顺序）
    pub fn heats_all(&self, steel_type: &SteelType) -> RepositoryResult<Vec<Heat>> {
        self.query_heats(
            &format!(
                "SELECT {} FROM heat WHERE steel_type = ?1 ORDER BY date_received ASC, seq_no ASC",
                HEAT_COLUMNS
            ),
            params![steel_type.as_str()],
        )
    }

    /// 全部炉号（到货日期倒序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Heat>> {
        self.query_heats(
            &format!(
                "SELECT {} FROM heat ORDER BY date_received DESC, seq_no DESC",
                HEAT_COLUMNS
            ),
            [],
        )
    }

    /// 最近到货的 N 个炉号
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<Heat>> {
        self.query_heats(
            &format!(
                "SELECT {} FROM heat ORDER BY date_received DESC, seq_no DESC LIMIT ?1",
                HEAT_COLUMNS
            ),
            params![limit as i64],
        )
    }

    /// 台账中出现过的全部钢种
    pub fn list_steel_types(&self) -> RepositoryResult<Vec<SteelType>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT steel_type FROM heat ORDER BY steel_type")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut types = Vec::new();
        for row in rows {
            types.push(SteelType::new(row?));
        }
        Ok(types)
    }

    fn query_heats<P: rusqlite::Params>(&self, sql: &str, params: P) -> RepositoryResult<Vec<Heat>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, map_heat_row)?;

        let mut heats = Vec::new();
        for row in rows {
            heats.push(row?);
        }
        Ok(heats)
    }
}

// ==========================================
// 内部辅助函数
// ==========================================

fn find_in(conn: &Connection, heat_id: &str) -> RepositoryResult<Option<Heat>> {
    let heat = conn
        .query_row(
            &format!("SELECT {} FROM heat WHERE heat_id = ?1", HEAT_COLUMNS),
            params![heat_id],
            map_heat_row,
        )
        .optional()?;
    Ok(heat)
}

fn number_taken(conn: &Connection, heat_number: &str, excluding_id: Option<&str>) -> RepositoryResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM heat WHERE heat_number = ?1 AND (?2 IS NULL OR heat_id <> ?2) LIMIT 1",
            params![heat_number, excluding_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// 校验剩余量落在 [0, quantity_kg],容差内的越界收敛到边界
fn checked_remaining(heat_id: &str, remaining_kg: f64, quantity_kg: f64) -> RepositoryResult<f64> {
    if !remaining_kg.is_finite() || remaining_kg < -KG_EPSILON || remaining_kg > quantity_kg + KG_EPSILON {
        return Err(RepositoryError::FieldValueError {
            field: "remaining_kg".to_string(),
            message: format!(
                "heat_id={} 剩余量 {} 超出 [0, {}]",
                heat_id, remaining_kg, quantity_kg
            ),
        });
    }
    Ok(clamp_near_zero(remaining_kg).clamp(0.0, quantity_kg))
}

fn map_heat_row(row: &Row<'_>) -> rusqlite::Result<Heat> {
    let date_raw: String = row.get(5)?;
    let date_received = NaiveDate::parse_from_str(&date_raw, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Heat {
        heat_id: row.get(0)?,
        heat_number: row.get(1)?,
        steel_type: SteelType::new(row.get::<_, String>(2)?),
        quantity_kg: row.get(3)?,
        remaining_kg: row.get(4)?,
        date_received,
        seq_no: row.get(6)?,
        created_at: row
            .get::<_, String>(7)?
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
        updated_at: row
            .get::<_, String>(8)?
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
    })
}
