// ==========================================
// 钢材炉号库存台账 - 生产记录仓储
// ==========================================
// 红线: material_consumed_kg 只写一次,仓储不提供修改接口
// ==========================================

use crate::domain::inventory::ProductTotal;
use crate::domain::production::Production;
use crate::domain::types::SteelType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::heat_repo::DATE_FORMAT;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const PRODUCTION_COLUMNS: &str = r#"
    production_id, production_date, product_type, steel_type,
    quantity_produced, material_consumed_kg, created_at
"#;

// ==========================================
// ProductionRepository - 生产记录仓储
// ==========================================
pub struct ProductionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入生产记录
    pub fn insert(&self, production: &Production) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO production (
                production_id, production_date, product_type, steel_type,
                quantity_produced, material_consumed_kg, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                production.production_id,
                production.production_date.format(DATE_FORMAT).to_string(),
                production.product_type,
                production.steel_type.as_str(),
                production.quantity_produced,
                production.material_consumed_kg,
                production.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 按 production_id 查询
    pub fn find_by_id(&self, production_id: &str) -> RepositoryResult<Option<Production>> {
        let conn = self.get_conn()?;
        let production = conn
            .query_row(
                &format!(
                    "SELECT {} FROM production WHERE production_id = ?1",
                    PRODUCTION_COLUMNS
                ),
                params![production_id],
                map_production_row,
            )
            .optional()?;
        Ok(production)
    }

    /// 删除生产记录
    ///
    /// # 返回
    /// - Err(NotFound): 记录不存在
    pub fn delete(&self, production_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM production WHERE production_id = ?1",
            params![production_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::production_not_found(production_id));
        }
        Ok(())
    }

    /// 全部生产记录（生产日期倒序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Production>> {
        self.query_productions(
            &format!(
                "SELECT {} FROM production ORDER BY production_date DESC, created_at DESC",
                PRODUCTION_COLUMNS
            ),
            [],
        )
    }

    /// 最近 N 条生产记录
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<Production>> {
        self.query_productions(
            &format!(
                "SELECT {} FROM production ORDER BY production_date DESC, created_at DESC LIMIT ?1",
                PRODUCTION_COLUMNS
            ),
            params![limit as i64],
        )
    }

    /// 某钢种有效生产记录的耗料合计
    pub fn total_consumed_for(&self, steel_type: &SteelType) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(material_consumed_kg), 0.0) FROM production WHERE steel_type = ?1",
            params![steel_type.as_str()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// 按产品型号汇总产量
    pub fn totals_by_product_type(&self) -> RepositoryResult<Vec<ProductTotal>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT product_type, SUM(quantity_produced), SUM(material_consumed_kg)
            FROM production
            GROUP BY product_type
            ORDER BY product_type
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ProductTotal {
                product_type: row.get(0)?,
                total_quantity: row.get::<_, i64>(1)?.max(0) as u64,
                total_material_kg: row.get(2)?,
            })
        })?;

        let mut totals = Vec::new();
        for row in rows {
            totals.push(row?);
        }
        Ok(totals)
    }

    /// 生产记录中出现过的全部钢种
    pub fn list_steel_types(&self) -> RepositoryResult<Vec<SteelType>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT steel_type FROM production ORDER BY steel_type")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut types = Vec::new();
        for row in rows {
            types.push(SteelType::new(row?));
        }
        Ok(types)
    }

    fn query_productions<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> RepositoryResult<Vec<Production>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, map_production_row)?;

        let mut productions = Vec::new();
        for row in rows {
            productions.push(row?);
        }
        Ok(productions)
    }
}

fn map_production_row(row: &Row<'_>) -> rusqlite::Result<Production> {
    let date_raw: String = row.get(1)?;
    let production_date = NaiveDate::parse_from_str(&date_raw, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Production {
        production_id: row.get(0)?,
        production_date,
        product_type: row.get(2)?,
        steel_type: SteelType::new(row.get::<_, String>(3)?),
        quantity_produced: row.get(4)?,
        material_consumed_kg: row.get(5)?,
        created_at: row
            .get::<_, String>(6)?
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
    })
}
