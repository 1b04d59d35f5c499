// ==========================================
// 设备异常检修排程引擎 - 行动计划数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::action_plan::{ActionItem, ActionPlan};
use crate::domain::types::ActionPlanStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::store::ActionPlanStore;
use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// 行动计划仓储
/// 职责: 管理action_plan / action_item表的CRUD操作
pub struct ActionPlanRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionPlanRepository {
    /// 创建新的仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_plan_row(row: &Row<'_>) -> rusqlite::Result<ActionPlan> {
        Ok(ActionPlan {
            plan_id: row.get(0)?,
            anomaly_id: row.get(1)?,
            status: ActionPlanStatus::from_str(&row.get::<_, String>(2)?),
            items: Vec::new(),
            total_duration_days: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    /// 加载计划的行动项（按 seq_no 升序）
    fn load_items(conn: &Connection, plan_id: &str) -> rusqlite::Result<Vec<ActionItem>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT item_id, seq_no, description, duration_days
            FROM action_item
            WHERE plan_id = ?1
            ORDER BY seq_no, item_id
            "#,
        )?;

        let items = stmt
            .query_map(params![plan_id], |row| {
                Ok(ActionItem {
                    item_id: row.get(0)?,
                    seq_no: row.get(1)?,
                    description: row.get(2)?,
                    duration_days: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<ActionItem>>>()?;

        Ok(items)
    }
}

#[async_trait]
impl ActionPlanStore for ActionPlanRepository {
    async fn find_by_anomaly(&self, anomaly_id: &str) -> RepositoryResult<Option<ActionPlan>> {
        let conn = self.get_conn()?;

        let plan = conn
            .query_row(
                r#"
                SELECT plan_id, anomaly_id, status, total_duration_days, created_at, updated_at
                FROM action_plan
                WHERE anomaly_id = ?1
                "#,
                params![anomaly_id],
                Self::map_plan_row,
            )
            .optional()?;

        match plan {
            Some(mut plan) => {
                plan.items = Self::load_items(&conn, &plan.plan_id)?;
                Ok(Some(plan))
            }
            None => Ok(None),
        }
    }

    async fn list_by_anomaly_ids(&self, anomaly_ids: &[String]) -> RepositoryResult<Vec<ActionPlan>> {
        if anomaly_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let placeholders = vec!["?"; anomaly_ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT plan_id, anomaly_id, status, total_duration_days, created_at, updated_at
            FROM action_plan
            WHERE anomaly_id IN ({})
            ORDER BY anomaly_id
            "#,
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let mut plans = stmt
            .query_map(params_from_iter(anomaly_ids.iter()), Self::map_plan_row)?
            .collect::<rusqlite::Result<Vec<ActionPlan>>>()?;

        let mut items_by_plan: HashMap<String, Vec<ActionItem>> = HashMap::new();
        for plan in &plans {
            items_by_plan.insert(plan.plan_id.clone(), Self::load_items(&conn, &plan.plan_id)?);
        }
        for plan in plans.iter_mut() {
            plan.items = items_by_plan.remove(&plan.plan_id).unwrap_or_default();
        }

        Ok(plans)
    }

    async fn upsert(&self, plan: &ActionPlan) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        // 同一异常只保留一个计划
        tx.execute(
            "DELETE FROM action_plan WHERE anomaly_id = ?1 AND plan_id <> ?2",
            params![plan.anomaly_id, plan.plan_id],
        )?;

        tx.execute(
            r#"
            INSERT INTO action_plan (
                plan_id, anomaly_id, status, total_duration_days, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(plan_id) DO UPDATE SET
                status = excluded.status,
                total_duration_days = excluded.total_duration_days,
                updated_at = excluded.updated_at
            "#,
            params![
                plan.plan_id,
                plan.anomaly_id,
                plan.status.to_db_str(),
                plan.total_duration_days,
                plan.created_at,
                plan.updated_at,
            ],
        )?;

        tx.execute("DELETE FROM action_item WHERE plan_id = ?1", params![plan.plan_id])?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO action_item (item_id, plan_id, seq_no, description, duration_days)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for item in &plan.items {
                stmt.execute(params![
                    item.item_id,
                    plan.plan_id,
                    item.seq_no,
                    item.description,
                    item.duration_days,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }
}
