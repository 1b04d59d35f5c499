// ==========================================
// 设备异常检修排程引擎 - 异常数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::anomaly::{Anomaly, CriticalityScores};
use crate::domain::types::{AnomalyStatus, CriticalityLevel};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::store::AnomalyStore;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const SELECT_COLUMNS: &str = r#"
    SELECT
        anomaly_id, title, equipment_id, status,
        reliability_score, availability_score, process_safety_score,
        criticality_level, maintenance_window_id, created_at, updated_at
    FROM anomaly
"#;

// ==========================================
// AnomalyRepository - 异常仓储
// ==========================================

/// 异常仓储
/// 职责: 管理anomaly表的CRUD操作
pub struct AnomalyRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AnomalyRepository {
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Anomaly> {
        let level_raw: String = row.get(7)?;
        Ok(Anomaly {
            anomaly_id: row.get(0)?,
            title: row.get(1)?,
            equipment_id: row.get(2)?,
            status: AnomalyStatus::from_str(&row.get::<_, String>(3)?),
            scores: CriticalityScores {
                reliability_integrity: row.get(4)?,
                availability: row.get(5)?,
                process_safety: row.get(6)?,
            },
            criticality_level: CriticalityLevel::from_str(&level_raw),
            maintenance_window_id: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
        })
    }
}

#[async_trait]
impl AnomalyStore for AnomalyRepository {
    async fn find_by_id(&self, anomaly_id: &str) -> RepositoryResult<Option<Anomaly>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE anomaly_id = ?1", SELECT_COLUMNS);

        let anomaly = conn
            .query_row(&sql, params![anomaly_id], Self::map_row)
            .optional()?;

        Ok(anomaly)
    }

    async fn list_by_status(&self, status: AnomalyStatus) -> RepositoryResult<Vec<Anomaly>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE status = ?1 ORDER BY created_at, anomaly_id",
            SELECT_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let anomalies = stmt
            .query_map(params![status.to_db_str()], Self::map_row)?
            .collect::<rusqlite::Result<Vec<Anomaly>>>()?;

        Ok(anomalies)
    }

    async fn list_by_window(&self, window_id: &str) -> RepositoryResult<Vec<Anomaly>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE maintenance_window_id = ?1 ORDER BY created_at, anomaly_id",
            SELECT_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let anomalies = stmt
            .query_map(params![window_id], Self::map_row)?
            .collect::<rusqlite::Result<Vec<Anomaly>>>()?;

        Ok(anomalies)
    }

    async fn upsert(&self, anomaly: &Anomaly) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO anomaly (
                anomaly_id, title, equipment_id, status,
                reliability_score, availability_score, process_safety_score,
                criticality_level, maintenance_window_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT(anomaly_id) DO UPDATE SET
                title = excluded.title,
                equipment_id = excluded.equipment_id,
                status = excluded.status,
                reliability_score = excluded.reliability_score,
                availability_score = excluded.availability_score,
                process_safety_score = excluded.process_safety_score,
                criticality_level = excluded.criticality_level,
                maintenance_window_id = excluded.maintenance_window_id,
                updated_at = excluded.updated_at
            "#,
            params![
                anomaly.anomaly_id,
                anomaly.title,
                anomaly.equipment_id,
                anomaly.status.to_db_str(),
                anomaly.scores.reliability_integrity,
                anomaly.scores.availability,
                anomaly.scores.process_safety,
                anomaly.criticality_level.to_db_str(),
                anomaly.maintenance_window_id,
                anomaly.created_at,
                anomaly.updated_at,
            ],
        )?;

        Ok(())
    }

    async fn update_window_assignment(
        &self,
        anomaly_id: &str,
        window_id: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "UPDATE anomaly SET maintenance_window_id = ?1, updated_at = ?2 WHERE anomaly_id = ?3",
            params![window_id, Utc::now(), anomaly_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("Anomaly", anomaly_id));
        }

        Ok(())
    }
}
