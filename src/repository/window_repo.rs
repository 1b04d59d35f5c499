// ==========================================
// 设备异常检修排程引擎 - 检修窗口数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::maintenance_window::MaintenanceWindow;
use crate::domain::types::{WindowStatus, WindowType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::store::MaintenanceWindowStore;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const SELECT_COLUMNS: &str = r#"
    SELECT
        window_id, title, window_type, duration_days, start_date, end_date,
        status, auto_created, created_at, updated_at
    FROM maintenance_window
"#;

/// 检修窗口仓储
/// 职责: 管理maintenance_window表的CRUD操作
pub struct MaintenanceWindowRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaintenanceWindowRepository {
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

    fn map_row(row: &Row<'_>) -> rusqlite::Result<MaintenanceWindow> {
        Ok(MaintenanceWindow {
            window_id: row.get(0)?,
            title: row.get(1)?,
            window_type: WindowType::from_str(&row.get::<_, String>(2)?),
            duration_days: row.get(3)?,
            start_date: row.get(4)?,
            end_date: row.get(5)?,
            status: WindowStatus::from_str(&row.get::<_, String>(6)?),
            auto_created: row.get::<_, i64>(7)? != 0,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

#[async_trait]
impl MaintenanceWindowStore for MaintenanceWindowRepository {
    async fn find_by_id(&self, window_id: &str) -> RepositoryResult<Option<MaintenanceWindow>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE window_id = ?1", SELECT_COLUMNS);

        let window = conn
            .query_row(&sql, params![window_id], Self::map_row)
            .optional()?;

        Ok(window)
    }

    async fn list_all(&self) -> RepositoryResult<Vec<MaintenanceWindow>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY start_date, window_id", SELECT_COLUMNS);

        let mut stmt = conn.prepare(&sql)?;
        let windows = stmt
            .query_map([], Self::map_row)?
            .collect::<rusqlite::Result<Vec<MaintenanceWindow>>>()?;

        Ok(windows)
    }

    async fn list_by_status(&self, status: WindowStatus) -> RepositoryResult<Vec<MaintenanceWindow>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE status = ?1 ORDER BY start_date, window_id",
            SELECT_COLUMNS
        );

        let mut stmt = conn.prepare(&sql)?;
        let windows = stmt
            .query_map(params![status.to_db_str()], Self::map_row)?
            .collect::<rusqlite::Result<Vec<MaintenanceWindow>>>()?;

        Ok(windows)
    }

    async fn insert(&self, window: &MaintenanceWindow) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO maintenance_window (
                window_id, title, window_type, duration_days, start_date, end_date,
                status, auto_created, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                window.window_id,
                window.title,
                window.window_type.to_db_str(),
                window.duration_days,
                window.start_date,
                window.end_date,
                window.status.to_db_str(),
                window.auto_created as i64,
                window.created_at,
                window.updated_at,
            ],
        )?;

        Ok(())
    }

    async fn update(&self, window: &MaintenanceWindow) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            r#"
            UPDATE maintenance_window SET
                title = ?2, window_type = ?3, duration_days = ?4,
                start_date = ?5, end_date = ?6, status = ?7,
                auto_created = ?8, updated_at = ?9
            WHERE window_id = ?1
            "#,
            params![
                window.window_id,
                window.title,
                window.window_type.to_db_str(),
                window.duration_days,
                window.start_date,
                window.end_date,
                window.status.to_db_str(),
                window.auto_created as i64,
                window.updated_at,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("MaintenanceWindow", &window.window_id));
        }

        Ok(())
    }

    async fn delete(&self, window_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "DELETE FROM maintenance_window WHERE window_id = ?1",
            params![window_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::not_found("MaintenanceWindow", window_id));
        }

        Ok(())
    }
}
