// ==========================================
// 设备异常检修排程引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供排程核心所需的最小 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化 schema（幂等）
///
/// anomaly.maintenance_window_id 外键不带级联：
/// 删除窗口前必须先解除分配，否则由数据库拒绝。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS maintenance_window (
            window_id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            window_type TEXT NOT NULL,
            duration_days REAL NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'planned',
            auto_created INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS anomaly (
            anomaly_id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            equipment_id TEXT,
            status TEXT NOT NULL DEFAULT 'new',
            reliability_score INTEGER,
            availability_score INTEGER,
            process_safety_score INTEGER,
            criticality_level TEXT NOT NULL DEFAULT 'low',
            maintenance_window_id TEXT REFERENCES maintenance_window(window_id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_anomaly_status ON anomaly(status);
        CREATE INDEX IF NOT EXISTS idx_anomaly_window ON anomaly(maintenance_window_id);

        CREATE TABLE IF NOT EXISTS action_plan (
            plan_id TEXT PRIMARY KEY,
            anomaly_id TEXT NOT NULL UNIQUE REFERENCES anomaly(anomaly_id) ON DELETE CASCADE,
            status TEXT NOT NULL DEFAULT 'draft',
            total_duration_days REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS action_item (
            item_id TEXT PRIMARY KEY,
            plan_id TEXT NOT NULL REFERENCES action_plan(plan_id) ON DELETE CASCADE,
            seq_no INTEGER NOT NULL,
            description TEXT NOT NULL,
            duration_days REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_action_item_plan ON action_item(plan_id, seq_no);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 环境变量: 显式指定数据库路径
pub const DB_PATH_ENV: &str = "MAINTENANCE_SCHEDULER_DB_PATH";

/// 默认数据库路径
///
/// 优先级: 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./maintenance_scheduler.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("maintenance-scheduler");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("maintenance_scheduler.db");
        }
    }

    path.to_string_lossy().to_string()
}
