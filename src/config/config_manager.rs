// ==========================================
// 设备异常检修排程引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::scheduler_config_trait::SchedulerConfigReader;
use crate::config::scheduler_params::{DurationRange, SchedulerParams};
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
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

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 读取数值配置，缺失或格式错误时使用默认值
    fn get_f64_or(&self, key: &str, default: f64) -> RepositoryResult<f64> {
        let value = match self.get_global_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match value.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %value,
                    default,
                    "配置值格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式，按 key 排序）
    ///
    /// # 用途
    /// - 排程报告中记录本次计算所用参数
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&json!(config_map))
            .map_err(|e| RepositoryError::InternalError(e.to_string()))
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> RepositoryResult<usize> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)
            .map_err(|e| RepositoryError::ValidationError(format!("配置快照格式错误: {}", e)))?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 读取工期范围配置
    fn get_range_or(
        &self,
        min_key: &str,
        max_key: &str,
        default: DurationRange,
    ) -> RepositoryResult<DurationRange> {
        let min_days = self.get_f64_or(min_key, default.min_days)?;
        let max_days = self.get_f64_or(max_key, default.max_days)?;

        if min_days <= 0.0 || max_days < min_days {
            tracing::warn!(min_key, max_key, min_days, max_days, "工期范围配置无效，使用默认值");
            return Ok(default);
        }

        Ok(DurationRange::new(min_days, max_days))
    }
}

// ==========================================
// SchedulerConfigReader Trait 实现
// ==========================================
#[async_trait]
impl SchedulerConfigReader for ConfigManager {
    async fn load_scheduler_params(&self) -> RepositoryResult<SchedulerParams> {
        let d = SchedulerParams::default();

        Ok(SchedulerParams {
            weight_critical: self.get_f64_or(config_keys::WEIGHT_CRITICAL, d.weight_critical)?,
            weight_high: self.get_f64_or(config_keys::WEIGHT_HIGH, d.weight_high)?,
            weight_normal: self.get_f64_or(config_keys::WEIGHT_NORMAL, d.weight_normal)?,
            weight_low: self.get_f64_or(config_keys::WEIGHT_LOW, d.weight_low)?,
            equipment_factor: self.get_f64_or(config_keys::EQUIPMENT_FACTOR, d.equipment_factor)?,
            default_processing_days: self
                .get_f64_or(config_keys::DEFAULT_PROCESSING_DAYS, d.default_processing_days)?
                .max(1.0),
            target_utilization_pct: self
                .get_f64_or(config_keys::TARGET_UTILIZATION_PCT, d.target_utilization_pct)?,
            overload_threshold_pct: self
                .get_f64_or(config_keys::OVERLOAD_THRESHOLD_PCT, d.overload_threshold_pct)?,
            underutilized_threshold_pct: self.get_f64_or(
                config_keys::UNDERUTILIZED_THRESHOLD_PCT,
                d.underutilized_threshold_pct,
            )?,
            balance_points_per_level: self
                .get_f64_or(config_keys::BALANCE_POINTS_PER_LEVEL, d.balance_points_per_level)?,
            force_range: self.get_range_or(
                config_keys::FORCE_MIN_DAYS,
                config_keys::FORCE_MAX_DAYS,
                d.force_range,
            )?,
            minor_range: self.get_range_or(
                config_keys::MINOR_MIN_DAYS,
                config_keys::MINOR_MAX_DAYS,
                d.minor_range,
            )?,
            major_range: self.get_range_or(
                config_keys::MAJOR_MIN_DAYS,
                config_keys::MAJOR_MAX_DAYS,
                d.major_range,
            )?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 严重度权重
    pub const WEIGHT_CRITICAL: &str = "scheduler/weight_critical";
    pub const WEIGHT_HIGH: &str = "scheduler/weight_high";
    pub const WEIGHT_NORMAL: &str = "scheduler/weight_normal";
    pub const WEIGHT_LOW: &str = "scheduler/weight_low";

    // 紧迫度
    pub const EQUIPMENT_FACTOR: &str = "scheduler/equipment_factor";
    pub const DEFAULT_PROCESSING_DAYS: &str = "scheduler/default_processing_days";

    // 利用率
    pub const TARGET_UTILIZATION_PCT: &str = "scheduler/target_utilization_pct";
    pub const OVERLOAD_THRESHOLD_PCT: &str = "scheduler/overload_threshold_pct";
    pub const UNDERUTILIZED_THRESHOLD_PCT: &str = "scheduler/underutilized_threshold_pct";
    pub const BALANCE_POINTS_PER_LEVEL: &str = "scheduler/balance_points_per_level";

    // 窗口工期范围
    pub const FORCE_MIN_DAYS: &str = "scheduler/force_min_days";
    pub const FORCE_MAX_DAYS: &str = "scheduler/force_max_days";
    pub const MINOR_MIN_DAYS: &str = "scheduler/minor_min_days";
    pub const MINOR_MAX_DAYS: &str = "scheduler/minor_max_days";
    pub const MAJOR_MIN_DAYS: &str = "scheduler/major_min_days";
    pub const MAJOR_MAX_DAYS: &str = "scheduler/major_max_days";
}
