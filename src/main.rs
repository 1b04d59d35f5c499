// ==========================================
// 设备异常检修排程引擎 - 命令行入口
// ==========================================
// 用法:
//   maintenance-scheduler [db_path] [--synthesize] [--optimize]
//
// 执行一次自动排程（可选: 为未分配异常合成窗口、排程优化），
// 将报告以 JSON 输出到 stdout。
// ==========================================

use anyhow::Context;
use maintenance_scheduler::db::{get_default_db_path, init_schema, open_sqlite_connection};
use maintenance_scheduler::{logging, SchedulingApi, APP_NAME, VERSION};
use serde_json::json;
use std::sync::{Arc, Mutex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let mut db_path: Option<String> = None;
    let mut synthesize = false;
    let mut optimize = false;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--synthesize" => synthesize = true,
            "--optimize" => optimize = true,
            other if other.starts_with("--") => anyhow::bail!("未知参数: {}", other),
            other => db_path = Some(other.to_string()),
        }
    }

    let db_path = db_path.unwrap_or_else(get_default_db_path);

    tracing::info!("{} v{}", APP_NAME, VERSION);
    tracing::info!("使用数据库: {}", db_path);

    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    init_schema(&conn).context("初始化 schema 失败")?;
    let conn = Arc::new(Mutex::new(conn));

    let api = SchedulingApi::from_connection(conn).await?;

    let (schedule, synthesis) = if synthesize {
        let report = api.auto_schedule_with_synthesis().await?;
        (report.schedule, report.synthesis)
    } else {
        (api.auto_schedule().await?, None)
    };

    let optimization = if optimize {
        Some(api.optimize_scheduling().await?)
    } else {
        None
    };

    let windows = api.analyze_windows().await?;

    let report = json!({
        "db_path": db_path,
        "schedule": schedule,
        "synthesis": synthesis,
        "optimization": optimization,
        "windows": windows,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
