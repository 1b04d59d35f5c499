// ==========================================
// SchedulingApi 端到端测试
// ==========================================
// 测试目标: 验证存储快照读取、引擎调用与落库
// 覆盖范围: 自动排程、窗口合成、优化落库、人工分配、删除前置条件、基础设施错误通道
// ==========================================


use async_trait::async_trait;
use maintenance_scheduler::api::{ApiError, SchedulingApi};
use maintenance_scheduler::config::{config_keys, ConfigManager};
use maintenance_scheduler::domain::{Anomaly, AnomalyStatus, WindowStatus, WindowType};
use maintenance_scheduler::engine::{FixedClock, NextAvailableSlot};
use maintenance_scheduler::repository::{
    ActionPlanRepository, ActionPlanStore, AnomalyRepository, AnomalyStore,
    MaintenanceWindowRepository, MaintenanceWindowStore, RepositoryError, RepositoryResult,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use test_helpers::{
    base_time, create_test_db, in_progress_in, open_shared, plan, treated, treated_in, window,
};

struct Fixture {
    _file: tempfile::NamedTempFile,
    conn: Arc<Mutex<Connection>>,
    anomalies: AnomalyRepository,
    windows: MaintenanceWindowRepository,
    plans: ActionPlanRepository,
}

fn fixture() -> Fixture {
    let (file, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    Fixture {
        _file: file,
        anomalies: AnomalyRepository::from_connection(conn.clone()),
        windows: MaintenanceWindowRepository::from_connection(conn.clone()),
        plans: ActionPlanRepository::from_connection(conn.clone()),
        conn,
    }
}

async fn api(f: &Fixture) -> SchedulingApi {
    SchedulingApi::from_connection(f.conn.clone())
        .await
        .unwrap()
        .with_clock(Arc::new(FixedClock(base_time())))
}

async fn window_of(f: &Fixture, anomaly_id: &str) -> Option<String> {
    f.anomalies
        .find_by_id(anomaly_id)
        .await
        .unwrap()
        .unwrap()
        .maintenance_window_id
}

#[tokio::test]
async fn test_auto_schedule_persists_assignments() {
    let f = fixture();
    f.windows.insert(&window("W1", WindowType::Minor, 5.0, 3)).await.unwrap();
    for a in [treated("A1", 1, (2, 2, 2)), treated("A2", 2, (2, 2, 2))] {
        f.anomalies.upsert(&a).await.unwrap();
    }
    f.plans.upsert(&plan("A1", 3.0)).await.unwrap();
    f.plans.upsert(&plan("A2", 3.0)).await.unwrap();

    let result = api(&f).await.auto_schedule().await.unwrap();

    assert_eq!(result.assignments.len(), 1);
    assert_eq!(result.unassigned, vec!["A2".to_string()]);
    assert_eq!(window_of(&f, "A1").await.as_deref(), Some("W1"));
    assert_eq!(window_of(&f, "A2").await, None);
}

#[tokio::test]
async fn test_auto_schedule_skips_past_and_cancelled_windows() {
    let f = fixture();
    f.windows.insert(&window("PAST", WindowType::Major, 20.0, -1)).await.unwrap();
    let mut cancelled = window("CANCELLED", WindowType::Major, 20.0, 5);
    cancelled.status = WindowStatus::Cancelled;
    f.windows.insert(&cancelled).await.unwrap();
    f.windows.insert(&window("OPEN", WindowType::Force, 2.0, 7)).await.unwrap();

    f.anomalies.upsert(&treated("A1", 1, (1, 1, 1))).await.unwrap();
    let mut not_treated = treated("A2", 2, (3, 3, 3));
    not_treated.status = AnomalyStatus::InProgress;
    f.anomalies.upsert(&not_treated).await.unwrap();

    let result = api(&f).await.auto_schedule().await.unwrap();

    assert_eq!(result.assignments.len(), 1);
    assert_eq!(result.assignments[0].window_id, "OPEN");
    assert_eq!(result.window_loads.len(), 1);
    assert_eq!(window_of(&f, "A2").await, None);
}

#[tokio::test]
async fn test_existing_workload_of_any_status_counts() {
    let f = fixture();
    f.windows.insert(&window("W1", WindowType::Force, 3.0, 2)).await.unwrap();

    let mut running = treated_in("RUN", 1, (1, 1, 1), "W1");
    running.status = AnomalyStatus::InProgress;
    f.anomalies.upsert(&running).await.unwrap();
    f.plans.upsert(&plan("RUN", 2.5)).await.unwrap();
    f.anomalies.upsert(&treated("NEW", 2, (1, 1, 1))).await.unwrap();

    let result = api(&f).await.auto_schedule().await.unwrap();
    assert_eq!(result.unassigned, vec!["NEW".to_string()]);
}

#[tokio::test]
async fn test_auto_schedule_with_synthesis() {
    let f = fixture();
    for (i, id) in ["A1", "A2", "A3"].iter().enumerate() {
        f.anomalies.upsert(&treated(id, i as i64, (3, 3, 3))).await.unwrap();
    }
    f.plans.upsert(&plan("A1", 4.0)).await.unwrap();

    let report = api(&f).await.auto_schedule_with_synthesis().await.unwrap();

    assert!(report.schedule.assignments.is_empty());
    let synthesis = report.synthesis.unwrap();
    assert_eq!(synthesis.required_days, 6.0);
    assert_eq!(synthesis.window.window_type, WindowType::Minor);
    assert!(synthesis.window.auto_created);

    let stored = f.windows.find_by_id(&synthesis.window.window_id).await.unwrap().unwrap();
    assert_eq!(stored.duration_days, 6.0);
    assert_eq!(stored.start_date, base_time());
    for id in ["A1", "A2", "A3"] {
        assert_eq!(window_of(&f, id).await, Some(synthesis.window.window_id.clone()));
    }
}

#[tokio::test]
async fn test_synthesis_not_needed_when_everything_fits() {
    let f = fixture();
    f.windows.insert(&window("W1", WindowType::Minor, 5.0, 1)).await.unwrap();
    f.anomalies.upsert(&treated("A1", 1, (1, 1, 1))).await.unwrap();

    let report = api(&f).await.auto_schedule_with_synthesis().await.unwrap();
    assert!(report.synthesis.is_none());
    assert_eq!(f.windows.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_optimal_window_validation_and_placement() {
    let f = fixture();
    f.windows.insert(&window("W1", WindowType::Minor, 5.0, 2)).await.unwrap();
    f.anomalies.upsert(&treated("A1", 1, (1, 1, 1))).await.unwrap();

    let api = api(&f).await.with_placement(Arc::new(NextAvailableSlot));

    assert!(matches!(
        api.create_optimal_window(&[]).await,
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.create_optimal_window(&["MISSING".to_string()]).await,
        Err(ApiError::NotFound(_))
    ));

    let synthesis = api.create_optimal_window(&["A1".to_string()]).await.unwrap();
    let existing = f.windows.find_by_id("W1").await.unwrap().unwrap();
    assert_eq!(synthesis.window.start_date, existing.end_date);
    // 只建窗，不分配
    assert_eq!(window_of(&f, "A1").await, None);
}

#[tokio::test]
async fn test_optimize_scheduling_applies_and_converges() {
    let f = fixture();
    f.windows.insert(&window("BUSY", WindowType::Force, 3.0, 1)).await.unwrap();
    f.windows.insert(&window("IDLE", WindowType::Minor, 6.0, 2)).await.unwrap();
    f.anomalies.upsert(&treated_in("A1", 1, (3, 3, 3), "BUSY")).await.unwrap();
    f.anomalies.upsert(&treated_in("A2", 2, (0, 0, 1), "BUSY")).await.unwrap();
    f.anomalies.upsert(&treated_in("A3", 3, (3, 3, 3), "BUSY")).await.unwrap();
    f.plans.upsert(&plan("A2", 2.0)).await.unwrap();

    let api = api(&f).await;

    let preview = api.preview_optimization().await.unwrap();
    assert_eq!(preview.reassignments.len(), 1);
    assert_eq!(window_of(&f, "A2").await.as_deref(), Some("BUSY"));

    let applied = api.optimize_scheduling().await.unwrap();
    assert_eq!(applied.reassignments, preview.reassignments);
    assert_eq!(window_of(&f, "A2").await.as_deref(), Some("IDLE"));

    let again = api.optimize_scheduling().await.unwrap();
    assert!(again.is_noop());
}

#[tokio::test]
async fn test_optimize_leaves_in_progress_work_in_place() {
    let f = fixture();
    f.windows.insert(&window("BUSY", WindowType::Force, 2.0, 1)).await.unwrap();
    f.windows.insert(&window("T", WindowType::Minor, 5.0, 2)).await.unwrap();
    f.anomalies.upsert(&treated_in("A1", 1, (2, 2, 2), "BUSY")).await.unwrap();
    f.anomalies.upsert(&treated_in("A2", 2, (2, 2, 2), "BUSY")).await.unwrap();
    f.anomalies.upsert(&in_progress_in("RUN", 3, (1, 1, 1), "T")).await.unwrap();
    f.plans.upsert(&plan("A1", 2.0)).await.unwrap();
    f.plans.upsert(&plan("A2", 2.0)).await.unwrap();
    f.plans.upsert(&plan("RUN", 4.0)).await.unwrap();

    let api = api(&f).await;
    let result = api.optimize_scheduling().await.unwrap();

    // T 已有 4 天处置中作业，容纳不下 2 天的迁入
    assert!(result.is_noop());
    assert_eq!(window_of(&f, "A1").await.as_deref(), Some("BUSY"));
    assert_eq!(window_of(&f, "A2").await.as_deref(), Some("BUSY"));
    assert_eq!(window_of(&f, "RUN").await.as_deref(), Some("T"));

    let analyses = api.analyze_windows().await.unwrap();
    assert_eq!(analyses[0].total_workload, 4.0);
    assert_eq!(analyses[1].total_workload, 4.0);
}

#[tokio::test]
async fn test_optimization_never_lowers_persisted_window_scores() {
    let f = fixture();
    f.windows.insert(&window("BUSY", WindowType::Force, 3.0, 1)).await.unwrap();
    f.windows.insert(&window("IDLE", WindowType::Minor, 10.0, 2)).await.unwrap();
    f.anomalies.upsert(&treated_in("A1", 1, (3, 3, 3), "BUSY")).await.unwrap();
    f.anomalies.upsert(&treated_in("A2", 2, (0, 0, 1), "BUSY")).await.unwrap();
    f.anomalies.upsert(&treated_in("A3", 3, (3, 3, 3), "BUSY")).await.unwrap();
    f.anomalies.upsert(&in_progress_in("RUN", 4, (1, 1, 1), "IDLE")).await.unwrap();
    f.plans.upsert(&plan("A2", 2.0)).await.unwrap();
    f.plans.upsert(&plan("RUN", 2.0)).await.unwrap();

    let api = api(&f).await;
    let before = api.analyze_windows().await.unwrap();
    let result = api.optimize_scheduling().await.unwrap();
    let after = api.analyze_windows().await.unwrap();

    assert_eq!(result.reassignments.len(), 1);
    assert_eq!(window_of(&f, "A2").await.as_deref(), Some("IDLE"));
    assert_eq!(window_of(&f, "RUN").await.as_deref(), Some("IDLE"));

    assert_eq!(before.len(), after.len());
    for (b, a) in before.iter().zip(&after) {
        assert_eq!(b.window_id, a.window_id);
        assert!(
            a.overall_score + 1e-9 >= b.overall_score,
            "window={} before={} after={}",
            b.window_id,
            b.overall_score,
            a.overall_score
        );
    }
    assert_eq!(after[1].total_workload, 4.0);
}

#[tokio::test]
async fn test_analyze_windows() {
    let f = fixture();
    f.windows.insert(&window("W1", WindowType::Minor, 4.0, 1)).await.unwrap();
    f.anomalies.upsert(&treated_in("A1", 1, (3, 3, 3), "W1")).await.unwrap();
    f.anomalies.upsert(&treated_in("A2", 2, (1, 1, 1), "W1")).await.unwrap();
    f.plans.upsert(&plan("A1", 2.4)).await.unwrap();

    let analyses = api(&f).await.analyze_windows().await.unwrap();

    assert_eq!(analyses.len(), 1);
    assert!((analyses[0].utilization - 85.0).abs() < 1e-9);
    assert!((analyses[0].efficiency_score - 100.0).abs() < 1e-9);
    assert_eq!(analyses[0].balance_score, 20.0);
}

#[tokio::test]
async fn test_manual_assignment_and_delete_precondition() {
    let f = fixture();
    f.windows.insert(&window("W1", WindowType::Minor, 5.0, 1)).await.unwrap();
    let mut done = window("DONE", WindowType::Force, 2.0, 3);
    done.status = WindowStatus::Completed;
    f.windows.insert(&done).await.unwrap();
    f.anomalies.upsert(&treated("A1", 1, (1, 1, 1))).await.unwrap();

    let api = api(&f).await;

    assert!(matches!(
        api.assign_anomaly("A1", "DONE").await,
        Err(ApiError::PreconditionFailed(_))
    ));
    assert!(matches!(
        api.assign_anomaly("A1", "NOPE").await,
        Err(ApiError::NotFound(_))
    ));

    api.assign_anomaly("A1", "W1").await.unwrap();
    assert_eq!(window_of(&f, "A1").await.as_deref(), Some("W1"));

    let err = api.delete_window("W1").await.unwrap_err();
    assert!(matches!(err, ApiError::PreconditionFailed(_)));
    assert!(!err.is_infrastructure());

    api.unassign_anomaly("A1").await.unwrap();
    api.delete_window("W1").await.unwrap();
    assert!(f.windows.find_by_id("W1").await.unwrap().is_none());
    assert!(matches!(api.delete_window("W1").await, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn test_params_loaded_from_config() {
    let f = fixture();
    let config = ConfigManager::from_connection(f.conn.clone()).unwrap();
    config
        .set_global_config_value(config_keys::DEFAULT_PROCESSING_DAYS, "2")
        .unwrap();

    f.windows.insert(&window("W1", WindowType::Force, 3.0, 1)).await.unwrap();
    f.anomalies.upsert(&treated("A1", 1, (1, 1, 1))).await.unwrap();
    f.anomalies.upsert(&treated("A2", 2, (1, 1, 1))).await.unwrap();

    let api = api(&f).await;
    assert_eq!(api.params().default_processing_days, 2.0);

    let result = api.auto_schedule().await.unwrap();
    assert_eq!(result.assignments.len(), 1);
    assert_eq!(result.unassigned.len(), 1);
}

// ==========================================
// 基础设施错误通道
// ==========================================

/// 总是失败的异常存储
struct UnavailableAnomalyStore;

fn outage() -> RepositoryError {
    RepositoryError::DatabaseConnectionError("存储不可用".to_string())
}

#[async_trait]
impl AnomalyStore for UnavailableAnomalyStore {
    async fn find_by_id(&self, _anomaly_id: &str) -> RepositoryResult<Option<Anomaly>> {
        Err(outage())
    }

    async fn list_by_status(&self, _status: AnomalyStatus) -> RepositoryResult<Vec<Anomaly>> {
        Err(outage())
    }

    async fn list_by_window(&self, _window_id: &str) -> RepositoryResult<Vec<Anomaly>> {
        Err(outage())
    }

    async fn upsert(&self, _anomaly: &Anomaly) -> RepositoryResult<()> {
        Err(outage())
    }

    async fn update_window_assignment(
        &self,
        _anomaly_id: &str,
        _window_id: Option<&str>,
    ) -> RepositoryResult<()> {
        Err(outage())
    }
}

#[tokio::test]
async fn test_store_failure_surfaces_as_infrastructure_error() {
    let f = fixture();
    f.windows.insert(&window("W1", WindowType::Minor, 5.0, 1)).await.unwrap();

    let window_store: Arc<dyn MaintenanceWindowStore> =
        Arc::new(MaintenanceWindowRepository::from_connection(f.conn.clone()));
    let plan_store: Arc<dyn ActionPlanStore> =
        Arc::new(ActionPlanRepository::from_connection(f.conn.clone()));
    let api = SchedulingApi::new(Arc::new(UnavailableAnomalyStore), window_store, plan_store)
        .with_clock(Arc::new(FixedClock(base_time())));

    let err = api.auto_schedule().await.unwrap_err();
    assert!(err.is_infrastructure());

    let err = api.preview_optimization().await.unwrap_err();
    assert!(err.is_infrastructure());

    let err = api.delete_window("W1").await.unwrap_err();
    assert!(err.is_infrastructure());
}
