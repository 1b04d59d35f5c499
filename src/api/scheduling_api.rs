// ==========================================
// 设备异常检修排程引擎 - 排程 API
// ==========================================
// 职责: 读取存储快照 → 调用引擎 → 按需落库
// 红线: 引擎只接收快照；存储故障以 ApiError::Infrastructure 返回
// 红线: 同一窗口集合上的排程调用不得并发交叉
// ==========================================
// 落库语义:
// - auto_schedule / optimize_scheduling 在计算完成后逐条落库
// - 中途存储失败时返回错误，已落库的分配保留（非跨窗口原子）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::config::scheduler_config_trait::SchedulerConfigReader;
use crate::config::scheduler_params::SchedulerParams;
use crate::domain::action_plan::{index_by_anomaly, ActionPlanMap};
use crate::domain::anomaly::Anomaly;
use crate::domain::maintenance_window::MaintenanceWindow;
use crate::domain::types::{AnomalyStatus, WindowStatus};
use crate::engine::auto_scheduler::{AutoScheduleResult, AutoScheduler};
use crate::engine::clock::{Clock, SystemClock};
use crate::engine::optimizer::{OptimizationResult, SchedulingOptimizer};
use crate::engine::placement::{ImmediatePlacement, WindowPlacement};
use crate::engine::utilization::{WindowAnalysis, WindowUtilizationAnalyzer};
use crate::engine::window_synthesizer::{WindowSynthesis, WindowSynthesizer};
use crate::repository::action_plan_repo::ActionPlanRepository;
use crate::repository::anomaly_repo::AnomalyRepository;
use crate::repository::store::{ActionPlanStore, AnomalyStore, MaintenanceWindowStore};
use crate::repository::window_repo::MaintenanceWindowRepository;
use futures::future::try_join_all;
use futures::TryFutureExt;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};

/// 自动排程 + 窗口合成的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisScheduleReport {
    pub schedule: AutoScheduleResult,
    /// 未分配异常不为空时生成的窗口（已落库并完成分配）
    pub synthesis: Option<WindowSynthesis>,
}

// ==========================================
// SchedulingApi - 排程 API
// ==========================================
pub struct SchedulingApi {
    anomaly_store: Arc<dyn AnomalyStore>,
    window_store: Arc<dyn MaintenanceWindowStore>,
    plan_store: Arc<dyn ActionPlanStore>,
    params: SchedulerParams,
    clock: Arc<dyn Clock>,
    placement: Arc<dyn WindowPlacement>,
}

impl SchedulingApi {
    /// 创建新的 SchedulingApi 实例（默认参数、系统时钟、立即开始）
    pub fn new(
        anomaly_store: Arc<dyn AnomalyStore>,
        window_store: Arc<dyn MaintenanceWindowStore>,
        plan_store: Arc<dyn ActionPlanStore>,
    ) -> Self {
        Self {
            anomaly_store,
            window_store,
            plan_store,
            params: SchedulerParams::default(),
            clock: Arc::new(SystemClock),
            placement: Arc::new(ImmediatePlacement),
        }
    }

    /// 基于同一 SQLite 连接创建，排程参数从 config_kv 读取
    pub async fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config = ConfigManager::from_connection(conn.clone())?;
        let params = config.load_scheduler_params().await?;

        Ok(Self::new(
            Arc::new(AnomalyRepository::from_connection(conn.clone())),
            Arc::new(MaintenanceWindowRepository::from_connection(conn.clone())),
            Arc::new(ActionPlanRepository::from_connection(conn)),
        )
        .with_params(params))
    }

    pub fn with_params(mut self, params: SchedulerParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_placement(mut self, placement: Arc<dyn WindowPlacement>) -> Self {
        self.placement = placement;
        self
    }

    pub fn params(&self) -> &SchedulerParams {
        &self.params
    }

    // ==========================================
    // 快照读取
    // ==========================================

    /// 读取窗口上已分配的全部异常（任意状态）
    async fn load_assigned(&self, windows: &[MaintenanceWindow]) -> ApiResult<Vec<Anomaly>> {
        let per_window = try_join_all(
            windows
                .iter()
                .map(|w| self.anomaly_store.list_by_window(&w.window_id)),
        )
        .await?;

        Ok(per_window.into_iter().flatten().collect())
    }

    /// 读取行动计划并按异常ID索引
    async fn load_plans<'a>(
        &self,
        anomalies: impl IntoIterator<Item = &'a Anomaly>,
    ) -> ApiResult<ActionPlanMap> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for anomaly in anomalies {
            if seen.insert(anomaly.anomaly_id.as_str()) {
                ids.push(anomaly.anomaly_id.clone());
            }
        }

        let plans = self.plan_store.list_by_anomaly_ids(&ids).await?;
        Ok(index_by_anomaly(plans))
    }

    /// 读取活动窗口（已计划 + 进行中）
    async fn load_active_windows(&self) -> ApiResult<Vec<MaintenanceWindow>> {
        let (mut planned, in_progress) = futures::try_join!(
            self.window_store.list_by_status(WindowStatus::Planned),
            self.window_store.list_by_status(WindowStatus::InProgress),
        )?;
        planned.extend(in_progress);
        Ok(planned)
    }

    async fn require_anomaly(&self, anomaly_id: &str) -> ApiResult<Anomaly> {
        self.anomaly_store
            .find_by_id(anomaly_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Anomaly(id={})不存在", anomaly_id)))
    }

    async fn require_window(&self, window_id: &str) -> ApiResult<MaintenanceWindow> {
        self.window_store
            .find_by_id(window_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("MaintenanceWindow(id={})不存在", window_id)))
    }

    // ==========================================
    // 排程操作
    // ==========================================

    /// 自动排程
    ///
    /// 候选: 已处置且未排程的异常
    /// 窗口: 已计划且开始时间晚于当前时间
    #[instrument(skip(self))]
    pub async fn auto_schedule(&self) -> ApiResult<AutoScheduleResult> {
        let now = self.clock.now();

        let (treated, planned) = futures::try_join!(
            self.anomaly_store.list_by_status(AnomalyStatus::Treated),
            self.window_store.list_by_status(WindowStatus::Planned),
        )?;

        let candidates: Vec<Anomaly> = treated
            .into_iter()
            .filter(|a| a.is_unscheduled_treated())
            .collect();
        let windows: Vec<MaintenanceWindow> = planned
            .into_iter()
            .filter(|w| w.is_schedulable(now))
            .collect();

        info!(
            candidates = candidates.len(),
            windows = windows.len(),
            "开始自动排程"
        );

        let assigned = self.load_assigned(&windows).await?;
        let plans = self.load_plans(candidates.iter().chain(assigned.iter())).await?;

        let result = AutoScheduler::with_params(self.params.clone())
            .schedule(&candidates, &windows, &assigned, &plans);

        for assignment in &result.assignments {
            self.anomaly_store
                .update_window_assignment(&assignment.anomaly_id, Some(assignment.window_id.as_str()))
                .await?;
        }

        info!(
            assigned = result.assignments.len(),
            unassigned = result.unassigned.len(),
            "自动排程已落库"
        );

        Ok(result)
    }

    /// 自动排程后为未分配异常合成一个窗口并完成分配
    #[instrument(skip(self))]
    pub async fn auto_schedule_with_synthesis(&self) -> ApiResult<SynthesisScheduleReport> {
        let schedule = self.auto_schedule().await?;

        if schedule.unassigned.is_empty() {
            return Ok(SynthesisScheduleReport {
                schedule,
                synthesis: None,
            });
        }

        let synthesis = self.create_optimal_window(&schedule.unassigned).await?;
        for anomaly_id in &synthesis.anomaly_ids {
            self.anomaly_store
                .update_window_assignment(anomaly_id, Some(synthesis.window.window_id.as_str()))
                .await?;
        }

        info!(
            window_id = %synthesis.window.window_id,
            assigned = synthesis.anomaly_ids.len(),
            "未分配异常已放入合成窗口"
        );

        Ok(SynthesisScheduleReport {
            schedule,
            synthesis: Some(synthesis),
        })
    }

    /// 为指定异常生成并保存最优窗口（不分配异常）
    #[instrument(skip(self, anomaly_ids), fields(anomalies_count = anomaly_ids.len()))]
    pub async fn create_optimal_window(&self, anomaly_ids: &[String]) -> ApiResult<WindowSynthesis> {
        if anomaly_ids.is_empty() {
            return Err(ApiError::InvalidInput("异常列表不能为空".to_string()));
        }

        let anomalies = try_join_all(anomaly_ids.iter().map(|id| self.require_anomaly(id))).await?;
        let plans = self.load_plans(anomalies.iter()).await?;
        let existing = self.window_store.list_all().await?;

        let synthesis = WindowSynthesizer::with_params(self.params.clone())
            .with_clock(self.clock.clone())
            .with_placement(self.placement.clone())
            .create_optimal_window(anomaly_ids, &plans, &existing);

        if synthesis.has_overflow() {
            warn!(
                overflow_days = synthesis.overflow_days,
                "合成窗口容量不足，需要人工拆分"
            );
        }

        self.window_store.insert(&synthesis.window).await?;
        Ok(synthesis)
    }

    /// 排程优化（立即落库）
    ///
    /// 按方案顺序逐条更新异常分配；返回已执行的方案与建议。
    #[instrument(skip(self))]
    pub async fn optimize_scheduling(&self) -> ApiResult<OptimizationResult> {
        let result = self.preview_optimization().await?;

        for reassignment in &result.reassignments {
            self.anomaly_store
                .update_window_assignment(&reassignment.anomaly_id, Some(reassignment.to_window_id.as_str()))
                .await?;
        }

        info!(
            applied = result.reassignments.len(),
            "排程优化已落库"
        );

        Ok(result)
    }

    /// 排程优化预览（不落库）
    ///
    /// 窗口内其他状态的异常计入负载，但只迁移已处置异常。
    #[instrument(skip(self))]
    pub async fn preview_optimization(&self) -> ApiResult<OptimizationResult> {
        let (treated, windows) = futures::try_join!(
            self.anomaly_store
                .list_by_status(AnomalyStatus::Treated)
                .map_err(ApiError::from),
            self.load_active_windows(),
        )?;
        let assigned = self.load_assigned(&windows).await?;
        let plans = self.load_plans(treated.iter().chain(assigned.iter())).await?;

        Ok(SchedulingOptimizer::with_params(self.params.clone())
            .optimize(&treated, &windows, &assigned, &plans))
    }

    /// 全部窗口的利用率分析
    #[instrument(skip(self))]
    pub async fn analyze_windows(&self) -> ApiResult<Vec<WindowAnalysis>> {
        let windows = self.window_store.list_all().await?;
        let assigned = self.load_assigned(&windows).await?;
        let plans = self.load_plans(assigned.iter()).await?;

        Ok(WindowUtilizationAnalyzer::with_params(self.params.clone())
            .analyze_all(&windows, &assigned, &plans))
    }

    // ==========================================
    // 人工分配
    // ==========================================

    /// 将异常分配到窗口
    ///
    /// 已完成或已取消的窗口不接受分配。
    #[instrument(skip(self))]
    pub async fn assign_anomaly(&self, anomaly_id: &str, window_id: &str) -> ApiResult<()> {
        let (_, window) = futures::try_join!(
            self.require_anomaly(anomaly_id),
            self.require_window(window_id),
        )?;

        if !window.status.is_active() {
            return Err(ApiError::PreconditionFailed(format!(
                "窗口{}状态为{}，不能分配异常",
                window_id, window.status
            )));
        }

        self.anomaly_store
            .update_window_assignment(anomaly_id, Some(window_id))
            .await?;
        Ok(())
    }

    /// 解除异常的窗口分配
    #[instrument(skip(self))]
    pub async fn unassign_anomaly(&self, anomaly_id: &str) -> ApiResult<()> {
        self.require_anomaly(anomaly_id).await?;
        self.anomaly_store
            .update_window_assignment(anomaly_id, None)
            .await?;
        Ok(())
    }

    /// 删除窗口
    ///
    /// 前置条件: 窗口上没有已分配的异常
    #[instrument(skip(self))]
    pub async fn delete_window(&self, window_id: &str) -> ApiResult<()> {
        self.require_window(window_id).await?;

        let assigned = self.anomaly_store.list_by_window(window_id).await?;
        if !assigned.is_empty() {
            return Err(ApiError::PreconditionFailed(format!(
                "窗口{}仍有{}项已分配异常，请先解除分配",
                window_id,
                assigned.len()
            )));
        }

        self.window_store.delete(window_id).await?;
        info!(window_id, "检修窗口已删除");
        Ok(())
    }
}
