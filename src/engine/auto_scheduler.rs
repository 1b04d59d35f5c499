// ==========================================
// 设备异常检修排程引擎 - 自动排程引擎
// ==========================================
// 职责: 将已处置未排程的异常分配到可用检修窗口
// 输入: 候选异常 + 可用窗口（调用方已过滤为 planned 且未来开始）+ 已分配异常 + 行动计划
// 输出: 分配列表 + 未分配列表
// 红线: 不创建窗口，不做持久化；放不下的异常进入 unassigned
// ==========================================

use crate::config::scheduler_params::SchedulerParams;
use crate::domain::action_plan::ActionPlanMap;
use crate::domain::anomaly::Anomaly;
use crate::domain::maintenance_window::{CapacityConstraint, MaintenanceWindow, WindowLoad};
use crate::engine::scoring::{workload_days, ScoringModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// 单条分配
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub anomaly_id: String,
    pub window_id: String,
}

/// 自动排程结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutoScheduleResult {
    /// 按排程优先级顺序的分配
    pub assignments: Vec<Assignment>,
    /// 没有窗口能容纳的异常（按排程优先级顺序）
    pub unassigned: Vec<String>,
    /// 排程结束时各窗口负荷（与窗口输入顺序一致）
    pub window_loads: Vec<WindowLoad>,
}

impl AutoScheduleResult {
    pub fn is_fully_assigned(&self) -> bool {
        self.unassigned.is_empty()
    }
}

// ==========================================
// AutoScheduler - 自动排程引擎
// ==========================================
pub struct AutoScheduler {
    scoring: ScoringModel,
}

impl AutoScheduler {
    pub fn new() -> Self {
        Self::with_params(SchedulerParams::default())
    }

    pub fn with_params(params: SchedulerParams) -> Self {
        Self {
            scoring: ScoringModel::with_params(params),
        }
    }

    /// 构建窗口负荷快照
    ///
    /// 已分配到窗口的异常按计划工期计入当前工作量（与利用率分析同一口径）；
    /// 不属于这些窗口的异常忽略。
    pub fn build_window_loads(
        &self,
        windows: &[MaintenanceWindow],
        assigned: &[Anomaly],
        plans: &ActionPlanMap,
    ) -> Vec<WindowLoad> {
        let default_days = self.scoring.params().default_processing_days;

        windows
            .iter()
            .map(|w| WindowLoad {
                window_id: w.window_id.clone(),
                capacity_days: w.duration_days,
                assigned_workload: assigned
                    .iter()
                    .filter(|a| a.is_assigned_to(&w.window_id))
                    .map(|a| workload_days(plans.get(&a.anomaly_id), default_days))
                    .sum(),
            })
            .collect()
    }

    /// 自动排程
    ///
    /// # 参数
    /// - `candidates`: 已处置且未排程的异常
    /// - `windows`: 可用窗口（迭代顺序即首次适配顺序）
    /// - `assigned`: 已分配异常，用于计算窗口当前工作量
    /// - `plans`: 按异常ID索引的行动计划
    #[instrument(skip_all, fields(
        candidates_count = candidates.len(),
        windows_count = windows.len()
    ))]
    pub fn schedule(
        &self,
        candidates: &[Anomaly],
        windows: &[MaintenanceWindow],
        assigned: &[Anomaly],
        plans: &ActionPlanMap,
    ) -> AutoScheduleResult {
        let loads = self.build_window_loads(windows, assigned, plans);
        self.schedule_into(candidates, loads, plans)
    }

    /// 在给定负荷快照上自动排程（贪心首次适配）
    ///
    /// 规则:
    /// 1) 按效率降序（稳定排序）依次处理
    /// 2) 放入第一个剩余容量 >= 处理工期的窗口
    /// 3) 同一次调用内的分配立即扣减窗口剩余容量
    pub fn schedule_into(
        &self,
        candidates: &[Anomaly],
        mut loads: Vec<WindowLoad>,
        plans: &ActionPlanMap,
    ) -> AutoScheduleResult {
        let mut assignments = Vec::new();
        let mut unassigned = Vec::new();

        for score in self.scoring.rank(candidates, plans) {
            match loads.iter_mut().find(|l| l.can_accept(score.processing_time)) {
                Some(load) => {
                    load.assigned_workload += score.processing_time;
                    debug!(
                        anomaly_id = %score.anomaly_id,
                        window_id = %load.window_id,
                        efficiency = score.efficiency,
                        processing_time = score.processing_time,
                        remaining = load.remaining_capacity_days(),
                        "异常已分配到窗口"
                    );
                    assignments.push(Assignment {
                        anomaly_id: score.anomaly_id,
                        window_id: load.window_id.clone(),
                    });
                }
                None => {
                    debug!(
                        anomaly_id = %score.anomaly_id,
                        processing_time = score.processing_time,
                        "没有可容纳的窗口"
                    );
                    unassigned.push(score.anomaly_id);
                }
            }
        }

        info!(
            assigned = assignments.len(),
            unassigned = unassigned.len(),
            "自动排程完成"
        );

        AutoScheduleResult {
            assignments,
            unassigned,
            window_loads: loads,
        }
    }
}

impl Default for AutoScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::action_plan::{index_by_anomaly, ActionItem, ActionPlan};
    use crate::domain::anomaly::CriticalityScores;
    use crate::domain::types::WindowType;
    use chrono::{Duration, Utc};

    fn window(id: &str, days: f64) -> MaintenanceWindow {
        let mut w = MaintenanceWindow::planned(id, WindowType::Minor, days, Utc::now() + Duration::days(2), false);
        w.window_id = id.to_string();
        w
    }

    fn treated(id: &str, scores: (i32, i32, i32)) -> Anomaly {
        Anomaly::new(id, id, None, CriticalityScores::new(scores.0, scores.1, scores.2))
    }

    fn plan(id: &str, days: f64) -> ActionPlan {
        ActionPlan::new(id, vec![ActionItem::new(1, "检修", days)])
    }

    #[test]
    fn test_empty_input() {
        let scheduler = AutoScheduler::new();
        let result = scheduler.schedule(&[], &[], &[], &ActionPlanMap::new());
        assert!(result.assignments.is_empty());
        assert!(result.unassigned.is_empty());
    }

    #[test]
    fn test_insufficient_combined_capacity() {
        let scheduler = AutoScheduler::new();
        let windows = vec![window("W1", 5.0)];
        let candidates = vec![treated("A1", (1, 1, 1)), treated("A2", (1, 1, 1))];
        let plans = index_by_anomaly(vec![plan("A1", 3.0), plan("A2", 3.0)]);

        let result = scheduler.schedule(&candidates, &windows, &[], &plans);

        assert_eq!(result.assignments.len(), 1);
        assert_eq!(result.assignments[0].anomaly_id, "A1");
        assert_eq!(result.unassigned, vec!["A2".to_string()]);
        assert_eq!(result.window_loads[0].assigned_workload, 3.0);
    }

    #[test]
    fn test_higher_efficiency_placed_first() {
        let scheduler = AutoScheduler::new();
        let windows = vec![window("W1", 2.0)];
        let candidates = vec![treated("LOW", (0, 0, 1)), treated("CRIT", (3, 3, 3))];
        let plans = index_by_anomaly(vec![plan("LOW", 2.0), plan("CRIT", 2.0)]);

        let result = scheduler.schedule(&candidates, &windows, &[], &plans);
        assert_eq!(result.assignments[0].anomaly_id, "CRIT");
        assert_eq!(result.unassigned, vec!["LOW".to_string()]);
    }

    #[test]
    fn test_first_fit_by_window_order() {
        let scheduler = AutoScheduler::new();
        let windows = vec![window("W1", 1.0), window("W2", 5.0), window("W3", 5.0)];
        let candidates = vec![treated("A1", (3, 2, 2)), treated("A2", (1, 1, 1))];
        let plans = index_by_anomaly(vec![plan("A1", 3.0)]);

        let result = scheduler.schedule(&candidates, &windows, &[], &plans);
        // A2 (效率 4) 优先于 A1 (效率 7/3)
        assert_eq!(
            result.assignments,
            vec![
                Assignment { anomaly_id: "A2".into(), window_id: "W1".into() },
                Assignment { anomaly_id: "A1".into(), window_id: "W2".into() },
            ]
        );
    }

    #[test]
    fn test_existing_workload_reduces_capacity() {
        let scheduler = AutoScheduler::new();
        let windows = vec![window("W1", 3.0)];
        let mut existing = treated("OLD", (1, 1, 1));
        existing.maintenance_window_id = Some("W1".to_string());
        let plans = index_by_anomaly(vec![plan("OLD", 2.5), plan("NEW", 1.0)]);

        let result = scheduler.schedule(&[treated("NEW", (1, 1, 1))], &windows, &[existing], &plans);
        assert!(result.assignments.is_empty());
        assert_eq!(result.unassigned, vec!["NEW".to_string()]);
    }

    #[test]
    fn test_exact_fit_is_accepted() {
        let scheduler = AutoScheduler::new();
        let windows = vec![window("W1", 4.0)];
        let plans = index_by_anomaly(vec![plan("A1", 1.5), plan("A2", 2.5)]);

        let result = scheduler.schedule(
            &[treated("A1", (1, 1, 1)), treated("A2", (1, 1, 1))],
            &windows,
            &[],
            &plans,
        );
        assert!(result.is_fully_assigned());
        assert_eq!(result.window_loads[0].remaining_capacity_days(), 0.0);
    }
}
