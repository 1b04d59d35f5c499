// ==========================================
// SchedulingOptimizer 引擎集成测试
// ==========================================
// 测试目标: 验证优化方案的单调性与幂等性
// 覆盖范围: 超载迁出、建议生成、固定负载、随机场景性质检查
// ==========================================


use maintenance_scheduler::domain::{
    index_by_anomaly, ActionPlan, ActionPlanMap, Anomaly, MaintenanceWindow, WindowType,
};
use maintenance_scheduler::engine::{
    OptimizationResult, RecommendationKind, SchedulingOptimizer, WindowUtilizationAnalyzer,
};
use proptest::prelude::*;
use test_helpers::{in_progress_in, plan, treated, treated_in, window};

/// 随机异常: (三项子评分, 落位槽, 计划工期, 是否为处置中)
type AnomalySpec = ((i32, i32, i32), usize, Option<f64>, bool);

/// 随机排程场景
struct Scenario {
    treated: Vec<Anomaly>,
    fixed: Vec<Anomaly>,
    windows: Vec<MaintenanceWindow>,
    plans: ActionPlanMap,
}

impl Scenario {
    /// 全部已分配异常（已处置 + 固定负载）
    fn all(&self) -> Vec<Anomaly> {
        self.treated.iter().chain(self.fixed.iter()).cloned().collect()
    }

    fn optimize(&self, optimizer: &SchedulingOptimizer) -> OptimizationResult {
        optimizer.optimize(&self.treated, &self.windows, &self.fixed, &self.plans)
    }
}

fn arb_capacities() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(prop::sample::select(vec![2.0, 3.0, 5.0, 7.0, 10.0, 14.0]), 2..6)
}

/// 工期均为 0.5 的倍数，累加无舍入误差
fn arb_plan_days() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        1 => Just(None),
        3 => prop::sample::select(vec![0.5, 1.0, 1.5, 2.0, 3.0, 4.0, 5.0]).prop_map(Some),
    ]
}

fn arb_anomalies() -> impl Strategy<Value = Vec<AnomalySpec>> {
    let spec = (
        (0..4i32, 0..4i32, 0..4i32),
        0..7usize,
        arb_plan_days(),
        prop::bool::weighted(0.2),
    );
    prop::collection::vec(spec, 3..13)
}

/// 组装场景: 落位槽超出窗口数即为未排程；处置中异常只在已分配时保留
fn build_scenario(capacities: &[f64], specs: &[AnomalySpec]) -> Scenario {
    let windows: Vec<MaintenanceWindow> = capacities
        .iter()
        .enumerate()
        .map(|(i, days)| window(&format!("W{}", i), WindowType::Minor, *days, 1 + i as i64))
        .collect();

    let mut treated_list = Vec::new();
    let mut fixed = Vec::new();
    let mut plans: Vec<ActionPlan> = Vec::new();

    for (i, (scores, slot, days, in_progress)) in specs.iter().enumerate() {
        let id = format!("A{}", i);
        let slot = slot % (windows.len() + 1);
        if slot < windows.len() {
            let window_id = &windows[slot].window_id;
            if *in_progress {
                fixed.push(in_progress_in(&id, i as i64, *scores, window_id));
            } else {
                treated_list.push(treated_in(&id, i as i64, *scores, window_id));
            }
        } else {
            treated_list.push(treated(&id, i as i64, *scores));
        }

        if let Some(days) = days {
            plans.push(plan(&id, *days));
        }
    }

    Scenario {
        treated: treated_list,
        fixed,
        windows,
        plans: index_by_anomaly(plans),
    }
}

/// 将调整方案应用到异常快照
fn apply(anomalies: &mut [Anomaly], result: &OptimizationResult) {
    for r in &result.reassignments {
        let a = anomalies
            .iter_mut()
            .find(|a| a.anomaly_id == r.anomaly_id)
            .unwrap();
        assert_eq!(a.maintenance_window_id.as_deref(), Some(r.from_window_id.as_str()));
        a.maintenance_window_id = Some(r.to_window_id.clone());
    }
}

#[test]
fn test_overloaded_window_relieved_into_empty_window() {
    let windows = vec![
        window("BUSY", WindowType::Force, 3.0, 1),
        window("EMPTY", WindowType::Minor, 6.0, 2),
    ];
    let anomalies = vec![
        treated_in("A1", 1, (3, 3, 3), "BUSY"),
        treated_in("A2", 2, (0, 0, 1), "BUSY"),
        treated_in("A3", 3, (3, 3, 3), "BUSY"),
    ];
    let plans = index_by_anomaly(vec![plan("A1", 1.0), plan("A2", 2.0), plan("A3", 1.0)]);

    let result = SchedulingOptimizer::new().optimize(&anomalies, &windows, &[], &plans);

    assert_eq!(result.reassignments.len(), 1);
    assert_eq!(result.reassignments[0].anomaly_id, "A2");
    assert_eq!(result.reassignments[0].from_window_id, "BUSY");
    assert_eq!(result.reassignments[0].to_window_id, "EMPTY");
    assert_eq!(result.summary_after.overloaded_count, 0);
}

#[test]
fn test_recommendations_reflect_state_before_optimization() {
    let windows = vec![
        window("BUSY", WindowType::Force, 2.0, 1),
        window("QUIET", WindowType::Major, 14.0, 2),
    ];
    let anomalies = vec![
        treated_in("A1", 1, (1, 1, 1), "BUSY"),
        treated_in("A2", 2, (1, 1, 1), "BUSY"),
        treated_in("A3", 3, (1, 1, 1), "BUSY"),
        treated_in("A4", 4, (1, 1, 1), "QUIET"),
        treated("CRIT", 5, (3, 3, 3)),
    ];

    let result = SchedulingOptimizer::new().optimize(&anomalies, &windows, &[], &ActionPlanMap::new());
    let kinds: Vec<RecommendationKind> = result.recommendations.iter().map(|r| r.kind).collect();

    assert_eq!(
        kinds,
        vec![
            RecommendationKind::Overloaded,
            RecommendationKind::Underutilized,
            RecommendationKind::UnscheduledCritical,
        ]
    );
    assert_eq!(result.recommendations[2].anomaly_ids, vec!["CRIT".to_string()]);
}

#[test]
fn test_in_progress_work_occupies_target() {
    let windows = vec![
        window("BUSY", WindowType::Force, 2.0, 1),
        window("T", WindowType::Minor, 5.0, 2),
    ];
    let treated_list = vec![
        treated_in("A1", 1, (2, 2, 2), "BUSY"),
        treated_in("A2", 2, (2, 2, 2), "BUSY"),
    ];
    let running = vec![in_progress_in("RUN", 3, (1, 1, 1), "T")];
    let plans = index_by_anomaly(vec![plan("A1", 2.0), plan("A2", 2.0), plan("RUN", 4.0)]);

    let result = SchedulingOptimizer::new().optimize(&treated_list, &windows, &running, &plans);

    assert!(result.is_noop());
    assert!((result.before[1].utilization - 80.0).abs() < 1e-9);
    assert_eq!(result.after, result.before);
}

#[test]
fn test_unassigned_anomalies_are_ignored() {
    let windows = vec![window("W1", WindowType::Minor, 5.0, 1)];
    let anomalies = vec![treated("A1", 1, (1, 1, 1)), treated("A2", 2, (1, 1, 1))];

    let result = SchedulingOptimizer::new().optimize(&anomalies, &windows, &[], &ActionPlanMap::new());
    assert!(result.is_noop());
    assert_eq!(result.before[0].anomaly_count, 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn test_window_scores_never_decrease(
        capacities in arb_capacities(),
        specs in arb_anomalies(),
    ) {
        let scenario = build_scenario(&capacities, &specs);
        let result = scenario.optimize(&SchedulingOptimizer::new());

        let mut all = scenario.all();
        apply(&mut all, &result);
        let recomputed = WindowUtilizationAnalyzer::new().analyze_all(&scenario.windows, &all, &scenario.plans);

        for ((before, after), actual) in result.before.iter().zip(&result.after).zip(&recomputed) {
            prop_assert!(
                after.overall_score + 1e-9 >= before.overall_score,
                "window={} before={} after={}",
                before.window_id,
                before.overall_score,
                after.overall_score
            );
            prop_assert!((after.overall_score - actual.overall_score).abs() < 1e-9);
            prop_assert_eq!(after.total_workload, actual.total_workload);
        }
    }

    #[test]
    fn test_in_progress_anomalies_never_move(
        capacities in arb_capacities(),
        specs in arb_anomalies(),
    ) {
        let scenario = build_scenario(&capacities, &specs);
        let result = scenario.optimize(&SchedulingOptimizer::new());

        for r in &result.reassignments {
            prop_assert!(scenario.treated.iter().any(|a| a.anomaly_id == r.anomaly_id));
            prop_assert!(scenario.fixed.iter().all(|a| a.anomaly_id != r.anomaly_id));
        }
    }

    #[test]
    fn test_second_run_is_noop(
        capacities in arb_capacities(),
        specs in arb_anomalies(),
    ) {
        let optimizer = SchedulingOptimizer::new();
        let mut scenario = build_scenario(&capacities, &specs);

        let first = scenario.optimize(&optimizer);
        apply(&mut scenario.treated, &first);

        let second = scenario.optimize(&optimizer);
        prop_assert!(second.is_noop(), "second={:?}", second.reassignments);
    }
}
