// ==========================================
// WindowSynthesizer 引擎集成测试
// ==========================================
// 测试目标: 验证合成窗口的类型、工期、落位与溢出
// ==========================================


use maintenance_scheduler::config::{DurationRange, SchedulerParams};
use maintenance_scheduler::domain::{index_by_anomaly, ActionPlanMap, WindowStatus, WindowType};
use maintenance_scheduler::engine::{FixedClock, NextAvailableSlot, WindowSynthesizer};
use std::sync::Arc;
use test_helpers::{base_time, plan, window};

fn ids(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("A{}", i)).collect()
}

fn synthesizer() -> WindowSynthesizer {
    WindowSynthesizer::new().with_clock(Arc::new(FixedClock(base_time())))
}

#[test]
fn test_type_selection_by_required_days() {
    let s = synthesizer();
    let cases = [
        (1, WindowType::Force, 1.0),
        (3, WindowType::Force, 3.0),
        (4, WindowType::Minor, 4.0),
        (7, WindowType::Minor, 7.0),
        (8, WindowType::Major, 14.0),
    ];

    for (count, expected_type, expected_days) in cases {
        let result = s.create_optimal_window(&ids(count), &ActionPlanMap::new(), &[]);
        assert_eq!(result.window.window_type, expected_type, "count={}", count);
        assert_eq!(result.window.duration_days, expected_days, "count={}", count);
        assert_eq!(result.required_days, count as f64);
    }
}

#[test]
fn test_synthesized_window_fields() {
    let plans = index_by_anomaly(vec![plan("A1", 1.5), plan("A2", 0.5)]);
    let result = synthesizer().create_optimal_window(&ids(2), &plans, &[]);

    // 按计划工期累加，不做 1 天下限
    assert_eq!(result.required_days, 2.0);
    assert_eq!(result.window.duration_days, 2.0);
    assert_eq!(result.window.window_type, WindowType::Force);
    assert_eq!(result.window.status, WindowStatus::Planned);
    assert!(result.window.auto_created);
    assert_eq!(result.window.created_at, base_time());
    assert_eq!(result.anomaly_ids, ids(2));
    assert!(result.window.end_date > result.window.start_date);
}

#[test]
fn test_overflow_beyond_major_ceiling() {
    let plans = index_by_anomaly(vec![plan("A1", 40.0), plan("A2", 5.0)]);
    let result = synthesizer().create_optimal_window(&ids(2), &plans, &[]);

    assert_eq!(result.window.window_type, WindowType::Major);
    assert_eq!(result.window.duration_days, 42.0);
    assert_eq!(result.overflow_days, 3.0);
    assert!(result.has_overflow());
}

#[test]
fn test_next_available_slot_after_active_windows() {
    let first = window("W1", WindowType::Minor, 5.0, 2);
    let second = window("W2", WindowType::Force, 2.0, 10);

    let result = synthesizer()
        .with_placement(Arc::new(NextAvailableSlot))
        .create_optimal_window(&ids(1), &ActionPlanMap::new(), &[first, second.clone()]);

    assert_eq!(result.window.start_date, second.end_date);
}

#[test]
fn test_configured_ranges() {
    let params = SchedulerParams {
        force_range: DurationRange::new(1.0, 2.0),
        minor_range: DurationRange::new(2.0, 10.0),
        ..SchedulerParams::default()
    };
    let s = WindowSynthesizer::with_params(params).with_clock(Arc::new(FixedClock(base_time())));

    let result = s.create_optimal_window(&ids(9), &ActionPlanMap::new(), &[]);
    assert_eq!(result.window.window_type, WindowType::Minor);
    assert_eq!(result.window.duration_days, 9.0);
}
