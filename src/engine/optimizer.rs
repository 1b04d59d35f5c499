// ==========================================
// 设备异常检修排程引擎 - 排程优化器
// ==========================================
// 职责: 重新评估已有分配，提出从超载窗口迁出到低利用窗口的调整方案
// 输入: 已处置异常 + 全部窗口 + 窗口内已分配异常（任意状态）+ 行动计划
// 输出: OptimizationResult（调整方案 + 建议 + 前后分析）
// 红线: 纯函数，只返回方案，不做持久化
// 红线: 接受的每次迁移都不降低源窗口与目标窗口的综合评分
// 红线: 只迁移已处置异常，其他状态的已分配异常作为固定负载
// ==========================================

use crate::config::scheduler_params::SchedulerParams;
use crate::domain::action_plan::ActionPlanMap;
use crate::domain::anomaly::Anomaly;
use crate::domain::maintenance_window::{MaintenanceWindow, CAPACITY_EPSILON};
use crate::domain::types::CriticalityLevel;
use crate::engine::recommendation::{Recommendation, RecommendationGenerator};
use crate::engine::scoring::{workload_days, ScoringModel};
use crate::engine::utilization::{SchedulingSummary, WindowAnalysis, WindowUtilizationAnalyzer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

/// 评分比较容差
const SCORE_EPSILON: f64 = 1e-9;

/// 单条调整方案
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reassignment {
    pub anomaly_id: String,
    pub from_window_id: String,
    pub to_window_id: String,
    pub workload_days: f64,
}

/// 优化结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// 按执行顺序排列的调整方案
    pub reassignments: Vec<Reassignment>,
    /// 基于优化前状态的建议
    pub recommendations: Vec<Recommendation>,
    pub before: Vec<WindowAnalysis>,
    pub after: Vec<WindowAnalysis>,
    pub summary_before: SchedulingSummary,
    pub summary_after: SchedulingSummary,
}

impl OptimizationResult {
    pub fn is_noop(&self) -> bool {
        self.reassignments.is_empty()
    }
}

/// 窗口内成员（优化过程中的内存状态）
#[derive(Debug, Clone)]
struct Member {
    anomaly_id: String,
    level: CriticalityLevel,
    days: f64,
    efficiency: f64,
    movable: bool,
}

/// 窗口内存状态
#[derive(Debug, Clone)]
struct WindowSlot {
    window_id: String,
    capacity_days: f64,
    members: Vec<Member>,
}

impl WindowSlot {
    fn load(&self) -> Vec<(CriticalityLevel, f64)> {
        self.members.iter().map(|m| (m.level, m.days)).collect()
    }

    fn load_without(&self, anomaly_id: &str) -> Vec<(CriticalityLevel, f64)> {
        self.members
            .iter()
            .filter(|m| m.anomaly_id != anomaly_id)
            .map(|m| (m.level, m.days))
            .collect()
    }

    fn load_with(&self, member: &Member) -> Vec<(CriticalityLevel, f64)> {
        let mut load = self.load();
        load.push((member.level, member.days));
        load
    }
}

// ==========================================
// SchedulingOptimizer - 排程优化器
// ==========================================
pub struct SchedulingOptimizer {
    scoring: ScoringModel,
    analyzer: WindowUtilizationAnalyzer,
    recommender: RecommendationGenerator,
}

impl SchedulingOptimizer {
    pub fn new() -> Self {
        Self::with_params(SchedulerParams::default())
    }

    pub fn with_params(params: SchedulerParams) -> Self {
        Self {
            scoring: ScoringModel::with_params(params.clone()),
            analyzer: WindowUtilizationAnalyzer::with_params(params.clone()),
            recommender: RecommendationGenerator::with_params(params),
        }
    }

    /// 生成优化方案
    ///
    /// 规则:
    /// 1) 超载窗口按利用率降序处理
    /// 2) 窗口内按效率升序尝试迁出
    /// 3) 目标为低于低利用阈值（含空窗口）且剩余容量足够的窗口，按综合评分降序尝试
    /// 4) 仅当源窗口与目标窗口综合评分都不下降时接受迁移
    /// 5) 每个异常最多迁移一次；一轮无迁移即结束
    ///
    /// `assigned` 为窗口内的全部已分配异常（任意状态），
    /// 其中不在 `treated` 里的异常只计入负载，不参与迁移。
    #[instrument(skip_all, fields(
        anomalies_count = treated.len(),
        assigned_count = assigned.len(),
        windows_count = windows.len()
    ))]
    pub fn optimize(
        &self,
        treated: &[Anomaly],
        windows: &[MaintenanceWindow],
        assigned: &[Anomaly],
        plans: &ActionPlanMap,
    ) -> OptimizationResult {
        let movable: HashSet<&str> = treated.iter().map(|a| a.anomaly_id.as_str()).collect();
        let mut snapshot: Vec<Anomaly> = treated.to_vec();
        snapshot.extend(
            assigned
                .iter()
                .filter(|a| !movable.contains(a.anomaly_id.as_str()))
                .cloned(),
        );

        let before = self.analyzer.analyze_all(windows, &snapshot, plans);
        let recommendations = self.recommender.generate(&before, treated);

        let mut slots = self.build_slots(&snapshot, &movable, windows, plans);
        let mut moved: HashSet<String> = HashSet::new();
        let mut reassignments = Vec::new();

        loop {
            let mut progressed = false;

            let mut sources: Vec<(usize, f64)> = slots
                .iter()
                .enumerate()
                .map(|(idx, slot)| (idx, self.analyze_slot(slot)))
                .filter(|(_, analysis)| self.analyzer.is_overloaded(analysis))
                .map(|(idx, analysis)| (idx, analysis.utilization))
                .collect();
            sources.sort_by(|a, b| b.1.total_cmp(&a.1));

            for (src, _) in sources {
                let mut order: Vec<Member> = slots[src]
                    .members
                    .iter()
                    .filter(|m| m.movable && !moved.contains(&m.anomaly_id))
                    .cloned()
                    .collect();
                order.sort_by(|a, b| a.efficiency.total_cmp(&b.efficiency));

                for member in order {
                    if !self.analyzer.is_overloaded(&self.analyze_slot(&slots[src])) {
                        break;
                    }

                    if let Some(target) = self.find_target(&slots, src, &member) {
                        slots[src].members.retain(|m| m.anomaly_id != member.anomaly_id);
                        slots[target].members.push(member.clone());
                        moved.insert(member.anomaly_id.clone());
                        progressed = true;

                        debug!(
                            anomaly_id = %member.anomaly_id,
                            from = %slots[src].window_id,
                            to = %slots[target].window_id,
                            days = member.days,
                            "迁移异常"
                        );

                        reassignments.push(Reassignment {
                            anomaly_id: member.anomaly_id,
                            from_window_id: slots[src].window_id.clone(),
                            to_window_id: slots[target].window_id.clone(),
                            workload_days: member.days,
                        });
                    }
                }
            }

            if !progressed {
                break;
            }
        }

        let after: Vec<WindowAnalysis> = slots.iter().map(|s| self.analyze_slot(s)).collect();
        let summary_before = self.analyzer.summarize(&before);
        let summary_after = self.analyzer.summarize(&after);

        info!(
            reassignments = reassignments.len(),
            recommendations = recommendations.len(),
            overall_before = summary_before.total_overall_score,
            overall_after = summary_after.total_overall_score,
            "排程优化完成"
        );

        OptimizationResult {
            reassignments,
            recommendations,
            before,
            after,
            summary_before,
            summary_after,
        }
    }

    fn build_slots(
        &self,
        snapshot: &[Anomaly],
        movable: &HashSet<&str>,
        windows: &[MaintenanceWindow],
        plans: &ActionPlanMap,
    ) -> Vec<WindowSlot> {
        let default_days = self.scoring.params().default_processing_days;

        windows
            .iter()
            .map(|w| WindowSlot {
                window_id: w.window_id.clone(),
                capacity_days: w.duration_days,
                members: snapshot
                    .iter()
                    .filter(|a| a.is_assigned_to(&w.window_id))
                    .map(|a| {
                        let plan = plans.get(&a.anomaly_id);
                        Member {
                            anomaly_id: a.anomaly_id.clone(),
                            level: a.criticality_level,
                            days: workload_days(plan, default_days),
                            efficiency: self.scoring.score(a, plan).efficiency,
                            movable: movable.contains(a.anomaly_id.as_str()),
                        }
                    })
                    .collect(),
            })
            .collect()
    }

    fn analyze_slot(&self, slot: &WindowSlot) -> WindowAnalysis {
        self.analyzer
            .analyze_load(&slot.window_id, slot.capacity_days, &slot.load())
    }

    /// 为成员寻找迁入目标
    ///
    /// 源窗口评分下降时直接放弃；否则返回第一个评分不下降的目标。
    fn find_target(&self, slots: &[WindowSlot], src: usize, member: &Member) -> Option<usize> {
        let source = &slots[src];
        let source_before = self.analyze_slot(source).overall_score;
        let source_after = self
            .analyzer
            .analyze_load(&source.window_id, source.capacity_days, &source.load_without(&member.anomaly_id))
            .overall_score;
        if source_after + SCORE_EPSILON < source_before {
            return None;
        }

        let mut candidates: Vec<(usize, f64)> = slots
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != src)
            .filter_map(|(idx, slot)| {
                let analysis = self.analyze_slot(slot);
                let fits = analysis.capacity_days - analysis.total_workload + CAPACITY_EPSILON >= member.days;
                if self.analyzer.is_relocation_target(&analysis) && fits {
                    Some((idx, analysis.overall_score))
                } else {
                    None
                }
            })
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

        candidates.into_iter().find_map(|(idx, target_before)| {
            let slot = &slots[idx];
            let target_after = self
                .analyzer
                .analyze_load(&slot.window_id, slot.capacity_days, &slot.load_with(member))
                .overall_score;
            if target_after + SCORE_EPSILON >= target_before {
                Some(idx)
            } else {
                None
            }
        })
    }
}

impl Default for SchedulingOptimizer {
    fn default() -> Self {
        Self::new()
    }
}
