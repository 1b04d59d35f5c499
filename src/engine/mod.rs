// ==========================================
// 设备异常检修排程引擎 - 引擎层
// ==========================================
// 职责: 评分、利用率分析、自动排程、窗口合成、排程优化
// 红线: Engine 不拼 SQL，不做持久化，只对输入快照计算
// ==========================================

pub mod auto_scheduler;
pub mod clock;
pub mod optimizer;
pub mod placement;
pub mod recommendation;
pub mod scoring;
pub mod utilization;
pub mod window_synthesizer;

// 重导出核心引擎
pub use auto_scheduler::{Assignment, AutoScheduleResult, AutoScheduler};
pub use clock::{Clock, FixedClock, SystemClock};
pub use optimizer::{OptimizationResult, Reassignment, SchedulingOptimizer};
pub use placement::{ImmediatePlacement, NextAvailableSlot, WindowPlacement};
pub use recommendation::{
    Recommendation, RecommendationGenerator, RecommendationKind, RecommendationSeverity,
};
pub use scoring::{processing_days, workload_days, AnomalyScore, ScoringModel};
pub use utilization::{SchedulingSummary, WindowAnalysis, WindowUtilizationAnalyzer};
pub use window_synthesizer::{WindowSynthesis, WindowSynthesizer};
