// ==========================================
// 设备异常检修排程引擎 - 核心库
// ==========================================
// 职责: 将已处置的设备异常排入检修窗口，评估窗口利用率并给出优化方案
// 技术栈: Rust + SQLite
// 系统定位: 排程决策支持（引擎只计算，落库由 API 层执行）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 外部存储
pub mod repository;

// 引擎层 - 排程算法
pub mod engine;

// 配置层 - 排程参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/schema）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 存储与引擎的适配
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    ActionPlanStatus, AnomalyStatus, CriticalityLevel, WindowStatus, WindowType,
};

// 领域实体
pub use domain::{ActionItem, ActionPlan, ActionPlanMap, Anomaly, CriticalityScores, MaintenanceWindow};

// 引擎
pub use engine::{
    AutoScheduler, RecommendationGenerator, SchedulingOptimizer, ScoringModel,
    WindowSynthesizer, WindowUtilizationAnalyzer,
};

// 配置
pub use config::{ConfigManager, SchedulerParams};

// API
pub use api::{ApiError, ApiResult, SchedulingApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "设备异常检修排程引擎";
