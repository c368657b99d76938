//! # 分析模块
//!
//! 在解析结果之上计算收敛判定、收敛曲线、离子步序列、表格导出和批量统计。
//! 不接触文件系统，所有函数都是纯计算。
//!
//! ## 依赖关系
//! - 被 `operations/` 和 `batch/` 使用
//! - 使用 `models/`
//! - 子模块: convergence, tabular, insights

pub mod convergence;
pub mod insights;
pub mod tabular;

pub use convergence::{
    build_convergence_profile, build_ionic_series, dedup_warnings, evaluate_convergence,
    verdict_warnings,
};
pub use insights::{summarize_samples, InsightSample, InsightStatistics, RankedRun};
pub use tabular::{export_tabular, Dataset, Delimiter, TabularExport, TabularRecord};
