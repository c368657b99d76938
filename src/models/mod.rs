//! # 数据模型模块
//!
//! 定义从 VASP 输出中提取的运行记录与电子结构数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`analysis/`、`operations/` 和 `batch/` 使用
//! - 子模块: run, electronic

pub mod electronic;
pub mod run;

pub use electronic::{
    BandGapChannel, BandGapResult, DosMetadata, DosProfile, DosProfilePoint, ElectronicMetadata,
};
pub use run::{
    ConvergenceProfilePoint, ConvergenceVerdict, EnergyPoint, IonicSeriesPoint, IonicStepRecord,
    Magnetization, RunDiagnostics, RunObservables, RunSummary, StressTensor,
};
