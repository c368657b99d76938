//! # 核心操作
//!
//! 面向适配层（CLI / HTTP / GUI）的纯函数入口。只接受文本内容，不接受路径；
//! 所有失败统一为 `AppError`。
//!
//! ## 依赖关系
//! - 使用 `parsers/`, `analysis/`, `validation/`
//! - 子模块: outcar, electronic

pub mod electronic;
pub mod outcar;

use crate::error::AppError;

/// 操作结果
pub type OpResult<T> = std::result::Result<T, AppError>;

pub use electronic::{build_dos_profile, parse_electronic_metadata};
pub use outcar::{
    build_convergence_profile, build_ionic_series, diagnose, diagnose_observables, export_dataset,
    export_tabular, summarize,
};
