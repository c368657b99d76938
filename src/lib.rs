//! # vasplens - VASP 输出解析与分析引擎
//!
//! 读取 OUTCAR / EIGENVAL / DOSCAR 文本，给出能量历史、收敛判定、带隙、
//! DOS 曲线以及多运行的批量统计。
//!
//! 核心操作只接受文本，所有失败统一为带稳定错误码的 `AppError`；
//! 文件读取与路径校验由适配层（CLI 或批量文件来源）完成。
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── operations/ (对外操作入口)
//!   │     ├── parsers/   (OUTCAR 状态机, EIGENVAL, DOSCAR)
//!   │     ├── analysis/  (收敛, 导出, 统计)
//!   │     └── models/    (数据模型)
//!   ├── batch/      (并行批量执行, OUTCAR 发现)
//!   ├── validation/ (路径与请求校验)
//!   ├── config.rs   (默认参数)
//!   ├── utils/      (终端输出, 进度条)
//!   └── error.rs    (错误处理)
//! ```

pub mod analysis;
pub mod batch;
pub mod config;
pub mod error;
pub mod models;
pub mod operations;
pub mod parsers;
pub mod utils;
pub mod validation;

pub use config::AnalysisConfig;
pub use error::{normalize_error, AppError, ErrorCode, VaspError};
pub use operations::OpResult;
