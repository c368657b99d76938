//! # 批量子命令 CLI 定义
//!
//! - `batch`: 并行处理多个 OUTCAR
//! - `discover`: 在目录下查找 OUTCAR
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/batch.rs`

use super::ToleranceArgs;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use vasplens::config::{DEFAULT_MAX_RUNS, DEFAULT_TOP_N};

/// 批量模式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum BatchMode {
    /// One summary row per run
    Summary,
    /// One convergence row per run
    Diagnose,
    /// Convergence counts, energy statistics and lowest-energy ranking
    Insights,
}

impl std::fmt::Display for BatchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchMode::Summary => write!(f, "summary"),
            BatchMode::Diagnose => write!(f, "diagnose"),
            BatchMode::Insights => write!(f, "insights"),
        }
    }
}

/// batch 子命令参数
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// OUTCAR files to process
    pub outcars: Vec<String>,

    /// Also process every OUTCAR found under this directory
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Search the root directory recursively
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// What to compute for each run
    #[arg(long, value_enum, default_value_t = BatchMode::Summary)]
    pub mode: BatchMode,

    #[command(flatten)]
    pub tolerances: ToleranceArgs,

    /// Number of lowest-energy runs to rank (insights mode)
    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    /// Stop at the first failing run
    #[arg(long, env = "VASPLENS_FAIL_FAST", default_value_t = false)]
    pub fail_fast: bool,

    /// Number of parallel jobs (0 = number of CPUs)
    #[arg(short, long, env = "VASPLENS_JOBS", default_value_t = 0)]
    pub jobs: usize,
}

/// discover 子命令参数
#[derive(Args, Debug)]
pub struct DiscoverArgs {
    /// Root directory to search
    pub root: PathBuf,

    /// Search recursively instead of one level deep
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// Maximum number of runs to return
    #[arg(long, default_value_t = DEFAULT_MAX_RUNS)]
    pub max_runs: usize,

    /// File name glob to match instead of OUTCAR
    #[arg(long)]
    pub pattern: Option<String>,
}
