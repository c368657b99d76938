//! # 电子结构子命令 CLI 定义
//!
//! - `electronic`: 带隙与 DOS 元数据
//! - `dos`: 费米能级附近的 DOS 曲线
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/electronic.rs`

use clap::Args;
use std::path::PathBuf;

use vasplens::config::{DEFAULT_DOS_MAX_POINTS, DEFAULT_DOS_WINDOW_EV};

/// electronic 子命令参数
#[derive(Args, Debug)]
#[command(group(
    clap::ArgGroup::new("sources")
        .required(true)
        .multiple(true)
        .args(["eigenval", "doscar"]),
))]
pub struct ElectronicArgs {
    /// Path to the EIGENVAL file
    #[arg(long)]
    pub eigenval: Option<PathBuf>,

    /// Path to the DOSCAR file
    #[arg(long)]
    pub doscar: Option<PathBuf>,
}

/// dos 子命令参数
#[derive(Args, Debug)]
pub struct DosArgs {
    /// Path to the DOSCAR file
    pub doscar: PathBuf,

    /// Half-width of the energy window around the Fermi level (eV)
    #[arg(long, env = "VASPLENS_DOS_WINDOW", default_value_t = DEFAULT_DOS_WINDOW_EV)]
    pub window: f64,

    /// Maximum number of points to return
    #[arg(long, env = "VASPLENS_DOS_MAX_POINTS", default_value_t = DEFAULT_DOS_MAX_POINTS)]
    pub max_points: usize,
}
