//! # OUTCAR 子命令 CLI 定义
//!
//! summary / diagnose / profile / series / export
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/outcar.rs`

use super::ToleranceArgs;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use vasplens::analysis::{Dataset, Delimiter};

/// summary 子命令参数
#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Path to the OUTCAR file
    pub outcar: PathBuf,

    /// Include the per-step energy history
    #[arg(long, default_value_t = false)]
    pub history: bool,
}

/// diagnose 子命令参数
#[derive(Args, Debug)]
pub struct DiagnoseArgs {
    /// Path to the OUTCAR file
    pub outcar: PathBuf,

    #[command(flatten)]
    pub tolerances: ToleranceArgs,
}

/// profile 子命令参数
#[derive(Args, Debug)]
pub struct ProfileArgs {
    /// Path to the OUTCAR file
    pub outcar: PathBuf,

    /// Save a PNG plot of the energy profile to this path
    #[arg(long)]
    pub plot: Option<PathBuf>,
}

/// series 子命令参数
#[derive(Args, Debug)]
pub struct SeriesArgs {
    /// Path to the OUTCAR file
    pub outcar: PathBuf,
}

/// 导出数据集
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum DatasetArg {
    /// Energy, delta and relative energy per step
    ConvergenceProfile,
    /// Profile plus force, pressure and Fermi level per step
    IonicSeries,
}

impl From<DatasetArg> for Dataset {
    fn from(arg: DatasetArg) -> Self {
        match arg {
            DatasetArg::ConvergenceProfile => Dataset::ConvergenceProfile,
            DatasetArg::IonicSeries => Dataset::IonicSeries,
        }
    }
}

/// 字段分隔符
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum DelimiterArg {
    Comma,
    Semicolon,
    Tab,
}

impl From<DelimiterArg> for Delimiter {
    fn from(arg: DelimiterArg) -> Self {
        match arg {
            DelimiterArg::Comma => Delimiter::Comma,
            DelimiterArg::Semicolon => Delimiter::Semicolon,
            DelimiterArg::Tab => Delimiter::Tab,
        }
    }
}

/// export 子命令参数
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Path to the OUTCAR file
    pub outcar: PathBuf,

    /// Dataset to export
    #[arg(long, value_enum, default_value_t = DatasetArg::IonicSeries)]
    pub dataset: DatasetArg,

    /// Field delimiter
    #[arg(long, value_enum, default_value_t = DelimiterArg::Comma)]
    pub delimiter: DelimiterArg,

    /// Output file or directory (a directory gets the suggested file name);
    /// prints to stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
