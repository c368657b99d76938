//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `summary` / `diagnose` / `profile` / `series` / `export`: 单个 OUTCAR
//! - `electronic` / `dos`: EIGENVAL 与 DOSCAR
//! - `batch` / `discover`: 多个运行
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: outcar, electronic, batch

pub mod batch;
pub mod electronic;
pub mod outcar;

use clap::{Args, Parser, Subcommand};

use vasplens::config::{DEFAULT_ENERGY_TOLERANCE_EV, DEFAULT_FORCE_TOLERANCE_EV_PER_A};

/// vasplens - VASP 输出分析工具
#[derive(Parser)]
#[command(name = "vasplens")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Convergence and electronic-structure analysis for VASP output files", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Summarize an OUTCAR: system, steps, final energy, Fermi level, max force
    Summary(outcar::SummaryArgs),

    /// Check energy/force convergence and report pressure, stress and magnetization
    Diagnose(outcar::DiagnoseArgs),

    /// Per-step energy change and energy relative to the first step
    Profile(outcar::ProfileArgs),

    /// Per-step energy, force, pressure and Fermi level
    Series(outcar::SeriesArgs),

    /// Export the convergence profile or ionic series as delimited text
    Export(outcar::ExportArgs),

    /// Band gap and DOS metadata from EIGENVAL and/or DOSCAR
    Electronic(electronic::ElectronicArgs),

    /// Total DOS around the Fermi energy
    Dos(electronic::DosArgs),

    /// Summarize, diagnose or rank many OUTCAR files in parallel
    Batch(batch::BatchArgs),

    /// Find OUTCAR files under a directory
    Discover(batch::DiscoverArgs),
}

/// 收敛阈值参数（diagnose 与 batch 共用）
#[derive(Args, Debug, Clone, Copy)]
pub struct ToleranceArgs {
    /// Energy tolerance on the last ionic step change (eV)
    #[arg(long, env = "VASPLENS_ENERGY_TOL", default_value_t = DEFAULT_ENERGY_TOLERANCE_EV)]
    pub energy_tol: f64,

    /// Force tolerance on the largest atomic force (eV/Å)
    #[arg(long, env = "VASPLENS_FORCE_TOL", default_value_t = DEFAULT_FORCE_TOLERANCE_EV_PER_A)]
    pub force_tol: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_json_flag() {
        let cli = Cli::try_parse_from(["vasplens", "summary", "OUTCAR", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Summary(_)));
    }

    #[test]
    fn test_tolerance_defaults() {
        let cli = Cli::try_parse_from(["vasplens", "diagnose", "OUTCAR"]).unwrap();
        match cli.command {
            Commands::Diagnose(args) => {
                assert_eq!(args.tolerances.force_tol, DEFAULT_FORCE_TOLERANCE_EV_PER_A);
            }
            _ => panic!("expected diagnose"),
        }
    }
}
