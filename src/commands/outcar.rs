//! # OUTCAR 子命令实现
//!
//! ## 功能
//! - summary: 运行摘要（可选能量历史）
//! - diagnose: 收敛判定 + 压力/应力/磁矩
//! - profile: 收敛曲线（可选 PNG）
//! - series: 离子步序列
//! - export: 分隔文本导出
//!
//! ## 依赖关系
//! - 使用 `cli/outcar.rs` 定义的参数
//! - 使用库中的 `operations/outcar.rs`, `utils/output.rs`
//! - 使用 `commands/plot.rs` 绘图

use super::{plot, print_json, read_outcar};
use crate::cli::outcar::{DiagnoseArgs, ExportArgs, ProfileArgs, SeriesArgs, SummaryArgs};

use std::fs;
use tabled::{Table, Tabled};

use vasplens::error::VaspError;
use vasplens::models::{ConvergenceProfilePoint, IonicSeriesPoint, RunSummary};
use vasplens::operations;
use vasplens::utils::output::{self, fmt_flag, fmt_opt};
use vasplens::OpResult;

/// 收敛曲线表格行
#[derive(Debug, Clone, Tabled)]
struct ProfileRow {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "TOTEN (eV)")]
    energy: String,
    #[tabled(rename = "ΔE (eV)")]
    delta: String,
    #[tabled(rename = "E - E₁ (eV)")]
    relative: String,
}

impl From<&ConvergenceProfilePoint> for ProfileRow {
    fn from(p: &ConvergenceProfilePoint) -> Self {
        ProfileRow {
            step: p.ionic_step,
            energy: format!("{:.6}", p.total_energy_ev),
            delta: fmt_opt(p.delta_energy_ev, 6),
            relative: fmt_opt(p.relative_energy_ev, 6),
        }
    }
}

/// 离子步序列表格行
#[derive(Debug, Clone, Tabled)]
struct SeriesRow {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "TOTEN (eV)")]
    energy: String,
    #[tabled(rename = "ΔE (eV)")]
    delta: String,
    #[tabled(rename = "Max F (eV/Å)")]
    force: String,
    #[tabled(rename = "P (kB)")]
    pressure: String,
    #[tabled(rename = "E-fermi (eV)")]
    fermi: String,
}

impl From<&IonicSeriesPoint> for SeriesRow {
    fn from(p: &IonicSeriesPoint) -> Self {
        SeriesRow {
            step: p.ionic_step,
            energy: format!("{:.6}", p.total_energy_ev),
            delta: fmt_opt(p.delta_energy_ev, 6),
            force: fmt_opt(p.max_force_ev_per_a, 4),
            pressure: fmt_opt(p.external_pressure_kb, 2),
            fermi: fmt_opt(p.fermi_energy_ev, 4),
        }
    }
}

fn print_summary_fields(summary: &RunSummary) {
    output::print_field("System", summary.system_name.as_deref().unwrap_or("-"));
    output::print_field(
        "Ions",
        summary.nions.map_or("-".to_string(), |n| n.to_string()),
    );
    output::print_field("Ionic steps", summary.ionic_steps);
    output::print_field("Electronic iterations", summary.electronic_iterations);
    output::print_field(
        "Final TOTEN (eV)",
        format!("{:.6}", summary.final_total_energy_ev),
    );
    output::print_field("E-fermi (eV)", fmt_opt(summary.final_fermi_energy_ev, 4));
    output::print_field("Max force (eV/Å)", fmt_opt(summary.max_force_ev_per_a, 4));
}

/// summary
pub fn summary(args: SummaryArgs, json: bool) -> OpResult<()> {
    let text = read_outcar(&args.outcar)?;
    let summary = operations::summarize(&text, args.history)?;

    if json {
        return print_json(&summary);
    }

    output::print_header(&format!("Summary of {}", args.outcar.display()));
    print_summary_fields(&summary);

    if !summary.energy_history.is_empty() {
        println!();
        let rows: Vec<ProfileRow> = vasplens::analysis::build_convergence_profile(&summary)
            .iter()
            .map(ProfileRow::from)
            .collect();
        println!("{}", Table::new(&rows));
    }

    output::print_warnings(&summary.warnings);
    Ok(())
}

/// diagnose
pub fn diagnose(args: DiagnoseArgs, json: bool) -> OpResult<()> {
    let text = read_outcar(&args.outcar)?;
    let diag = operations::diagnose(
        &text,
        args.tolerances.energy_tol,
        args.tolerances.force_tol,
    )?;

    if json {
        return print_json(&diag);
    }

    output::print_header(&format!("Diagnostics for {}", args.outcar.display()));
    print_summary_fields(&diag.summary);
    output::print_field(
        "External pressure (kB)",
        fmt_opt(diag.external_pressure_kb, 2),
    );
    if let Some(stress) = &diag.stress_tensor_kb {
        output::print_field(
            "Stress xx yy zz (kB)",
            format!("{:.2} {:.2} {:.2}", stress.xx_kb, stress.yy_kb, stress.zz_kb),
        );
        output::print_field(
            "Stress xy yz zx (kB)",
            format!("{:.2} {:.2} {:.2}", stress.xy_kb, stress.yz_kb, stress.zx_kb),
        );
    }
    if let Some(mag) = &diag.magnetization {
        output::print_field(
            &format!("Magnetization {} (μB)", mag.axis),
            format!("{:.3}", mag.total_moment_mu_b),
        );
    }

    let verdict = &diag.convergence;
    println!();
    output::print_field(
        &format!("|ΔE| < {:e} eV", verdict.energy_tolerance_ev),
        fmt_flag(verdict.is_energy_converged),
    );
    output::print_field(
        &format!("Max F < {} eV/Å", verdict.force_tolerance_ev_per_a),
        fmt_flag(verdict.is_force_converged),
    );

    output::print_warnings(&diag.warnings);
    if verdict.is_converged {
        output::print_success("Run is converged");
    } else if verdict.is_decided() {
        output::print_warning("Run is not converged");
    } else {
        output::print_warning("Convergence could not be fully evaluated");
    }
    Ok(())
}

/// profile
pub fn profile(args: ProfileArgs, json: bool) -> OpResult<()> {
    let text = read_outcar(&args.outcar)?;
    let points = operations::build_convergence_profile(&text)?;

    if let Some(plot_path) = &args.plot {
        plot::plot_convergence_profile(&points, plot_path)?;
        output::print_success(&format!("Profile plot saved to '{}'", plot_path.display()));
    }

    if json {
        return print_json(&points);
    }

    output::print_header(&format!("Convergence profile of {}", args.outcar.display()));
    let rows: Vec<ProfileRow> = points.iter().map(ProfileRow::from).collect();
    println!("{}", Table::new(&rows));
    Ok(())
}

/// series
pub fn series(args: SeriesArgs, json: bool) -> OpResult<()> {
    let text = read_outcar(&args.outcar)?;
    let points = operations::build_ionic_series(&text)?;

    if json {
        return print_json(&points);
    }

    output::print_header(&format!("Ionic series of {}", args.outcar.display()));
    let rows: Vec<SeriesRow> = points.iter().map(SeriesRow::from).collect();
    println!("{}", Table::new(&rows));
    Ok(())
}

/// export
pub fn export(args: ExportArgs, json: bool) -> OpResult<()> {
    let text = read_outcar(&args.outcar)?;
    let export = operations::export_dataset(&text, args.dataset.into(), args.delimiter.into())?;

    let Some(target) = args.output else {
        if json {
            return print_json(&export);
        }
        print!("{}", export.content);
        return Ok(());
    };

    let path = if target.is_dir() {
        target.join(&export.filename_hint)
    } else {
        target
    };
    fs::write(&path, &export.content).map_err(|e| VaspError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    if json {
        return print_json(&serde_json::json!({
            "dataset": export.dataset,
            "delimiter": export.delimiter,
            "row_count": export.row_count,
            "path": path,
        }));
    }
    output::print_success(&format!(
        "Exported {} {} rows to '{}'",
        export.row_count,
        export.dataset,
        path.display()
    ));
    Ok(())
}
