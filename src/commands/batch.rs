//! # 批量子命令实现
//!
//! ## 功能
//! - batch: 并行处理多个 OUTCAR（summary / diagnose / insights 三种模式）
//! - discover: 查找 OUTCAR 并列出运行目录
//!
//! ## 依赖关系
//! - 使用 `cli/batch.rs` 定义的参数
//! - 使用库中的 `batch/`, `validation/`, `utils/`

use super::print_json;
use crate::cli::batch::{BatchArgs, BatchMode, DiscoverArgs};

use tabled::{Table, Tabled};

use vasplens::batch::{
    self, BatchInsights, BatchOptions, BatchReport, DiagnosticsRow, Discovery, FileSource,
    RowStatus, RunCollector, SummaryRow,
};
use vasplens::error::{AppError, VaspError};
use vasplens::utils::output::{self, fmt_flag, fmt_opt};
use vasplens::utils::progress;
use vasplens::validation::validate_directory_path;
use vasplens::OpResult;

fn status_cell(status: RowStatus) -> String {
    match status {
        RowStatus::Ok => "ok".to_string(),
        RowStatus::Error => "error".to_string(),
    }
}

fn error_cell(error: &Option<AppError>) -> String {
    error
        .as_ref()
        .map_or(String::new(), |e| e.code.to_string())
}

/// summary 模式表格行
#[derive(Debug, Clone, Tabled)]
struct SummaryTableRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "System")]
    system: String,
    #[tabled(rename = "Steps")]
    steps: String,
    #[tabled(rename = "TOTEN (eV)")]
    energy: String,
    #[tabled(rename = "Max F (eV/Å)")]
    force: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl From<&SummaryRow> for SummaryTableRow {
    fn from(r: &SummaryRow) -> Self {
        SummaryTableRow {
            source: r.source.clone(),
            status: status_cell(r.status),
            system: r.system_name.clone().unwrap_or_default(),
            steps: r.ionic_steps.map_or(String::new(), |n| n.to_string()),
            energy: fmt_opt(r.final_total_energy_ev, 6),
            force: fmt_opt(r.max_force_ev_per_a, 4),
            error: error_cell(&r.error),
        }
    }
}

/// diagnose 模式表格行
#[derive(Debug, Clone, Tabled)]
struct DiagnosticsTableRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "TOTEN (eV)")]
    energy: String,
    #[tabled(rename = "P (kB)")]
    pressure: String,
    #[tabled(rename = "Energy conv.")]
    energy_ok: String,
    #[tabled(rename = "Force conv.")]
    force_ok: String,
    #[tabled(rename = "Error")]
    error: String,
}

impl From<&DiagnosticsRow> for DiagnosticsTableRow {
    fn from(r: &DiagnosticsRow) -> Self {
        DiagnosticsTableRow {
            source: r.source.clone(),
            status: status_cell(r.status),
            energy: fmt_opt(r.final_total_energy_ev, 6),
            pressure: fmt_opt(r.external_pressure_kb, 2),
            energy_ok: fmt_flag(r.is_energy_converged),
            force_ok: fmt_flag(r.is_force_converged),
            error: error_cell(&r.error),
        }
    }
}

/// 最低能量排名表格行
#[derive(Debug, Clone, Tabled)]
struct RankTableRow {
    #[tabled(rename = "Rank")]
    rank: usize,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "TOTEN (eV)")]
    energy: String,
    #[tabled(rename = "Max F (eV/Å)")]
    force: String,
    #[tabled(rename = "Converged")]
    converged: String,
}

/// 命令行路径 + `--root` 下发现的 OUTCAR
fn gather_sources(args: &BatchArgs) -> OpResult<Vec<FileSource>> {
    let mut sources: Vec<FileSource> = args.outcars.iter().map(FileSource::new).collect();

    if let Some(root) = &args.root {
        let root = validate_directory_path(&root.to_string_lossy(), "root_dir", "Root directory")?;
        let found = RunCollector::new(root).recursive(args.recursive).collect()?;
        output::print_warnings(&found.warnings);
        sources.extend(found.outcar_paths.iter().map(|p| FileSource::from_path(p)));
    }

    if sources.is_empty() {
        return Err(VaspError::invalid_field(
            "outcar_paths",
            "No OUTCAR files to process; pass paths or --root",
        )
        .into());
    }
    Ok(sources)
}

fn print_counts<R>(report: &BatchReport<R>) {
    let msg = format!(
        "{} runs: {} ok, {} failed",
        report.total_count, report.success_count, report.error_count
    );
    if report.error_count == 0 {
        output::print_success(&msg);
    } else {
        output::print_warning(&msg);
    }
}

fn print_insights(insights: &BatchInsights) {
    let stats = &insights.statistics;
    output::print_header("Batch Insights");
    output::print_field("Runs", insights.total_count);
    output::print_field("Parsed", insights.success_count);
    output::print_field("Failed", insights.error_count);
    output::print_field("Converged", stats.converged_count);
    output::print_field("Not converged", stats.not_converged_count);
    output::print_field("Unknown convergence", stats.unknown_convergence_count);
    output::print_field("Lowest TOTEN (eV)", fmt_opt(stats.energy_min_ev, 6));
    output::print_field("Highest TOTEN (eV)", fmt_opt(stats.energy_max_ev, 6));
    output::print_field("Mean TOTEN (eV)", fmt_opt(stats.energy_mean_ev, 6));
    output::print_field("Energy span (eV)", fmt_opt(stats.energy_span_ev, 6));
    output::print_field("Mean max force (eV/Å)", fmt_opt(stats.mean_max_force_ev_per_a, 4));

    if stats.top_lowest_energy.is_empty() {
        return;
    }
    output::print_header(&format!(
        "Top {} Runs by Energy",
        stats.top_lowest_energy.len()
    ));
    let rows: Vec<RankTableRow> = stats
        .top_lowest_energy
        .iter()
        .map(|r| RankTableRow {
            rank: r.rank,
            source: r.source.clone(),
            energy: format!("{:.6}", r.final_total_energy_ev),
            force: fmt_opt(r.max_force_ev_per_a, 4),
            converged: fmt_flag(r.is_converged),
        })
        .collect();
    println!("{}", Table::new(&rows));
}

/// batch
pub fn batch(args: BatchArgs, json: bool) -> OpResult<()> {
    let sources = gather_sources(&args)?;
    let options = BatchOptions {
        energy_tolerance_ev: args.tolerances.energy_tol,
        force_tolerance_ev_per_a: args.tolerances.force_tol,
        top_n: args.top_n,
        fail_fast: args.fail_fast,
        jobs: args.jobs,
        show_progress: !json,
    };

    if !json {
        output::print_info(&format!(
            "Processing {} OUTCAR files ({} mode)",
            sources.len(),
            args.mode
        ));
    }

    match args.mode {
        BatchMode::Summary => {
            let report = batch::batch_summarize(&sources, &options)?;
            if json {
                return print_json(&report);
            }
            output::print_header("Batch Summary");
            let rows: Vec<SummaryTableRow> = report.rows.iter().map(SummaryTableRow::from).collect();
            println!("{}", Table::new(&rows));
            print_counts(&report);
        }
        BatchMode::Diagnose => {
            let report = batch::batch_diagnose(&sources, &options)?;
            if json {
                return print_json(&report);
            }
            output::print_header("Batch Diagnostics");
            let rows: Vec<DiagnosticsTableRow> =
                report.rows.iter().map(DiagnosticsTableRow::from).collect();
            println!("{}", Table::new(&rows));
            print_counts(&report);
        }
        BatchMode::Insights => {
            let insights = batch::batch_insights(&sources, &options)?;
            if json {
                return print_json(&insights);
            }
            print_insights(&insights);
        }
    }
    Ok(())
}

fn print_discovery(found: &Discovery) {
    output::print_header(&format!("OUTCAR files under {}", found.root_dir.display()));
    for path in &found.outcar_paths {
        println!("  {}", path.display());
    }
    println!();
    output::print_warnings(&found.warnings);
    output::print_success(&format!(
        "Returned {} of {} discovered runs",
        found.returned_count, found.total_discovered
    ));
}

/// discover
pub fn discover(args: DiscoverArgs, json: bool) -> OpResult<()> {
    let root = validate_directory_path(&args.root.to_string_lossy(), "root_dir", "Root directory")?;

    let mut collector = RunCollector::new(root)
        .recursive(args.recursive)
        .max_runs(vasplens::validation::positive_count(args.max_runs, "max_runs")?);
    if let Some(pattern) = &args.pattern {
        collector = collector.with_pattern(pattern)?;
    }

    let spinner = (!json).then(|| progress::create_spinner("Scanning for OUTCAR files..."));
    let found = collector.collect();
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let found = found?;

    if json {
        return print_json(&found);
    }
    print_discovery(&found);
    Ok(())
}
