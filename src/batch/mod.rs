//! # 批量处理模块
//!
//! 对多个 OUTCAR 独立执行解析与分析，每个输入对应一行结果。
//!
//! ## 功能
//! - 行顺序与输入顺序一致
//! - 单个输入的失败记录在行的 `error` 字段，不影响其他行
//! - fail-fast 模式下第一个失败直接作为整体错误返回，已收集的行被丢弃
//! - `success_count + error_count == total_count`
//!
//! ## 依赖关系
//! - 被 CLI `batch` / `discover` 命令使用
//! - 使用 `operations/`, `analysis/`
//! - 子模块: runner, collector, source

pub mod collector;
pub mod runner;
pub mod source;

pub use collector::{Discovery, RunCollector};
pub use runner::{BatchResult, BatchRunner, TaskOutcome};
pub use source::{FileSource, LogSource, TextSource};

use crate::analysis::{self, InsightSample, InsightStatistics};
use crate::config::{AnalysisConfig, DEFAULT_TOP_N};
use crate::error::{internal_error, AppError};
use crate::models::{RunDiagnostics, RunSummary};
use crate::operations::{self, OpResult};
use crate::parsers::OutcarParser;
use crate::validation::{BatchRequest, DiscoverRequest};

use serde::{Deserialize, Serialize};

/// 批量执行参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchOptions {
    pub energy_tolerance_ev: f64,
    pub force_tolerance_ev_per_a: f64,
    pub top_n: usize,
    pub fail_fast: bool,
    /// 0 = 自动
    pub jobs: usize,
    pub show_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl BatchOptions {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        BatchOptions {
            energy_tolerance_ev: config.energy_tolerance_ev,
            force_tolerance_ev_per_a: config.force_tolerance_ev_per_a,
            top_n: DEFAULT_TOP_N,
            fail_fast: config.fail_fast,
            jobs: config.jobs,
            show_progress: false,
        }
    }
}

impl From<&BatchRequest> for BatchOptions {
    fn from(req: &BatchRequest) -> Self {
        BatchOptions {
            energy_tolerance_ev: req.energy_tolerance_ev,
            force_tolerance_ev_per_a: req.force_tolerance_ev_per_a,
            top_n: req.top_n,
            fail_fast: req.fail_fast,
            jobs: req.jobs,
            show_progress: false,
        }
    }
}

/// 行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Ok,
    Error,
}

/// 批量结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport<Row> {
    pub total_count: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub rows: Vec<Row>,
}

// ─────────────────────────────────────────────────────────────
// 行类型
// ─────────────────────────────────────────────────────────────

/// batch summarize 的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub source: String,
    pub status: RowStatus,
    pub system_name: Option<String>,
    pub ionic_steps: Option<usize>,
    pub electronic_iterations: Option<usize>,
    pub final_total_energy_ev: Option<f64>,
    pub final_fermi_energy_ev: Option<f64>,
    pub max_force_ev_per_a: Option<f64>,
    pub warnings: Vec<String>,
    pub error: Option<AppError>,
}

/// batch diagnose 的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsRow {
    pub source: String,
    pub status: RowStatus,
    pub final_total_energy_ev: Option<f64>,
    pub max_force_ev_per_a: Option<f64>,
    pub external_pressure_kb: Option<f64>,
    pub is_energy_converged: Option<bool>,
    pub is_force_converged: Option<bool>,
    pub is_converged: Option<bool>,
    pub warnings: Vec<String>,
    pub error: Option<AppError>,
}

/// batch insights 的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsRow {
    pub source: String,
    pub status: RowStatus,
    pub system_name: Option<String>,
    pub final_total_energy_ev: Option<f64>,
    pub max_force_ev_per_a: Option<f64>,
    pub external_pressure_kb: Option<f64>,
    /// 任一收敛项无法判定时为 None
    pub is_converged: Option<bool>,
    pub warnings: Vec<String>,
    pub error: Option<AppError>,
}

/// batch insights 结果：计数 + 统计 + 行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchInsights {
    pub total_count: usize,
    pub success_count: usize,
    pub error_count: usize,
    #[serde(flatten)]
    pub statistics: InsightStatistics,
    pub rows: Vec<InsightsRow>,
}

impl SummaryRow {
    fn ok(source: String, summary: RunSummary) -> Self {
        SummaryRow {
            source,
            status: RowStatus::Ok,
            system_name: summary.system_name,
            ionic_steps: Some(summary.ionic_steps),
            electronic_iterations: Some(summary.electronic_iterations),
            final_total_energy_ev: Some(summary.final_total_energy_ev),
            final_fermi_energy_ev: summary.final_fermi_energy_ev,
            max_force_ev_per_a: summary.max_force_ev_per_a,
            warnings: summary.warnings,
            error: None,
        }
    }

    fn failed(source: String, error: AppError) -> Self {
        SummaryRow {
            source,
            status: RowStatus::Error,
            system_name: None,
            ionic_steps: None,
            electronic_iterations: None,
            final_total_energy_ev: None,
            final_fermi_energy_ev: None,
            max_force_ev_per_a: None,
            warnings: Vec::new(),
            error: Some(error),
        }
    }
}

impl DiagnosticsRow {
    fn ok(source: String, diag: RunDiagnostics) -> Self {
        DiagnosticsRow {
            source,
            status: RowStatus::Ok,
            final_total_energy_ev: Some(diag.summary.final_total_energy_ev),
            max_force_ev_per_a: diag.summary.max_force_ev_per_a,
            external_pressure_kb: diag.external_pressure_kb,
            is_energy_converged: diag.convergence.is_energy_converged,
            is_force_converged: diag.convergence.is_force_converged,
            is_converged: Some(diag.convergence.is_converged),
            warnings: diag.warnings,
            error: None,
        }
    }

    fn failed(source: String, error: AppError) -> Self {
        DiagnosticsRow {
            source,
            status: RowStatus::Error,
            final_total_energy_ev: None,
            max_force_ev_per_a: None,
            external_pressure_kb: None,
            is_energy_converged: None,
            is_force_converged: None,
            is_converged: None,
            warnings: Vec::new(),
            error: Some(error),
        }
    }
}

impl InsightsRow {
    fn ok(source: String, diag: RunDiagnostics) -> Self {
        let is_converged = diag
            .convergence
            .is_decided()
            .then_some(diag.convergence.is_converged);
        InsightsRow {
            source,
            status: RowStatus::Ok,
            system_name: diag.summary.system_name,
            final_total_energy_ev: Some(diag.summary.final_total_energy_ev),
            max_force_ev_per_a: diag.summary.max_force_ev_per_a,
            external_pressure_kb: diag.external_pressure_kb,
            is_converged,
            warnings: diag.warnings,
            error: None,
        }
    }

    fn failed(source: String, error: AppError) -> Self {
        InsightsRow {
            source,
            status: RowStatus::Error,
            system_name: None,
            final_total_energy_ev: None,
            max_force_ev_per_a: None,
            external_pressure_kb: None,
            is_converged: None,
            warnings: Vec::new(),
            error: Some(error),
        }
    }

    fn sample(&self) -> Option<InsightSample> {
        match (self.status, self.final_total_energy_ev) {
            (RowStatus::Ok, Some(energy)) => Some(InsightSample {
                source: self.source.clone(),
                system_name: self.system_name.clone(),
                final_total_energy_ev: energy,
                max_force_ev_per_a: self.max_force_ev_per_a,
                is_converged: self.is_converged,
            }),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────
// 批量执行
// ─────────────────────────────────────────────────────────────

/// 对每个来源执行 `analyze`，再按输入顺序构造行
fn run_rows<S, T, Row, F>(
    sources: &[S],
    options: &BatchOptions,
    analyze: F,
    ok_row: fn(String, T) -> Row,
    failed_row: fn(String, AppError) -> Row,
    is_ok: fn(&Row) -> bool,
) -> OpResult<BatchReport<Row>>
where
    S: LogSource,
    T: Send,
    F: Fn(&str) -> OpResult<T> + Sync + Send,
{
    let runner = BatchRunner::new(options.jobs)
        .fail_fast(options.fail_fast)
        .with_progress(options.show_progress);

    let result = runner.run(sources, |_, source| {
        let text = source.read_text()?;
        analyze(&text)
    })?;

    if options.fail_fast {
        if let Some((index, err)) = result.first_failure() {
            return Err(err
                .clone()
                .with_detail("source", sources[index].label())
                .with_detail("index", index));
        }
    }

    let rows: Vec<Row> = sources
        .iter()
        .zip(result.outcomes)
        .map(|(source, outcome)| match outcome {
            TaskOutcome::Done(value) => ok_row(source.label(), value),
            TaskOutcome::Failed(err) => failed_row(source.label(), err),
            TaskOutcome::Skipped => {
                failed_row(source.label(), internal_error("item was not processed"))
            }
        })
        .collect();

    let success_count = rows.iter().filter(|r| is_ok(r)).count();
    Ok(BatchReport {
        total_count: rows.len(),
        success_count,
        error_count: rows.len() - success_count,
        rows,
    })
}

fn diagnose_text(text: &str, options: &BatchOptions) -> OpResult<RunDiagnostics> {
    let observables = OutcarParser::new()?.parse_observables(text)?;
    Ok(operations::diagnose_observables(
        observables,
        options.energy_tolerance_ev,
        options.force_tolerance_ev_per_a,
    ))
}

/// 批量摘要
pub fn batch_summarize<S: LogSource>(
    sources: &[S],
    options: &BatchOptions,
) -> OpResult<BatchReport<SummaryRow>> {
    run_rows(
        sources,
        options,
        |text| operations::summarize(text, false),
        SummaryRow::ok,
        SummaryRow::failed,
        |row| row.status == RowStatus::Ok,
    )
}

/// 批量诊断
pub fn batch_diagnose<S: LogSource>(
    sources: &[S],
    options: &BatchOptions,
) -> OpResult<BatchReport<DiagnosticsRow>> {
    let options = validated(options)?;
    run_rows(
        sources,
        &options,
        |text| diagnose_text(text, &options),
        DiagnosticsRow::ok,
        DiagnosticsRow::failed,
        |row| row.status == RowStatus::Ok,
    )
}

/// 批量统计：收敛计数、能量统计、最低能量排名
pub fn batch_insights<S: LogSource>(
    sources: &[S],
    options: &BatchOptions,
) -> OpResult<BatchInsights> {
    let options = validated(options)?;
    let report = run_rows(
        sources,
        &options,
        |text| diagnose_text(text, &options),
        InsightsRow::ok,
        InsightsRow::failed,
        |row| row.status == RowStatus::Ok,
    )?;

    let samples: Vec<InsightSample> = report.rows.iter().filter_map(InsightsRow::sample).collect();
    let statistics = analysis::summarize_samples(&samples, options.top_n);

    Ok(BatchInsights {
        total_count: report.total_count,
        success_count: report.success_count,
        error_count: report.error_count,
        statistics,
        rows: report.rows,
    })
}

fn validated(options: &BatchOptions) -> OpResult<BatchOptions> {
    use crate::validation::{positive_count, positive_finite};
    Ok(BatchOptions {
        energy_tolerance_ev: positive_finite(options.energy_tolerance_ev, "energy_tolerance_ev")?,
        force_tolerance_ev_per_a: positive_finite(
            options.force_tolerance_ev_per_a,
            "force_tolerance_ev_per_a",
        )?,
        top_n: positive_count(options.top_n, "top_n")?,
        ..*options
    })
}

/// 把批量请求中的路径转成文件来源
pub fn file_sources(request: &BatchRequest) -> Vec<FileSource> {
    request.outcar_paths.iter().map(FileSource::new).collect()
}

/// 在根目录下发现 OUTCAR
pub fn discover_runs(request: &DiscoverRequest) -> OpResult<Discovery> {
    RunCollector::new(request.root_dir.clone())
        .recursive(request.recursive)
        .max_runs(request.max_runs)
        .collect()
        .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const SAMPLE: &str = include_str!("../../tests/fixtures/OUTCAR.sample");

    fn sources() -> Vec<TextSource> {
        vec![
            TextSource::new("good", SAMPLE),
            TextSource::new("broken", "no energies here"),
            TextSource::new(
                "single",
                "  free  energy   TOTEN  =       -20.00000000 eV\n",
            ),
        ]
    }

    #[test]
    fn test_batch_summarize_collects_errors() {
        let report = batch_summarize(&sources(), &BatchOptions::default()).unwrap();

        assert_eq!(report.total_count, 3);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.error_count, 1);
        assert_eq!(report.success_count + report.error_count, report.total_count);

        let labels: Vec<&str> = report.rows.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(labels, vec!["good", "broken", "single"]);
        assert_eq!(report.rows[1].status, RowStatus::Error);
        assert_eq!(
            report.rows[1].error.as_ref().unwrap().code,
            ErrorCode::ParseError
        );
        assert_eq!(report.rows[0].final_total_energy_ev, Some(-10.5));
    }

    #[test]
    fn test_batch_fail_fast_returns_first_error() {
        let options = BatchOptions {
            fail_fast: true,
            jobs: 1,
            ..BatchOptions::default()
        };
        let err = batch_summarize(&sources(), &options).unwrap_err();

        assert_eq!(err.code, ErrorCode::ParseError);
        let details = err.details.unwrap();
        assert_eq!(details["source"], "broken");
        assert_eq!(details["index"], 1);
    }

    #[test]
    fn test_batch_diagnose_rows() {
        let report = batch_diagnose(&sources(), &BatchOptions::default()).unwrap();

        let good = &report.rows[0];
        assert_eq!(good.is_force_converged, Some(true));
        assert_eq!(good.is_energy_converged, Some(false));
        assert_eq!(good.external_pressure_kb, Some(-1.5));

        let single = &report.rows[2];
        assert_eq!(single.is_energy_converged, None);
        assert_eq!(single.is_converged, Some(false));
    }

    #[test]
    fn test_batch_insights() {
        let options = BatchOptions {
            top_n: 1,
            ..BatchOptions::default()
        };
        let insights = batch_insights(&sources(), &options).unwrap();

        assert_eq!(insights.total_count, 3);
        assert_eq!(insights.statistics.not_converged_count, 1);
        assert_eq!(insights.statistics.unknown_convergence_count, 1);
        assert_eq!(insights.statistics.energy_min_ev, Some(-20.0));
        assert_eq!(insights.statistics.top_lowest_energy.len(), 1);
        assert_eq!(insights.statistics.top_lowest_energy[0].source, "single");
    }

    #[test]
    fn test_batch_rejects_bad_tolerance() {
        let options = BatchOptions {
            energy_tolerance_ev: 0.0,
            ..BatchOptions::default()
        };
        let err = batch_diagnose(&sources(), &options).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_file_sources_report_missing_files() {
        let request = BatchRequest {
            outcar_paths: vec!["/missing/OUTCAR".to_string()],
            energy_tolerance_ev: 1e-4,
            force_tolerance_ev_per_a: 0.02,
            top_n: 5,
            fail_fast: false,
            jobs: 1,
        };
        let report = batch_summarize(&file_sources(&request), &BatchOptions::from(&request)).unwrap();

        assert_eq!(report.error_count, 1);
        assert_eq!(
            report.rows[0].error.as_ref().unwrap().code,
            ErrorCode::FileNotFound
        );
    }
}
