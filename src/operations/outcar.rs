//! # OUTCAR 操作
//!
//! 输入 OUTCAR 文本，输出摘要、诊断、收敛曲线、离子步序列或表格导出。
//!
//! ## 依赖关系
//! - 使用 `parsers/outcar.rs`, `analysis/`
//! - 被 `batch/` 和 CLI 使用

use super::OpResult;
use crate::analysis::{self, Dataset, Delimiter, TabularExport, TabularRecord};
use crate::error::AppError;
use crate::models::{
    ConvergenceProfilePoint, IonicSeriesPoint, RunDiagnostics, RunObservables, RunSummary,
};
use crate::parsers::OutcarParser;
use crate::validation::positive_finite;

fn parse_observables(log_text: &str) -> OpResult<RunObservables> {
    let parser = OutcarParser::new()?;
    Ok(parser.parse_observables(log_text)?)
}

/// 摘要；`include_history = false` 时清空能量历史
pub fn summarize(log_text: &str, include_history: bool) -> OpResult<RunSummary> {
    let summary = OutcarParser::new()?.parse_summary(log_text)?;
    Ok(if include_history {
        summary
    } else {
        summary.without_history()
    })
}

/// 在已解析的可观测量上做收敛诊断
pub fn diagnose_observables(
    observables: RunObservables,
    energy_tolerance_ev: f64,
    force_tolerance_ev_per_a: f64,
) -> RunDiagnostics {
    let convergence = analysis::evaluate_convergence(
        &observables.summary,
        energy_tolerance_ev,
        force_tolerance_ev_per_a,
    );

    let warnings = analysis::dedup_warnings(
        observables
            .summary
            .warnings
            .iter()
            .cloned()
            .chain(observables.warnings)
            .chain(analysis::verdict_warnings(&convergence)),
    );

    RunDiagnostics {
        summary: observables.summary,
        external_pressure_kb: observables.external_pressure_kb,
        stress_tensor_kb: observables.stress_tensor_kb,
        magnetization: observables.magnetization,
        convergence,
        warnings,
    }
}

/// 诊断：摘要 + 压力/应力/磁矩 + 收敛判定
pub fn diagnose(
    log_text: &str,
    energy_tolerance_ev: f64,
    force_tolerance_ev_per_a: f64,
) -> OpResult<RunDiagnostics> {
    let energy_tolerance_ev = positive_finite(energy_tolerance_ev, "energy_tolerance_ev")?;
    let force_tolerance_ev_per_a =
        positive_finite(force_tolerance_ev_per_a, "force_tolerance_ev_per_a")?;

    let observables = parse_observables(log_text)?;
    Ok(diagnose_observables(
        observables,
        energy_tolerance_ev,
        force_tolerance_ev_per_a,
    ))
}

pub fn build_convergence_profile(log_text: &str) -> OpResult<Vec<ConvergenceProfilePoint>> {
    let summary = OutcarParser::new()?.parse_summary(log_text)?;
    Ok(analysis::build_convergence_profile(&summary))
}

pub fn build_ionic_series(log_text: &str) -> OpResult<Vec<IonicSeriesPoint>> {
    let observables = parse_observables(log_text)?;
    Ok(analysis::build_ionic_series(&observables))
}

/// 导出已计算好的点序列
pub fn export_tabular<R: TabularRecord>(
    points: &[R],
    dataset: Dataset,
    delimiter: Delimiter,
) -> OpResult<TabularExport> {
    analysis::export_tabular(points, dataset, delimiter).map_err(AppError::from)
}

/// 从 OUTCAR 文本直接导出指定数据集
pub fn export_dataset(
    log_text: &str,
    dataset: Dataset,
    delimiter: Delimiter,
) -> OpResult<TabularExport> {
    match dataset {
        Dataset::ConvergenceProfile => {
            export_tabular(&build_convergence_profile(log_text)?, dataset, delimiter)
        }
        Dataset::IonicSeries => export_tabular(&build_ionic_series(log_text)?, dataset, delimiter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const SAMPLE: &str = include_str!("../../tests/fixtures/OUTCAR.sample");

    #[test]
    fn test_summarize_without_history() {
        let summary = summarize(SAMPLE, false).unwrap();
        assert!(summary.energy_history.is_empty());
        assert_eq!(summary.ionic_steps, 2);

        let with_history = summarize(SAMPLE, true).unwrap();
        assert_eq!(with_history.energy_history.len(), 2);
    }

    #[test]
    fn test_diagnose_sample() {
        let diag = diagnose(SAMPLE, 1e-4, 0.02).unwrap();

        assert_eq!(diag.convergence.is_force_converged, Some(true));
        // 最后两步相差 0.1 eV
        assert_eq!(diag.convergence.is_energy_converged, Some(false));
        assert!(!diag.convergence.is_converged);
        assert!(diag.warnings.is_empty());
        assert!(diag.magnetization.is_some());
    }

    #[test]
    fn test_diagnose_rejects_bad_tolerance_before_parsing() {
        let err = diagnose("garbage", 0.0, 0.02).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_diagnose_reports_unknown_convergence() {
        let text = "  free  energy   TOTEN  =       -1.00000000 eV\n";
        let diag = diagnose(text, 1e-4, 0.02).unwrap();

        assert!(!diag.convergence.is_decided());
        assert!(diag
            .warnings
            .iter()
            .any(|w| w.starts_with("Energy convergence could not be evaluated")));
        assert!(diag
            .warnings
            .iter()
            .any(|w| w.starts_with("Force convergence could not be evaluated")));
    }

    #[test]
    fn test_export_dataset() {
        let export = export_dataset(SAMPLE, Dataset::IonicSeries, Delimiter::Comma).unwrap();
        assert_eq!(export.row_count, 2);
        assert_eq!(export.filename_hint, "ionic_series.csv");
        assert_eq!(export.content.lines().count(), 3);
    }

    #[test]
    fn test_parse_failure_is_app_error() {
        let err = build_convergence_profile("nothing here").unwrap_err();
        assert_eq!(err.code, ErrorCode::ParseError);
    }
}
