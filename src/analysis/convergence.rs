//! # 收敛分析
//!
//! 由 OUTCAR 摘要计算收敛判定、收敛曲线和离子步序列。
//!
//! ## 依赖关系
//! - 被 `operations/outcar.rs`, `batch/` 使用
//! - 使用 `models/run.rs`

use crate::models::{
    ConvergenceProfilePoint, ConvergenceVerdict, IonicSeriesPoint, RunObservables, RunSummary,
};

pub const ENERGY_UNKNOWN_WARNING: &str =
    "Energy convergence could not be evaluated (insufficient TOTEN history)";
pub const FORCE_UNKNOWN_WARNING: &str =
    "Force convergence could not be evaluated (missing force table)";

/// 按能量与受力阈值判定收敛
///
/// 能量收敛需要至少两个能量样本；受力收敛需要至少一张力表。
/// 任一项无法判定时 `is_converged` 为 false，但对应字段保持 None 而非 false。
pub fn evaluate_convergence(
    summary: &RunSummary,
    energy_tolerance_ev: f64,
    force_tolerance_ev_per_a: f64,
) -> ConvergenceVerdict {
    let final_energy_change_ev = summary.final_energy_change_ev();
    let is_energy_converged = final_energy_change_ev.map(|d| d.abs() <= energy_tolerance_ev);
    let is_force_converged = summary
        .max_force_ev_per_a
        .map(|f| f <= force_tolerance_ev_per_a);

    ConvergenceVerdict {
        energy_tolerance_ev,
        force_tolerance_ev_per_a,
        final_energy_change_ev,
        is_energy_converged,
        is_force_converged,
        is_converged: is_energy_converged == Some(true) && is_force_converged == Some(true),
    }
}

/// 无法判定的收敛项对应的警告
pub fn verdict_warnings(verdict: &ConvergenceVerdict) -> Vec<String> {
    let mut warnings = Vec::new();
    if verdict.is_energy_converged.is_none() {
        warnings.push(ENERGY_UNKNOWN_WARNING.to_string());
    }
    if verdict.is_force_converged.is_none() {
        warnings.push(FORCE_UNKNOWN_WARNING.to_string());
    }
    warnings
}

/// 去重并保持首次出现的顺序
pub fn dedup_warnings<I>(warnings: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    warnings
        .into_iter()
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// 收敛曲线: 逐步能量、相对上一步变化、相对第一步能量
pub fn build_convergence_profile(summary: &RunSummary) -> Vec<ConvergenceProfilePoint> {
    let Some(first) = summary.energy_history.first() else {
        return Vec::new();
    };
    let reference = first.total_energy_ev;

    let mut previous: Option<f64> = None;
    summary
        .energy_history
        .iter()
        .map(|point| {
            let energy = point.total_energy_ev;
            let delta_energy_ev = previous.map(|p| energy - p);
            // 第一步没有参照，delta 与 relative 同为 None
            let relative_energy_ev = previous.map(|_| energy - reference);
            previous = Some(energy);
            ConvergenceProfilePoint {
                ionic_step: point.ionic_step,
                total_energy_ev: energy,
                delta_energy_ev,
                relative_energy_ev,
            }
        })
        .collect()
}

/// 离子步序列: 收敛曲线 + 逐步受力、压力、费米能级
///
/// 某步缺失的量保持 None，不沿用上一步的值。
pub fn build_ionic_series(observables: &RunObservables) -> Vec<IonicSeriesPoint> {
    build_convergence_profile(&observables.summary)
        .into_iter()
        .zip(&observables.steps)
        .map(|(point, step)| IonicSeriesPoint {
            ionic_step: point.ionic_step,
            total_energy_ev: point.total_energy_ev,
            delta_energy_ev: point.delta_energy_ev,
            relative_energy_ev: point.relative_energy_ev,
            max_force_ev_per_a: step.max_force_ev_per_a,
            external_pressure_kb: step.external_pressure_kb,
            fermi_energy_ev: step.fermi_energy_ev,
        })
        .collect()
}
