//! # 批量统计
//!
//! 对一组成功解析的运行做收敛计数、能量统计和最低能量排名。
//!
//! ## 依赖关系
//! - 被 `batch/mod.rs` 使用

use serde::{Deserialize, Serialize};

/// 参与统计的单个运行
#[derive(Debug, Clone, PartialEq)]
pub struct InsightSample {
    pub source: String,
    pub system_name: Option<String>,
    pub final_total_energy_ev: f64,
    pub max_force_ev_per_a: Option<f64>,
    /// None 表示收敛性无法判定
    pub is_converged: Option<bool>,
}

/// 按最终能量排名的运行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRun {
    pub rank: usize,
    pub source: String,
    pub system_name: Option<String>,
    pub final_total_energy_ev: f64,
    pub max_force_ev_per_a: Option<f64>,
    pub is_converged: Option<bool>,
}

/// 统计结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightStatistics {
    pub converged_count: usize,
    pub not_converged_count: usize,
    pub unknown_convergence_count: usize,
    pub energy_min_ev: Option<f64>,
    pub energy_max_ev: Option<f64>,
    pub energy_mean_ev: Option<f64>,
    pub energy_span_ev: Option<f64>,
    pub mean_max_force_ev_per_a: Option<f64>,
    pub top_lowest_energy: Vec<RankedRun>,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// 计算统计量；`top_n` 为最低能量排名的长度上限
pub fn summarize_samples(samples: &[InsightSample], top_n: usize) -> InsightStatistics {
    let mut converged_count = 0;
    let mut not_converged_count = 0;
    let mut unknown_convergence_count = 0;
    for sample in samples {
        match sample.is_converged {
            Some(true) => converged_count += 1,
            Some(false) => not_converged_count += 1,
            None => unknown_convergence_count += 1,
        }
    }

    let energies: Vec<f64> = samples.iter().map(|s| s.final_total_energy_ev).collect();
    let forces: Vec<f64> = samples.iter().filter_map(|s| s.max_force_ev_per_a).collect();

    let energy_min_ev = energies.iter().copied().reduce(f64::min);
    let energy_max_ev = energies.iter().copied().reduce(f64::max);
    let energy_span_ev = energy_min_ev.zip(energy_max_ev).map(|(lo, hi)| hi - lo);

    // 稳定排序，能量相同时保持输入顺序
    let mut ranked: Vec<&InsightSample> = samples.iter().collect();
    ranked.sort_by(|a, b| a.final_total_energy_ev.total_cmp(&b.final_total_energy_ev));

    let top_lowest_energy = ranked
        .into_iter()
        .take(top_n)
        .enumerate()
        .map(|(i, s)| RankedRun {
            rank: i + 1,
            source: s.source.clone(),
            system_name: s.system_name.clone(),
            final_total_energy_ev: s.final_total_energy_ev,
            max_force_ev_per_a: s.max_force_ev_per_a,
            is_converged: s.is_converged,
        })
        .collect();

    InsightStatistics {
        converged_count,
        not_converged_count,
        unknown_convergence_count,
        energy_min_ev,
        energy_max_ev,
        energy_mean_ev: mean(&energies),
        energy_span_ev,
        mean_max_force_ev_per_a: mean(&forces),
        top_lowest_energy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(source: &str, energy: f64, force: Option<f64>, converged: Option<bool>) -> InsightSample {
        InsightSample {
            source: source.to_string(),
            system_name: None,
            final_total_energy_ev: energy,
            max_force_ev_per_a: force,
            is_converged: converged,
        }
    }

    #[test]
    fn test_statistics() {
        let samples = vec![
            sample("a", -10.0, Some(0.01), Some(true)),
            sample("b", -12.0, Some(0.03), Some(false)),
            sample("c", -11.0, None, None),
        ];
        let stats = summarize_samples(&samples, 2);

        assert_eq!(stats.converged_count, 1);
        assert_eq!(stats.not_converged_count, 1);
        assert_eq!(stats.unknown_convergence_count, 1);
        assert_eq!(stats.energy_min_ev, Some(-12.0));
        assert_eq!(stats.energy_max_ev, Some(-10.0));
        assert!((stats.energy_mean_ev.unwrap() - (-11.0)).abs() < 1e-12);
        assert!((stats.energy_span_ev.unwrap() - 2.0).abs() < 1e-12);
        assert!((stats.mean_max_force_ev_per_a.unwrap() - 0.02).abs() < 1e-12);

        assert_eq!(stats.top_lowest_energy.len(), 2);
        assert_eq!(stats.top_lowest_energy[0].source, "b");
        assert_eq!(stats.top_lowest_energy[0].rank, 1);
        assert_eq!(stats.top_lowest_energy[1].source, "c");
    }

    #[test]
    fn test_empty_samples() {
        let stats = summarize_samples(&[], 5);
        assert_eq!(stats.energy_min_ev, None);
        assert_eq!(stats.energy_mean_ev, None);
        assert_eq!(stats.mean_max_force_ev_per_a, None);
        assert!(stats.top_lowest_energy.is_empty());
    }
}
