//! # 单次计算运行的数据模型
//!
//! 存储从 OUTCAR 提取的能量历史、最终标量以及诊断信息。
//!
//! ## 依赖关系
//! - 被 `parsers/outcar.rs` 构造
//! - 被 `analysis/`、`operations/`、`batch/` 使用

use serde::{Deserialize, Serialize};

/// 单个离子步的能量采样
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyPoint {
    /// 离子步序号（从 1 开始）
    pub ionic_step: usize,
    /// 自由能 TOTEN (eV)
    pub total_energy_ev: f64,
}

/// 单个离子步内观测到的逐步量
///
/// 某个量在该步内未出现时为 `None`，不会沿用上一步的值。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IonicStepRecord {
    pub ionic_step: usize,
    pub total_energy_ev: f64,
    pub max_force_ev_per_a: Option<f64>,
    pub external_pressure_kb: Option<f64>,
    pub fermi_energy_ev: Option<f64>,
}

/// 应力张量 (kB)，只存储 6 个独立分量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressTensor {
    pub xx_kb: f64,
    pub yy_kb: f64,
    pub zz_kb: f64,
    pub xy_kb: f64,
    pub yz_kb: f64,
    pub zx_kb: f64,
}

impl StressTensor {
    /// 按 VASP `in kB` 行的顺序 (xx yy zz xy yz zx) 构造
    pub fn from_voigt(values: [f64; 6]) -> Self {
        let [xx_kb, yy_kb, zz_kb, xy_kb, yz_kb, zx_kb] = values;
        StressTensor {
            xx_kb,
            yy_kb,
            zz_kb,
            xy_kb,
            yz_kb,
            zx_kb,
        }
    }
}

/// 磁矩表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Magnetization {
    /// 磁化方向 (x/y/z)
    pub axis: char,
    /// 总磁矩 (μB)
    pub total_moment_mu_b: f64,
    /// 各原子位点磁矩 (μB)
    pub site_moments_mu_b: Vec<f64>,
}

/// OUTCAR 摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub system_name: Option<String>,
    pub nions: Option<usize>,
    pub ionic_steps: usize,
    pub electronic_iterations: usize,
    pub final_total_energy_ev: f64,
    pub final_fermi_energy_ev: Option<f64>,
    pub max_force_ev_per_a: Option<f64>,
    /// 按出现顺序排列，至少一个元素
    pub energy_history: Vec<EnergyPoint>,
    pub warnings: Vec<String>,
}

impl RunSummary {
    /// 最后两步的能量差（有符号，后减前）
    pub fn final_energy_change_ev(&self) -> Option<f64> {
        match self.energy_history.as_slice() {
            [.., prev, last] => Some(last.total_energy_ev - prev.total_energy_ev),
            _ => None,
        }
    }

    /// 去掉能量历史的副本（用于不需要历史的摘要输出）
    pub fn without_history(&self) -> Self {
        RunSummary {
            energy_history: Vec::new(),
            ..self.clone()
        }
    }
}

/// 摘要 + 诊断可观测量（压力、应力、磁矩、逐步记录）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunObservables {
    pub summary: RunSummary,
    pub external_pressure_kb: Option<f64>,
    pub stress_tensor_kb: Option<StressTensor>,
    pub magnetization: Option<Magnetization>,
    pub steps: Vec<IonicStepRecord>,
    pub warnings: Vec<String>,
}

/// 收敛判定结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceVerdict {
    pub energy_tolerance_ev: f64,
    pub force_tolerance_ev_per_a: f64,
    /// 最后两步能量差（后减前）；少于两步时为 None
    pub final_energy_change_ev: Option<f64>,
    /// None 表示无法判定（能量样本不足两个）
    pub is_energy_converged: Option<bool>,
    /// None 表示无法判定（没有力表）
    pub is_force_converged: Option<bool>,
    pub is_converged: bool,
}

impl ConvergenceVerdict {
    /// 两项都能判定时才给出确定结论
    pub fn is_decided(&self) -> bool {
        self.is_energy_converged.is_some() && self.is_force_converged.is_some()
    }
}

/// 完整诊断结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub summary: RunSummary,
    pub external_pressure_kb: Option<f64>,
    pub stress_tensor_kb: Option<StressTensor>,
    pub magnetization: Option<Magnetization>,
    pub convergence: ConvergenceVerdict,
    pub warnings: Vec<String>,
}

/// 收敛曲线上的一个点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceProfilePoint {
    pub ionic_step: usize,
    pub total_energy_ev: f64,
    /// 相对上一步的变化；第一步为 None
    pub delta_energy_ev: Option<f64>,
    /// 相对第一步的能量；第一步为 None
    pub relative_energy_ev: Option<f64>,
}

/// 离子步序列上的一个点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IonicSeriesPoint {
    pub ionic_step: usize,
    pub total_energy_ev: f64,
    pub delta_energy_ev: Option<f64>,
    pub relative_energy_ev: Option<f64>,
    pub max_force_ev_per_a: Option<f64>,
    pub external_pressure_kb: Option<f64>,
    pub fermi_energy_ev: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary_with(energies: &[f64]) -> RunSummary {
        RunSummary {
            system_name: Some("Si2".to_string()),
            nions: Some(2),
            ionic_steps: energies.len(),
            electronic_iterations: 0,
            final_total_energy_ev: energies.last().copied().unwrap_or_default(),
            final_fermi_energy_ev: None,
            max_force_ev_per_a: None,
            energy_history: energies
                .iter()
                .enumerate()
                .map(|(i, &e)| EnergyPoint {
                    ionic_step: i + 1,
                    total_energy_ev: e,
                })
                .collect(),
            warnings: vec![],
        }
    }

    #[test]
    fn test_final_energy_change_is_signed() {
        let summary = summary_with(&[-10.0, -10.5, -10.75]);
        let change = summary.final_energy_change_ev().unwrap();
        assert!((change - (-0.25)).abs() < 1e-12);
    }

    #[test]
    fn test_final_energy_change_requires_two_samples() {
        assert_eq!(summary_with(&[-3.0]).final_energy_change_ev(), None);
    }

    #[test]
    fn test_without_history_keeps_scalars() {
        let summary = summary_with(&[-1.0, -2.0]);
        let trimmed = summary.without_history();
        assert!(trimmed.energy_history.is_empty());
        assert_eq!(trimmed.ionic_steps, 2);
        assert_eq!(trimmed.final_total_energy_ev, -2.0);
    }

    #[test]
    fn test_stress_tensor_voigt_order() {
        // OUTCAR 的 in kB 行顺序: XX YY ZZ XY YZ ZX
        let tensor = StressTensor::from_voigt([1.0, 2.0, 3.0, 0.1, 0.2, 0.3]);
        assert_eq!(tensor.zz_kb, 3.0);
        assert_eq!(tensor.xy_kb, 0.1);
        assert_eq!(tensor.zx_kb, 0.3);
    }
}
