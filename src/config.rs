//! # 分析配置
//!
//! 收敛判据、DOS 窗口以及批量执行参数的默认值。
//! CLI 参数与 JSON 请求映射都以这里的默认值为准。
//!
//! ## 依赖关系
//! - 被 `validation/requests.rs`, `batch/` 和 CLI 使用

use serde::{Deserialize, Serialize};

/// 默认能量收敛阈值 (eV)
pub const DEFAULT_ENERGY_TOLERANCE_EV: f64 = 1e-4;
/// 默认受力收敛阈值 (eV/Å)
pub const DEFAULT_FORCE_TOLERANCE_EV_PER_A: f64 = 0.02;
/// 默认 DOS 能量窗口（费米能级两侧, eV）
pub const DEFAULT_DOS_WINDOW_EV: f64 = 5.0;
/// 默认 DOS 曲线最大点数
pub const DEFAULT_DOS_MAX_POINTS: usize = 400;
/// 批量统计默认排名长度
pub const DEFAULT_TOP_N: usize = 5;
/// 运行发现默认上限
pub const DEFAULT_MAX_RUNS: usize = 200;

/// 分析参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub energy_tolerance_ev: f64,
    pub force_tolerance_ev_per_a: f64,
    pub dos_window_ev: f64,
    pub dos_max_points: usize,
    /// 并行作业数（0 = 自动）
    pub jobs: usize,
    pub fail_fast: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            energy_tolerance_ev: DEFAULT_ENERGY_TOLERANCE_EV,
            force_tolerance_ev_per_a: DEFAULT_FORCE_TOLERANCE_EV_PER_A,
            dos_window_ev: DEFAULT_DOS_WINDOW_EV,
            dos_max_points: DEFAULT_DOS_MAX_POINTS,
            jobs: 0,
            fail_fast: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.energy_tolerance_ev, 1e-4);
        assert_eq!(config.force_tolerance_ev_per_a, 0.02);
        assert_eq!(config.dos_window_ev, 5.0);
        assert_eq!(config.dos_max_points, 400);
        assert!(!config.fail_fast);
        assert_eq!(config.jobs, 0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"jobs": 3}"#).unwrap();
        assert_eq!(config.jobs, 3);
        assert_eq!(config.dos_max_points, 400);
    }
}
