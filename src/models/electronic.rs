//! # 电子结构数据模型
//!
//! 存储由 EIGENVAL 得到的带隙信息和由 DOSCAR 得到的态密度信息。
//!
//! ## 依赖关系
//! - 被 `parsers/eigenval.rs`, `parsers/doscar.rs` 构造
//! - 被 `operations/electronic.rs` 使用

use serde::{Deserialize, Serialize};

/// 单个自旋通道的带隙
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandGapChannel {
    /// "total"（非自旋极化）或 "up"/"down"
    pub spin: String,
    pub is_metal: bool,
    /// 金属时为 None
    pub gap_ev: Option<f64>,
    pub vbm_ev: Option<f64>,
    pub cbm_ev: Option<f64>,
    /// 取得 VBM 的 k 点序号（从 1 开始）
    pub kpoint_index_vbm: Option<usize>,
    /// 取得 CBM 的 k 点序号（从 1 开始）
    pub kpoint_index_cbm: Option<usize>,
    /// 仅在非金属时有意义
    pub is_direct: Option<bool>,
}

/// 带隙分类结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandGapResult {
    pub is_metal: bool,
    /// 金属时为 None；否则 >= 0
    pub fundamental_gap_ev: Option<f64>,
    pub vbm_ev: Option<f64>,
    pub cbm_ev: Option<f64>,
    pub is_direct: Option<bool>,
    pub is_spin_polarized: bool,
    pub electron_count: f64,
    pub kpoint_count: usize,
    pub band_count: usize,
    pub channels: Vec<BandGapChannel>,
}

/// DOSCAR 头部元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosMetadata {
    pub energy_min_ev: f64,
    pub energy_max_ev: f64,
    pub nedos: usize,
    pub efermi_ev: f64,
    pub is_spin_polarized: bool,
    pub has_integrated_dos: bool,
    /// 第一行标志位：是否写出了投影态密度
    pub has_partial_dos: bool,
    pub energy_step_ev: Option<f64>,
    /// 离费米能级最近的采样点处的总态密度
    pub total_dos_at_fermi: f64,
}

/// 态密度曲线上的一个点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DosProfilePoint {
    /// 在输出序列中的序号（从 1 开始）
    pub index: usize,
    pub energy_ev: f64,
    pub energy_relative_ev: f64,
    /// 自旋极化时为上下自旋之和
    pub dos_total: f64,
}

/// 费米能级附近的态密度曲线
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DosProfile {
    pub efermi_ev: f64,
    pub energy_window_ev: f64,
    pub max_points: usize,
    pub points: Vec<DosProfilePoint>,
    pub warnings: Vec<String>,
}

/// 带隙 + 态密度元数据组合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectronicMetadata {
    pub band_gap: Option<BandGapResult>,
    pub dos_metadata: Option<DosMetadata>,
    pub warnings: Vec<String>,
}
