//! # VASP DOSCAR 解析器
//!
//! 只读取总态密度部分（头部 6 行 + NEDOS 行数据）。投影态密度块被忽略，
//! 但第 1 行的标志位会记录是否存在。
//!
//! 数据行布局由列数判定:
//! - 2 列: E, DOS
//! - 3 列: E, DOS, IDOS
//! - 5 列: E, DOS_up, DOS_down, IDOS_up, IDOS_down
//!
//! ## 依赖关系
//! - 被 `operations/electronic.rs` 使用
//! - 使用 `models/electronic.rs`

use super::{parse_count, parse_finite};
use crate::error::{Result, VaspError};
use crate::models::{DosMetadata, DosProfile, DosProfilePoint};

use log::debug;

const FORMAT: &str = "DOSCAR";

/// 总态密度的一个采样点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DosRow {
    pub energy_ev: f64,
    /// 自旋极化时为上下自旋之和
    pub dos_total: f64,
}

/// 解析后的 DOSCAR 总态密度表
#[derive(Debug, Clone, PartialEq)]
pub struct DoscarTable {
    pub energy_max_ev: f64,
    pub energy_min_ev: f64,
    pub nedos: usize,
    pub efermi_ev: f64,
    pub is_spin_polarized: bool,
    pub has_integrated_dos: bool,
    pub has_partial_dos: bool,
    pub rows: Vec<DosRow>,
}

/// 解析 DOSCAR 文本
pub fn parse_doscar(text: &str) -> Result<DoscarTable> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 6 {
        return Err(VaspError::parse(
            FORMAT,
            lines.len(),
            "file is too short to contain a header",
        ));
    }

    // 第 1 行: NIONS NIONS LORBIT-flag NCDIJ
    let has_partial_dos = match lines[0].split_whitespace().nth(2) {
        Some(token) => parse_count(token, FORMAT, 1, "partial DOS flag")? != 0,
        None => false,
    };

    // 第 6 行: EMAX EMIN NEDOS EFERMI WEIGHT
    let header: Vec<&str> = lines[5].split_whitespace().collect();
    if header.len() < 4 {
        return Err(VaspError::parse(
            FORMAT,
            6,
            "expected 'EMAX EMIN NEDOS EFERMI' on line 6",
        ));
    }
    let energy_max_ev = parse_finite(header[0], FORMAT, 6, "EMAX")?;
    let energy_min_ev = parse_finite(header[1], FORMAT, 6, "EMIN")?;
    let nedos = parse_count(header[2], FORMAT, 6, "NEDOS")?;
    let efermi_ev = parse_finite(header[3], FORMAT, 6, "EFERMI")?;
    if nedos == 0 {
        return Err(VaspError::parse(FORMAT, 6, "NEDOS must be positive"));
    }

    // NEDOS 只是声明值，容量以实际行数为上限
    let mut rows = Vec::with_capacity(nedos.min(lines.len().saturating_sub(6)));
    let mut width: Option<usize> = None;

    for i in 0..nedos {
        let line_no = 7 + i;
        let Some(line) = lines.get(6 + i) else {
            return Err(VaspError::parse(
                FORMAT,
                lines.len(),
                format!("expected {} DOS rows, found {}", nedos, i),
            ));
        };
        let parts: Vec<&str> = line.split_whitespace().collect();

        if !matches!(parts.len(), 2 | 3 | 5) {
            return Err(VaspError::parse(
                FORMAT,
                line_no,
                format!("DOS row has {} columns, expected 2, 3 or 5", parts.len()),
            ));
        }
        if *width.get_or_insert(parts.len()) != parts.len() {
            return Err(VaspError::parse(
                FORMAT,
                line_no,
                "DOS rows have inconsistent column counts",
            ));
        }

        let energy_ev = parse_finite(parts[0], FORMAT, line_no, "energy")?;
        let mut dos_total = parse_finite(parts[1], FORMAT, line_no, "DOS")?;
        if parts.len() == 5 {
            dos_total += parse_finite(parts[2], FORMAT, line_no, "DOS")?;
        }
        rows.push(DosRow {
            energy_ev,
            dos_total,
        });
    }

    let width = width.unwrap_or(2);
    debug!("DOSCAR: {} rows, {} columns", rows.len(), width);

    Ok(DoscarTable {
        energy_max_ev,
        energy_min_ev,
        nedos,
        efermi_ev,
        is_spin_polarized: width == 5,
        has_integrated_dos: width >= 3,
        has_partial_dos,
        rows,
    })
}

impl DoscarTable {
    /// 离费米能级最近的采样点（距离相同时取先出现者）
    pub fn nearest_to_fermi(&self) -> Option<&DosRow> {
        self.rows.iter().min_by(|a, b| {
            let da = (a.energy_ev - self.efermi_ev).abs();
            let db = (b.energy_ev - self.efermi_ev).abs();
            da.total_cmp(&db)
        })
    }

    /// 头部元数据
    pub fn metadata(&self) -> DosMetadata {
        let energy_step_ev = match self.rows.as_slice() {
            [first, second, ..] => Some(second.energy_ev - first.energy_ev),
            _ => None,
        };

        DosMetadata {
            energy_min_ev: self.energy_min_ev,
            energy_max_ev: self.energy_max_ev,
            nedos: self.nedos,
            efermi_ev: self.efermi_ev,
            is_spin_polarized: self.is_spin_polarized,
            has_integrated_dos: self.has_integrated_dos,
            has_partial_dos: self.has_partial_dos,
            energy_step_ev,
            total_dos_at_fermi: self.nearest_to_fermi().map_or(0.0, |r| r.dos_total),
        }
    }

    /// 费米能级附近 `|E - Ef| <= window` 的态密度曲线，最多 `max_points` 个点
    ///
    /// 超出上限时保留离费米能级最近的点，输出仍按能量升序排列。
    pub fn profile(&self, energy_window_ev: f64, max_points: usize) -> DosProfile {
        let mut selected: Vec<(usize, &DosRow)> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| (r.energy_ev - self.efermi_ev).abs() <= energy_window_ev)
            .collect();

        let mut warnings = Vec::new();
        if selected.is_empty() {
            warnings.push(format!(
                "No DOS points within {} eV of the Fermi energy",
                energy_window_ev
            ));
        }

        if selected.len() > max_points {
            let total = selected.len();
            selected.sort_by(|(ia, a), (ib, b)| {
                let da = (a.energy_ev - self.efermi_ev).abs();
                let db = (b.energy_ev - self.efermi_ev).abs();
                da.total_cmp(&db).then(ia.cmp(ib))
            });
            selected.truncate(max_points);
            debug!("DOS profile truncated from {} to {} points", total, max_points);
            warnings.push(format!(
                "DOS profile truncated to the {} of {} points nearest the Fermi energy",
                max_points, total
            ));
        }

        selected.sort_by(|(ia, a), (ib, b)| a.energy_ev.total_cmp(&b.energy_ev).then(ia.cmp(ib)));

        let points = selected
            .into_iter()
            .enumerate()
            .map(|(i, (_, r))| DosProfilePoint {
                index: i + 1,
                energy_ev: r.energy_ev,
                energy_relative_ev: r.energy_ev - self.efermi_ev,
                dos_total: r.dos_total,
            })
            .collect();

        DosProfile {
            efermi_ev: self.efermi_ev,
            energy_window_ev,
            max_points,
            points,
            warnings,
        }
    }
}
