//! # VASP EIGENVAL 解析器
//!
//! 读取各 k 点的本征值与占据数，按自旋通道求 VBM/CBM 并判定金属性与带隙类型。
//!
//! ## 文件格式
//! ```text
//! 第 1 行:  NIONS NIONS NBLOCK ISPIN
//! 第 6 行:  NELECT NKPTS NBANDS
//! 每个 k 点: 空行, "kx ky kz weight", 然后 NBANDS 行
//!   非自旋: idx energy occ
//!   自旋:   idx e_up e_down occ_up occ_down
//! ```
//!
//! ## 依赖关系
//! - 被 `operations/electronic.rs` 使用
//! - 使用 `models/electronic.rs`

use super::{parse_count, parse_finite};
use crate::error::{Result, VaspError};
use crate::models::{BandGapChannel, BandGapResult};

use log::debug;

const FORMAT: &str = "EIGENVAL";

/// 占据数高于此值视为占据态
pub const OCCUPATION_THRESHOLD: f64 = 1e-3;

/// 单个通道在单个 k 点上的一条能带
#[derive(Debug, Clone, Copy)]
struct BandLevel {
    energy: f64,
    occupation: f64,
}

/// 解析 EIGENVAL 文本并给出带隙分类
pub fn parse_eigenval(text: &str) -> Result<BandGapResult> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 6 {
        return Err(VaspError::parse(
            FORMAT,
            lines.len(),
            "file is too short to contain a header",
        ));
    }

    let declared_ispin = declared_spin_channels(lines[0])?;

    let counts: Vec<&str> = lines[5].split_whitespace().collect();
    if counts.len() < 3 {
        return Err(VaspError::parse(
            FORMAT,
            6,
            "expected 'NELECT NKPTS NBANDS' on line 6",
        ));
    }
    let electron_count = parse_finite(counts[0], FORMAT, 6, "electron count")?;
    let kpoint_count = parse_count(counts[1], FORMAT, 6, "k-point count")?;
    let band_count = parse_count(counts[2], FORMAT, 6, "band count")?;
    if kpoint_count == 0 || band_count == 0 {
        return Err(VaspError::parse(
            FORMAT,
            6,
            "k-point and band counts must be positive",
        ));
    }

    let mut spin_channels = declared_ispin;
    // levels[channel][kpoint][band]
    let mut levels: Vec<Vec<Vec<BandLevel>>> = Vec::new();
    let mut cursor = 6;

    for k in 0..kpoint_count {
        while cursor < lines.len() && lines[cursor].trim().is_empty() {
            cursor += 1;
        }
        if cursor >= lines.len() {
            return Err(VaspError::parse(
                FORMAT,
                lines.len(),
                format!("expected {} k-points, found {}", kpoint_count, k),
            ));
        }

        check_kpoint_header(lines[cursor], cursor + 1)?;
        cursor += 1;

        // block[channel][band]，读完整个 k 点后再并入 levels
        let mut block: Vec<Vec<BandLevel>> = Vec::new();
        for band in 0..band_count {
            let Some(line) = lines.get(cursor) else {
                return Err(VaspError::parse(
                    FORMAT,
                    lines.len(),
                    format!(
                        "k-point {} lists {} of {} bands",
                        k + 1,
                        band,
                        band_count
                    ),
                ));
            };
            let line_no = cursor + 1;
            let parts: Vec<&str> = line.split_whitespace().collect();

            let width_channels = match parts.len() {
                3 => 1,
                5 => 2,
                n => {
                    return Err(VaspError::parse(
                        FORMAT,
                        line_no,
                        format!("band row has {} columns, expected 3 or 5", n),
                    ))
                }
            };
            let channels = *spin_channels.get_or_insert(width_channels);
            if channels != width_channels {
                return Err(VaspError::parse(
                    FORMAT,
                    line_no,
                    format!(
                        "band row has {} columns but ISPIN = {}",
                        parts.len(),
                        channels
                    ),
                ));
            }
            if block.is_empty() {
                block = vec![Vec::new(); channels];
            }

            for (c, bands) in block.iter_mut().enumerate() {
                let energy = parse_finite(parts[1 + c], FORMAT, line_no, "band energy")?;
                let occupation =
                    parse_finite(parts[1 + channels + c], FORMAT, line_no, "occupation")?;
                bands.push(BandLevel { energy, occupation });
            }
            cursor += 1;
        }

        if levels.is_empty() {
            levels = vec![Vec::new(); block.len()];
        }
        for (channel, bands) in levels.iter_mut().zip(block) {
            channel.push(bands);
        }
    }

    let is_spin_polarized = levels.len() == 2;
    let channels: Vec<BandGapChannel> = levels
        .iter()
        .enumerate()
        .map(|(c, kpoints)| {
            let label = match (is_spin_polarized, c) {
                (false, _) => "total",
                (true, 0) => "up",
                (true, _) => "down",
            };
            classify_channel(label, kpoints)
        })
        .collect();

    let result = reduce_channels(
        channels,
        is_spin_polarized,
        electron_count,
        kpoint_count,
        band_count,
    );
    debug!(
        "EIGENVAL: {} k-points, {} bands, metal = {}",
        kpoint_count, band_count, result.is_metal
    );
    Ok(result)
}

/// 第 1 行第 4 列为 ISPIN；缺失时由数据行宽度推断
fn declared_spin_channels(line: &str) -> Result<Option<usize>> {
    let Some(token) = line.split_whitespace().nth(3) else {
        return Ok(None);
    };
    match parse_count(token, FORMAT, 1, "ISPIN")? {
        1 => Ok(Some(1)),
        2 => Ok(Some(2)),
        n => Err(VaspError::parse(
            FORMAT,
            1,
            format!("ISPIN must be 1 or 2, got {}", n),
        )),
    }
}

fn check_kpoint_header(line: &str, line_no: usize) -> Result<()> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(VaspError::parse(
            FORMAT,
            line_no,
            "expected k-point header 'kx ky kz weight'",
        ));
    }
    for token in &parts[..4] {
        parse_finite(token, FORMAT, line_no, "k-point coordinate")?;
    }
    Ok(())
}

/// 单通道: 逐 k 点求 VBM/CBM，再在 k 点间归约
fn classify_channel(label: &str, kpoints: &[Vec<BandLevel>]) -> BandGapChannel {
    let mut vbm: Option<(f64, usize)> = None;
    let mut cbm: Option<(f64, usize)> = None;
    let mut crossing = false;

    for (k, bands) in kpoints.iter().enumerate() {
        let vbm_k = bands
            .iter()
            .filter(|b| b.occupation > OCCUPATION_THRESHOLD)
            .map(|b| b.energy)
            .fold(None, |acc: Option<f64>, e| Some(acc.map_or(e, |a| a.max(e))));
        let cbm_k = bands
            .iter()
            .filter(|b| b.occupation <= OCCUPATION_THRESHOLD)
            .map(|b| b.energy)
            .fold(None, |acc: Option<f64>, e| Some(acc.map_or(e, |a| a.min(e))));

        if let (Some(v), Some(c)) = (vbm_k, cbm_k) {
            if v >= c {
                crossing = true;
            }
        }
        if let Some(v) = vbm_k {
            if vbm.map_or(true, |(best, _)| v > best) {
                vbm = Some((v, k + 1));
            }
        }
        if let Some(c) = cbm_k {
            if cbm.map_or(true, |(best, _)| c < best) {
                cbm = Some((c, k + 1));
            }
        }
    }

    let gapped = match (vbm, cbm) {
        (Some((v, _)), Some((c, _))) => !crossing && c > v,
        _ => false,
    };

    BandGapChannel {
        spin: label.to_string(),
        is_metal: !gapped,
        gap_ev: if gapped {
            vbm.zip(cbm).map(|((v, _), (c, _))| c - v)
        } else {
            None
        },
        vbm_ev: vbm.map(|(v, _)| v),
        cbm_ev: cbm.map(|(c, _)| c),
        kpoint_index_vbm: vbm.map(|(_, k)| k),
        kpoint_index_cbm: cbm.map(|(_, k)| k),
        is_direct: if gapped {
            vbm.zip(cbm).map(|((_, kv), (_, kc))| kv == kc)
        } else {
            None
        },
    }
}

/// 多通道归约: 任一通道为金属即金属；否则取全局 VBM/CBM
fn reduce_channels(
    channels: Vec<BandGapChannel>,
    is_spin_polarized: bool,
    electron_count: f64,
    kpoint_count: usize,
    band_count: usize,
) -> BandGapResult {
    let mut vbm: Option<(f64, usize)> = None;
    let mut cbm: Option<(f64, usize)> = None;
    for channel in &channels {
        if let (Some(v), Some(k)) = (channel.vbm_ev, channel.kpoint_index_vbm) {
            if vbm.map_or(true, |(best, _)| v > best) {
                vbm = Some((v, k));
            }
        }
        if let (Some(c), Some(k)) = (channel.cbm_ev, channel.kpoint_index_cbm) {
            if cbm.map_or(true, |(best, _)| c < best) {
                cbm = Some((c, k));
            }
        }
    }

    let any_metal = channels.iter().any(|c| c.is_metal);
    let gap = match (vbm, cbm) {
        (Some((v, kv)), Some((c, kc))) if !any_metal && c > v => Some((c - v, kv == kc)),
        _ => None,
    };

    BandGapResult {
        is_metal: gap.is_none(),
        fundamental_gap_ev: gap.map(|(g, _)| g),
        vbm_ev: vbm.map(|(v, _)| v),
        cbm_ev: cbm.map(|(c, _)| c),
        is_direct: gap.map(|(_, direct)| direct),
        is_spin_polarized,
        electron_count,
        kpoint_count,
        band_count,
        channels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const SAMPLE: &str = include_str!("../../tests/fixtures/EIGENVAL.sample");
    const SPIN_SAMPLE: &str = include_str!("../../tests/fixtures/EIGENVAL.spin.sample");

    fn header(ispin: usize, nkpts: usize, nbands: usize) -> String {
        format!(
            "    2    2    1    {}\n  0.1E+02 0.1 0.1 0.1 0.5E-15\n  1.0E-004\n  CAR\n test\n      8      {}      {}\n",
            ispin, nkpts, nbands
        )
    }

    #[test]
    fn test_parse_eigenval_direct_gap() {
        let result = parse_eigenval(SAMPLE).unwrap();

        assert!(!result.is_metal);
        assert!(!result.is_spin_polarized);
        assert!((result.fundamental_gap_ev.unwrap() - 1.3).abs() < 1e-9);
        assert!((result.vbm_ev.unwrap() - (-0.5)).abs() < 1e-9);
        assert!((result.cbm_ev.unwrap() - 0.8).abs() < 1e-9);
        assert_eq!(result.is_direct, Some(true));
        assert_eq!(result.kpoint_count, 2);
        assert_eq!(result.band_count, 4);
        assert_eq!(result.electron_count, 8.0);
        assert_eq!(result.channels.len(), 1);
        assert_eq!(result.channels[0].spin, "total");
        assert_eq!(result.channels[0].kpoint_index_vbm, Some(2));
    }

    #[test]
    fn test_parse_eigenval_spin_polarized() {
        let result = parse_eigenval(SPIN_SAMPLE).unwrap();

        assert!(result.is_spin_polarized);
        assert!(!result.is_metal);
        assert!((result.fundamental_gap_ev.unwrap() - 0.9).abs() < 1e-9);
        assert_eq!(result.is_direct, Some(true));

        let down = &result.channels[1];
        assert_eq!(down.spin, "down");
        assert!((down.gap_ev.unwrap() - 1.1).abs() < 1e-9);
        assert_eq!(down.kpoint_index_vbm, Some(1));
        assert_eq!(down.kpoint_index_cbm, Some(1));
    }

    #[test]
    fn test_indirect_gap() {
        let text = header(1, 2, 2)
            + "\n 0.0 0.0 0.0 0.5\n 1 -0.2 1.0\n 2 1.5 0.0\n"
            + "\n 0.5 0.0 0.0 0.5\n 1 -0.6 1.0\n 2 1.0 0.0\n";
        let result = parse_eigenval(&text).unwrap();

        assert!((result.fundamental_gap_ev.unwrap() - 1.2).abs() < 1e-9);
        assert_eq!(result.is_direct, Some(false));
    }

    #[test]
    fn test_all_occupied_is_metal() {
        let text = header(1, 1, 2) + "\n 0.0 0.0 0.0 1.0\n 1 -1.0 1.0\n 2 0.5 0.6\n";
        let result = parse_eigenval(&text).unwrap();

        assert!(result.is_metal);
        assert_eq!(result.fundamental_gap_ev, None);
        assert_eq!(result.is_direct, None);
    }

    #[test]
    fn test_band_crossing_is_metal() {
        // 占据态能量高于非占据态
        let text = header(1, 1, 2) + "\n 0.0 0.0 0.0 1.0\n 1 0.4 0.0\n 2 0.5 1.0\n";
        let result = parse_eigenval(&text).unwrap();
        assert!(result.is_metal);
    }

    #[test]
    fn test_truncated_band_block_is_parse_error() {
        let text = header(1, 2, 2) + "\n 0.0 0.0 0.0 1.0\n 1 -1.0 1.0\n 2 0.5 0.0\n";
        let err = parse_eigenval(&text).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ParseError);
    }

    #[test]
    fn test_row_width_must_match_ispin() {
        let text = header(2, 1, 1) + "\n 0.0 0.0 0.0 1.0\n 1 -1.0 1.0\n";
        let err = parse_eigenval(&text).unwrap_err();
        assert!(err.to_string().contains("ISPIN = 2"));
    }

    #[test]
    fn test_oversized_header_counts_are_parse_errors() {
        let block = "\n 0.0 0.0 0.0 1.0\n 1 -1.0 1.0\n 2 0.5 0.0\n";

        let text = header(1, 1_000_000_000_000_000_000, 2) + block;
        let err = parse_eigenval(&text).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ParseError);
        assert!(err.to_string().contains("found 1"));

        let text = header(1, 1, 1_000_000_000_000_000_000) + block;
        let err = parse_eigenval(&text).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ParseError);
    }

    #[test]
    fn test_short_file_is_parse_error() {
        let err = parse_eigenval("1 1 1 1\n").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ParseError);
    }
}
