//! # 电子结构操作
//!
//! 输入 EIGENVAL / DOSCAR 文本，输出带隙、DOS 元数据和 DOS 曲线。
//!
//! ## 依赖关系
//! - 使用 `parsers/eigenval.rs`, `parsers/doscar.rs`
//! - 被 CLI 使用

use super::OpResult;
use crate::error::VaspError;
use crate::models::{DosProfile, ElectronicMetadata};
use crate::parsers::{parse_doscar, parse_eigenval};
use crate::validation::{positive_count, positive_finite};

/// 至少需要一个来源；缺失的来源以警告说明
pub fn parse_electronic_metadata(
    band_text: Option<&str>,
    dos_text: Option<&str>,
) -> OpResult<ElectronicMetadata> {
    if band_text.is_none() && dos_text.is_none() {
        return Err(VaspError::validation(
            "At least one of EIGENVAL or DOSCAR content must be provided",
        )
        .into());
    }

    let mut warnings = Vec::new();

    let band_gap = match band_text {
        Some(text) => Some(parse_eigenval(text)?),
        None => {
            warnings.push("EIGENVAL not provided; band gap metadata unavailable".to_string());
            None
        }
    };

    let dos_metadata = match dos_text {
        Some(text) => Some(parse_doscar(text)?.metadata()),
        None => {
            warnings.push("DOSCAR not provided; DOS metadata unavailable".to_string());
            None
        }
    };

    Ok(ElectronicMetadata {
        band_gap,
        dos_metadata,
        warnings,
    })
}

/// 费米能级附近的 DOS 曲线
pub fn build_dos_profile(
    dos_text: &str,
    energy_window_ev: f64,
    max_points: usize,
) -> OpResult<DosProfile> {
    let energy_window_ev = positive_finite(energy_window_ev, "energy_window_ev")?;
    let max_points = positive_count(max_points, "max_points")?;

    Ok(parse_doscar(dos_text)?.profile(energy_window_ev, max_points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const EIGENVAL: &str = include_str!("../../tests/fixtures/EIGENVAL.sample");
    const DOSCAR: &str = include_str!("../../tests/fixtures/DOSCAR.sample");

    #[test]
    fn test_requires_a_source() {
        let err = parse_electronic_metadata(None, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_band_only() {
        let meta = parse_electronic_metadata(Some(EIGENVAL), None).unwrap();
        assert!(meta.band_gap.is_some());
        assert!(meta.dos_metadata.is_none());
        assert_eq!(meta.warnings.len(), 1);
        assert!(meta.warnings[0].starts_with("DOSCAR"));
    }

    #[test]
    fn test_both_sources() {
        let meta = parse_electronic_metadata(Some(EIGENVAL), Some(DOSCAR)).unwrap();
        assert!(meta.warnings.is_empty());
        assert_eq!(meta.dos_metadata.unwrap().nedos, 5);
    }

    #[test]
    fn test_malformed_header_is_parse_error() {
        let err = parse_electronic_metadata(None, Some("bad\n")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ParseError);
    }

    #[test]
    fn test_dos_profile_validates_arguments() {
        assert_eq!(
            build_dos_profile(DOSCAR, -1.0, 10).unwrap_err().code,
            ErrorCode::ValidationError
        );
        assert_eq!(
            build_dos_profile(DOSCAR, 1.0, 0).unwrap_err().code,
            ErrorCode::ValidationError
        );

        let profile = build_dos_profile(DOSCAR, 5.0, 400).unwrap();
        assert!(profile
            .points
            .iter()
            .all(|p| p.energy_relative_ev.abs() <= 5.0));
    }
}
