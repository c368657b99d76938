//! # 解析器模块
//!
//! 提供 VASP 输出文件的解析器。所有解析器只接受文本内容，不接触文件系统。
//!
//! ## 依赖关系
//! - 被 `operations/` 和 `batch/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: outcar, eigenval, doscar

pub mod doscar;
pub mod eigenval;
pub mod outcar;

use crate::error::{Result, VaspError};

pub use doscar::{parse_doscar, DoscarTable};
pub use eigenval::parse_eigenval;
pub use outcar::OutcarParser;

/// 严格解析有限浮点数
///
/// 无法解析或非有限（NaN/inf，以及 VASP 溢出时输出的 `****`）都视为解析错误。
pub(crate) fn parse_finite(
    token: &str,
    format: &'static str,
    line: usize,
    what: &str,
) -> Result<f64> {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(VaspError::parse(
            format,
            line,
            format!("non-finite {} value '{}'", what, token),
        )),
        Err(_) => Err(VaspError::parse(
            format,
            line,
            format!("invalid {} value '{}'", what, token),
        )),
    }
}

/// 严格解析计数（允许 `8.0` 这类写法，但必须是非负整数）
pub(crate) fn parse_count(
    token: &str,
    format: &'static str,
    line: usize,
    what: &str,
) -> Result<usize> {
    if let Ok(n) = token.parse::<usize>() {
        return Ok(n);
    }
    let value = parse_finite(token, format, line, what)?;
    if value < 0.0 || value.fract() != 0.0 {
        return Err(VaspError::parse(
            format,
            line,
            format!("{} must be a non-negative integer, got '{}'", what, token),
        ));
    }
    Ok(value as usize)
}

/// 判断一行是否为表格分隔线 (`-----`)
pub(crate) fn is_rule(line: &str) -> bool {
    line.contains("----")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_finite_accepts_exponent() {
        let v = parse_finite("-1.25E-02", "OUTCAR", 1, "energy").unwrap();
        assert!((v - (-0.0125)).abs() < 1e-15);
    }

    #[test]
    fn test_parse_finite_rejects_overflow_stars() {
        let err = parse_finite("********", "OUTCAR", 7, "energy").unwrap_err();
        assert_eq!(err.code(), ErrorCode::ParseError);
    }

    #[test]
    fn test_parse_finite_rejects_nan() {
        assert!(parse_finite("NaN", "OUTCAR", 1, "energy").is_err());
        assert!(parse_finite("inf", "OUTCAR", 1, "energy").is_err());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("8", "EIGENVAL", 6, "nkpts").unwrap(), 8);
        assert_eq!(parse_count("8.0", "EIGENVAL", 6, "nkpts").unwrap(), 8);
        assert!(parse_count("8.5", "EIGENVAL", 6, "nkpts").is_err());
        assert!(parse_count("-2", "EIGENVAL", 6, "nkpts").is_err());
    }
}
