//! # 校验模块
//!
//! 在解析开始前检查调用方输入。这里的失败一律是 `VALIDATION_ERROR`
//! 或文件类错误码，不会进入解析器。
//!
//! ## 依赖关系
//! - 被 `operations/`, `batch/` 和 CLI 使用
//! - 子模块: paths, requests

pub mod paths;
pub mod requests;

use crate::error::{Result, VaspError};

pub use paths::{read_text_lossy, validate_directory_path, validate_file_path, validate_outcar_path};
pub use requests::{
    BatchRequest, DiagnosticsRequest, DiscoverRequest, DosProfileRequest, ElectronicRequest,
    ExportRequest, SummaryRequest,
};

/// 正的有限浮点数
pub fn positive_finite(value: f64, field: &str) -> Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(VaspError::invalid_field(
            field,
            format!("{} must be a positive finite number, got {}", field, value),
        ));
    }
    Ok(value)
}

/// 正整数
pub fn positive_count(value: usize, field: &str) -> Result<usize> {
    if value == 0 {
        return Err(VaspError::invalid_field(
            field,
            format!("{} must be > 0", field),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_positive_finite() {
        assert_eq!(positive_finite(0.02, "force_tolerance_ev_per_a").unwrap(), 0.02);
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = positive_finite(bad, "energy_tolerance_ev").unwrap_err();
            assert_eq!(err.code(), ErrorCode::ValidationError);
        }
    }

    #[test]
    fn test_positive_count() {
        assert_eq!(positive_count(400, "max_points").unwrap(), 400);
        assert!(positive_count(0, "max_points").is_err());
    }
}
