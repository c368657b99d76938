//! # 路径校验
//!
//! 适配层在读取文件前调用。错误码与详情:
//! - 空路径 → `VALIDATION_ERROR` {field}
//! - 不存在 → `FILE_NOT_FOUND` {field, path}
//! - 不是普通文件 → `FILE_NOT_FILE` {field, path}
//!
//! ## 依赖关系
//! - 被 `validation/requests.rs`, `batch/source.rs`, `batch/collector.rs` 使用

use crate::error::{Result, VaspError};

use std::fs;
use std::path::{Path, PathBuf};

/// 展开开头的 `~/`
fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(rest),
            None => PathBuf::from(path),
        },
        None => PathBuf::from(path),
    }
}

fn non_empty<'a>(path: &'a str, field: &str) -> Result<&'a str> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(VaspError::invalid_field(
            field,
            format!("{} must be a non-empty string", field),
        ));
    }
    Ok(trimmed)
}

/// 校验文件路径并返回规范化后的绝对路径
pub fn validate_file_path(path: &str, field: &str, label: &str) -> Result<PathBuf> {
    let candidate = expand_home(non_empty(path, field)?);

    if !candidate.exists() {
        return Err(VaspError::FileNotFound {
            label: label.to_string(),
            field: field.to_string(),
            path: candidate.display().to_string(),
        });
    }
    if !candidate.is_file() {
        return Err(VaspError::NotAFile {
            label: label.to_string(),
            field: field.to_string(),
            path: candidate.display().to_string(),
        });
    }

    fs::canonicalize(&candidate).map_err(|e| VaspError::FileReadError {
        path: candidate.display().to_string(),
        source: e,
    })
}

/// OUTCAR 路径校验的快捷方式
pub fn validate_outcar_path(path: &str) -> Result<PathBuf> {
    validate_file_path(path, "outcar_path", "OUTCAR")
}

/// 校验目录路径并返回规范化后的绝对路径
pub fn validate_directory_path(path: &str, field: &str, label: &str) -> Result<PathBuf> {
    let candidate = expand_home(non_empty(path, field)?);

    if !candidate.exists() {
        return Err(VaspError::DirectoryNotFound {
            label: label.to_string(),
            field: field.to_string(),
            path: candidate.display().to_string(),
        });
    }
    if !candidate.is_dir() {
        return Err(VaspError::NotADirectory {
            label: label.to_string(),
            field: field.to_string(),
            path: candidate.display().to_string(),
        });
    }

    fs::canonicalize(&candidate).map_err(|e| VaspError::FileReadError {
        path: candidate.display().to_string(),
        source: e,
    })
}

/// 读取文本文件，非 UTF-8 字节按替换字符处理
pub fn read_text_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| VaspError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, ErrorCode};

    #[test]
    fn test_empty_path_is_validation_error() {
        let err = AppError::from(validate_outcar_path("   ").unwrap_err());
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.details.unwrap()["field"], "outcar_path");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("OUTCAR");
        let err = AppError::from(validate_outcar_path(missing.to_str().unwrap()).unwrap_err());

        assert_eq!(err.code, ErrorCode::FileNotFound);
        let details = err.details.unwrap();
        assert_eq!(details["field"], "outcar_path");
        assert!(details["path"].as_str().unwrap().ends_with("OUTCAR"));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_outcar_path(dir.path().to_str().unwrap()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::FileNotFile);
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("OUTCAR");
        fs::write(&file, "x").unwrap();

        let err = validate_directory_path(file.to_str().unwrap(), "root_dir", "Root directory")
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let ok = validate_directory_path(dir.path().to_str().unwrap(), "root_dir", "Root directory");
        assert!(ok.unwrap().is_absolute());
    }

    #[test]
    fn test_read_text_lossy_replaces_invalid_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("OUTCAR");
        fs::write(&file, b"SYSTEM = \xff\n").unwrap();

        let text = read_text_lossy(&file).unwrap();
        assert!(text.starts_with("SYSTEM = "));
        assert!(text.contains('\u{FFFD}'));
    }
}
