//! # 统一错误处理模块
//!
//! 定义 vasplens 的错误类型：
//! - `VaspError`: 内部错误，使用 `thiserror` 派生
//! - `ErrorCode`: 对外稳定的错误码（封闭枚举）
//! - `AppError`: 适配层消费的结构化错误（错误码 + 消息 + 可选详情）
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// 稳定的机器可读错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    FileNotFound,
    FileNotFile,
    ParseError,
    IoError,
    UnsupportedOperation,
    InternalError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::FileNotFound => "FILE_NOT_FOUND",
            ErrorCode::FileNotFile => "FILE_NOT_FILE",
            ErrorCode::ParseError => "PARSE_ERROR",
            ErrorCode::IoError => "IO_ERROR",
            ErrorCode::UnsupportedOperation => "UNSUPPORTED_OPERATION",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// vasplens 内部错误类型
#[derive(Error, Debug)]
pub enum VaspError {
    // ─────────────────────────────────────────────────────────────
    // 校验错误
    // ─────────────────────────────────────────────────────────────
    #[error("{message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("{label} file does not exist: {path}")]
    FileNotFound {
        label: String,
        field: String,
        path: String,
    },

    #[error("{label} path is not a file: {path}")]
    NotAFile {
        label: String,
        field: String,
        path: String,
    },

    #[error("{label} does not exist: {path}")]
    DirectoryNotFound {
        label: String,
        field: String,
        path: String,
    },

    #[error("{label} is not a directory: {path}")]
    NotADirectory {
        label: String,
        field: String,
        path: String,
    },

    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} (line {line}): {reason}")]
    ParseError {
        format: &'static str,
        line: usize,
        reason: String,
    },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    // ─────────────────────────────────────────────────────────────
    // 序列化错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

impl VaspError {
    pub fn validation(message: impl Into<String>) -> Self {
        VaspError::Validation {
            message: message.into(),
            field: None,
        }
    }

    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        VaspError::Validation {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    pub fn parse(format: &'static str, line: usize, reason: impl Into<String>) -> Self {
        VaspError::ParseError {
            format,
            line,
            reason: reason.into(),
        }
    }

    /// 对应的稳定错误码
    pub fn code(&self) -> ErrorCode {
        match self {
            VaspError::Validation { .. } | VaspError::NotADirectory { .. } => {
                ErrorCode::ValidationError
            }
            VaspError::FileNotFound { .. } | VaspError::DirectoryNotFound { .. } => {
                ErrorCode::FileNotFound
            }
            VaspError::NotAFile { .. } => ErrorCode::FileNotFile,
            VaspError::FileReadError { .. } | VaspError::FileWriteError { .. } => {
                ErrorCode::IoError
            }
            VaspError::ParseError { .. } => ErrorCode::ParseError,
            VaspError::UnsupportedOperation(_) => ErrorCode::UnsupportedOperation,
            VaspError::CsvError(_) | VaspError::JsonError(_) | VaspError::Other(_) => {
                ErrorCode::InternalError
            }
        }
    }

    /// 结构化详情（无详情时为 None）
    fn details(&self) -> Option<Map<String, Value>> {
        let mut details = Map::new();
        match self {
            VaspError::Validation {
                field: Some(field), ..
            } => {
                details.insert("field".into(), Value::from(field.as_str()));
            }
            VaspError::FileNotFound { field, path, .. }
            | VaspError::NotAFile { field, path, .. }
            | VaspError::DirectoryNotFound { field, path, .. }
            | VaspError::NotADirectory { field, path, .. } => {
                details.insert("field".into(), Value::from(field.as_str()));
                details.insert("path".into(), Value::from(path.as_str()));
            }
            VaspError::FileReadError { path, .. } | VaspError::FileWriteError { path, .. } => {
                details.insert("path".into(), Value::from(path.as_str()));
            }
            VaspError::ParseError { format, line, .. } => {
                details.insert("format".into(), Value::from(*format));
                details.insert("line".into(), Value::from(*line));
            }
            _ => {}
        }
        (!details.is_empty()).then_some(details)
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, VaspError>;

/// 与传输层无关的结构化错误
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("[{code}] {message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    /// 序列化为 `{code, message, details?}` 映射
    pub fn to_mapping(&self) -> Value {
        let mut mapped = Map::new();
        mapped.insert("code".into(), Value::from(self.code.as_str()));
        mapped.insert("message".into(), Value::from(self.message.as_str()));
        if let Some(details) = self.details.as_ref().filter(|d| !d.is_empty()) {
            mapped.insert("details".into(), Value::Object(details.clone()));
        }
        Value::Object(mapped)
    }
}

impl From<VaspError> for AppError {
    fn from(err: VaspError) -> Self {
        AppError {
            code: err.code(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            _ => ErrorCode::IoError,
        };
        AppError::new(code, err.to_string())
    }
}

/// 任意失败 -> 统一的 `AppError`
pub fn normalize_error<E>(err: E) -> AppError
where
    E: Into<AppError>,
{
    err.into()
}

/// 无法归类的失败（如线程池构建失败）统一为 INTERNAL_ERROR
pub fn internal_error(message: impl std::fmt::Display) -> AppError {
    let message = message.to_string();
    if message.is_empty() {
        AppError::new(ErrorCode::InternalError, "Unexpected internal failure")
    } else {
        AppError::new(ErrorCode::InternalError, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_mapping_includes_details() {
        let err = AppError::new(ErrorCode::ValidationError, "invalid payload")
            .with_detail("field", "outcar_path");
        let mapped = err.to_mapping();

        assert_eq!(mapped["code"], "VALIDATION_ERROR");
        assert_eq!(mapped["message"], "invalid payload");
        assert_eq!(mapped["details"]["field"], "outcar_path");
    }

    #[test]
    fn test_app_error_mapping_omits_empty_details() {
        let mapped = AppError::new(ErrorCode::ParseError, "bad").to_mapping();
        assert!(mapped.get("details").is_none());
    }

    #[test]
    fn test_normalize_preserves_parse_code() {
        let normalized = normalize_error(VaspError::parse("OUTCAR", 12, "bad number"));
        assert_eq!(normalized.code, ErrorCode::ParseError);
        assert!(normalized.message.contains("bad number"));
        let details = normalized.details.unwrap();
        assert_eq!(details["line"], 12);
    }

    #[test]
    fn test_normalize_io_error() {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(normalize_error(missing).code, ErrorCode::FileNotFound);

        let denied = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let normalized = normalize_error(denied);
        assert_eq!(normalized.code, ErrorCode::IoError);
        assert_eq!(normalized.message, "denied");
    }

    #[test]
    fn test_internal_error_fallback_message() {
        assert_eq!(internal_error("").message, "Unexpected internal failure");
        assert_eq!(internal_error("pool").code, ErrorCode::InternalError);
    }

    #[test]
    fn test_error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::UnsupportedOperation).unwrap();
        assert_eq!(json, "\"UNSUPPORTED_OPERATION\"");
    }
}
