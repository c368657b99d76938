//! # 日志来源
//!
//! 批量执行的单个输入。核心操作只处理文本，文件读取在这里完成。
//!
//! ## 依赖关系
//! - 被 `batch/mod.rs` 使用
//! - 使用 `validation/paths.rs`

use crate::error::Result;
use crate::validation::{read_text_lossy, validate_outcar_path};

use std::path::Path;

/// 可读取为文本的输入
pub trait LogSource: Sync {
    /// 结果行中显示的来源标识
    fn label(&self) -> String;

    fn read_text(&self) -> Result<String>;
}

/// 内存中的文本
#[derive(Debug, Clone)]
pub struct TextSource {
    label: String,
    text: String,
}

impl TextSource {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

impl LogSource for TextSource {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn read_text(&self) -> Result<String> {
        Ok(self.text.clone())
    }
}

/// 磁盘上的 OUTCAR 文件，读取前校验路径
#[derive(Debug, Clone)]
pub struct FileSource {
    path: String,
}

impl FileSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_path(path: &Path) -> Self {
        Self::new(path.display().to_string())
    }
}

impl LogSource for FileSource {
    fn label(&self) -> String {
        self.path.clone()
    }

    fn read_text(&self) -> Result<String> {
        let resolved = validate_outcar_path(&self.path)?;
        read_text_lossy(&resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_text_source() {
        let source = TextSource::new("run-1", "text");
        assert_eq!(source.label(), "run-1");
        assert_eq!(source.read_text().unwrap(), "text");
    }

    #[test]
    fn test_file_source_missing() {
        let source = FileSource::new("/definitely/not/here/OUTCAR");
        assert_eq!(source.read_text().unwrap_err().code(), ErrorCode::FileNotFound);
    }

    #[test]
    fn test_file_source_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("OUTCAR");
        std::fs::write(&path, "SYSTEM = x\n").unwrap();

        let source = FileSource::from_path(&path);
        assert_eq!(source.read_text().unwrap(), "SYSTEM = x\n");
    }
}
