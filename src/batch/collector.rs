//! # 运行收集器
//!
//! 在根目录下查找 OUTCAR 文件，供批量命令使用。
//!
//! ## 功能
//! - 非递归: 根目录本身及其直接子目录
//! - 递归: 整个目录树
//! - glob 文件名匹配（默认 `OUTCAR`）
//! - 结果排序去重，超出上限时截断并给出警告
//!
//! ## 依赖关系
//! - 被 `batch/mod.rs` 和 CLI `discover`/`batch` 命令调用
//! - 使用 `walkdir` 遍历目录, `glob` 匹配文件名

use crate::config::DEFAULT_MAX_RUNS;
use crate::error::{Result, VaspError};

use glob::Pattern;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const OUTCAR_FILE_NAME: &str = "OUTCAR";

/// 发现结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discovery {
    pub root_dir: PathBuf,
    pub recursive: bool,
    pub max_runs: usize,
    pub total_discovered: usize,
    pub returned_count: usize,
    pub outcar_paths: Vec<PathBuf>,
    pub run_dirs: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// 运行收集器
pub struct RunCollector {
    /// 根目录
    root: PathBuf,
    /// 文件名匹配模式（None 时只匹配 `OUTCAR`）
    pattern: Option<Pattern>,
    /// 是否递归
    recursive: bool,
    max_runs: usize,
}

impl RunCollector {
    /// 创建新的收集器
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            pattern: None,
            recursive: false,
            max_runs: DEFAULT_MAX_RUNS,
        }
    }

    /// 设置文件名匹配模式
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        let compiled = Pattern::new(pattern).map_err(|e| {
            VaspError::invalid_field("pattern", format!("invalid glob '{}': {}", pattern, e))
        })?;
        self.pattern = Some(compiled);
        Ok(self)
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn max_runs(mut self, max_runs: usize) -> Self {
        self.max_runs = max_runs;
        self
    }

    /// 收集所有匹配的文件
    pub fn collect(&self) -> Result<Discovery> {
        if !self.root.is_dir() {
            return Err(VaspError::DirectoryNotFound {
                label: "Root directory".to_string(),
                field: "root_dir".to_string(),
                path: self.root.display().to_string(),
            });
        }

        // root/OUTCAR 深度为 1，root/run/OUTCAR 深度为 2
        let max_depth = if self.recursive { usize::MAX } else { 2 };

        let mut discovered: Vec<PathBuf> = WalkDir::new(&self.root)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.matches(e.path()))
            .map(|e| e.path().canonicalize().unwrap_or_else(|_| e.path().to_path_buf()))
            .collect();

        discovered.sort();
        discovered.dedup();

        let total_discovered = discovered.len();
        let mut warnings = Vec::new();
        if total_discovered > self.max_runs {
            discovered.truncate(self.max_runs);
            warnings.push(format!(
                "Discovery truncated: found {} OUTCAR files, returning first {}",
                total_discovered, self.max_runs
            ));
        }
        debug!(
            "discovered {} runs under {}",
            total_discovered,
            self.root.display()
        );

        let run_dirs = discovered
            .iter()
            .map(|p| p.parent().map(Path::to_path_buf).unwrap_or_default())
            .collect();

        Ok(Discovery {
            root_dir: self.root.clone(),
            recursive: self.recursive,
            max_runs: self.max_runs,
            total_discovered,
            returned_count: discovered.len(),
            outcar_paths: discovered,
            run_dirs,
            warnings,
        })
    }

    /// 检查文件名是否匹配
    fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |name| match &self.pattern {
                Some(pattern) => pattern.matches(name),
                None => name == OUTCAR_FILE_NAME,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("OUTCAR"), "").unwrap();
        for run in ["run-b", "run-a"] {
            fs::create_dir(root.join(run)).unwrap();
            fs::write(root.join(run).join("OUTCAR"), "").unwrap();
        }
        fs::create_dir_all(root.join("deep/nested")).unwrap();
        fs::write(root.join("deep/nested/OUTCAR"), "").unwrap();
        fs::write(root.join("run-a/OSZICAR"), "").unwrap();
        dir
    }

    #[test]
    fn test_collect_one_level() {
        let dir = tree();
        let found = RunCollector::new(dir.path().to_path_buf()).collect().unwrap();

        assert_eq!(found.total_discovered, 3);
        assert!(found.outcar_paths.windows(2).all(|w| w[0] <= w[1]));
        assert!(found
            .outcar_paths
            .iter()
            .all(|p| p.file_name().unwrap() == "OUTCAR"));
        assert!(found.warnings.is_empty());
    }

    #[test]
    fn test_collect_recursive_with_limit() {
        let dir = tree();
        let found = RunCollector::new(dir.path().to_path_buf())
            .recursive(true)
            .max_runs(2)
            .collect()
            .unwrap();

        assert_eq!(found.total_discovered, 4);
        assert_eq!(found.returned_count, 2);
        assert_eq!(found.run_dirs.len(), 2);
        assert_eq!(found.warnings.len(), 1);
    }

    #[test]
    fn test_custom_pattern() {
        let dir = tree();
        let found = RunCollector::new(dir.path().to_path_buf())
            .with_pattern("OS*")
            .unwrap()
            .collect()
            .unwrap();
        assert_eq!(found.total_discovered, 1);

        assert!(RunCollector::new(dir.path().to_path_buf())
            .with_pattern("[")
            .is_err());
    }

    #[test]
    fn test_missing_root() {
        let err = RunCollector::new(PathBuf::from("/no/such/root"))
            .collect()
            .unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::FileNotFound);
    }
}
