//! # 请求映射
//!
//! 把适配层传入的任意 JSON 对象映射为类型化请求。缺省字段使用
//! `config` 中的默认值；文件路径在这里完成校验。
//!
//! ## 依赖关系
//! - 使用 `validation/paths.rs`, `config.rs`, `analysis/tabular.rs`
//! - 被 CLI 和外部适配层使用

use super::paths::{validate_directory_path, validate_file_path, validate_outcar_path};
use super::{positive_count, positive_finite};
use crate::analysis::{Dataset, Delimiter};
use crate::config::{AnalysisConfig, DEFAULT_MAX_RUNS, DEFAULT_TOP_N};
use crate::error::{Result, VaspError};

use serde_json::{Map, Value};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────
// 字段读取
// ─────────────────────────────────────────────────────────────

fn object(raw: &Value) -> Result<&Map<String, Value>> {
    raw.as_object()
        .ok_or_else(|| VaspError::validation("Request payload must be a JSON object"))
}

/// 缺失或 null 视为空字符串，交给路径校验报错
fn string_field(map: &Map<String, Value>, field: &str) -> Result<String> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(VaspError::invalid_field(
            field,
            format!("{} must be a string", field),
        )),
    }
}

fn optional_string_field(map: &Map<String, Value>, field: &str) -> Result<Option<String>> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(VaspError::invalid_field(
            field,
            format!("{} must be a string", field),
        )),
    }
}

fn bool_field(map: &Map<String, Value>, field: &str, default: bool) -> Result<bool> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(VaspError::invalid_field(
            field,
            format!("{} must be a boolean", field),
        )),
    }
}

/// 接受 JSON 数字或数字字符串
fn float_field(map: &Map<String, Value>, field: &str, default: f64) -> Result<f64> {
    let value = match map.get(field) {
        None | Some(Value::Null) => default,
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            VaspError::invalid_field(field, format!("{} must be a positive number", field))
        })?,
        Some(_) => {
            return Err(VaspError::invalid_field(
                field,
                format!("{} must be a positive number", field),
            ))
        }
    };
    positive_finite(value, field)
}

fn count_field(map: &Map<String, Value>, field: &str, default: usize) -> Result<usize> {
    let value = match map.get(field) {
        None | Some(Value::Null) => default,
        Some(Value::Number(n)) => match n.as_u64() {
            Some(v) => v as usize,
            None => {
                return Err(VaspError::invalid_field(
                    field,
                    format!("{} must be a positive integer", field),
                ))
            }
        },
        Some(_) => {
            return Err(VaspError::invalid_field(
                field,
                format!("{} must be a positive integer", field),
            ))
        }
    };
    positive_count(value, field)
}

fn string_list_field(map: &Map<String, Value>, field: &str) -> Result<Vec<String>> {
    let items = match map.get(field) {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => {
            return Err(VaspError::invalid_field(
                field,
                format!("{} must be a non-empty list of strings", field),
            ))
        }
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            _ => Err(VaspError::invalid_field(
                field,
                format!("{} must contain only strings", field),
            )),
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────
// 请求类型
// ─────────────────────────────────────────────────────────────

/// OUTCAR 摘要请求（收敛曲线与离子步序列复用同一形状）
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    pub outcar_path: PathBuf,
    pub include_history: bool,
}

impl SummaryRequest {
    pub fn from_value(raw: &Value) -> Result<Self> {
        let map = object(raw)?;
        Ok(SummaryRequest {
            outcar_path: validate_outcar_path(&string_field(map, "outcar_path")?)?,
            include_history: bool_field(map, "include_history", false)?,
        })
    }
}

/// OUTCAR 诊断请求
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticsRequest {
    pub outcar_path: PathBuf,
    pub energy_tolerance_ev: f64,
    pub force_tolerance_ev_per_a: f64,
}

impl DiagnosticsRequest {
    pub fn from_value(raw: &Value) -> Result<Self> {
        let map = object(raw)?;
        let defaults = AnalysisConfig::default();
        Ok(DiagnosticsRequest {
            outcar_path: validate_outcar_path(&string_field(map, "outcar_path")?)?,
            energy_tolerance_ev: float_field(
                map,
                "energy_tolerance_ev",
                defaults.energy_tolerance_ev,
            )?,
            force_tolerance_ev_per_a: float_field(
                map,
                "force_tolerance_ev_per_a",
                defaults.force_tolerance_ev_per_a,
            )?,
        })
    }
}

/// 表格导出请求
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub outcar_path: PathBuf,
    pub dataset: Dataset,
    pub delimiter: Delimiter,
}

impl ExportRequest {
    pub fn from_value(raw: &Value) -> Result<Self> {
        let map = object(raw)?;
        let outcar_path = validate_outcar_path(&string_field(map, "outcar_path")?)?;

        let dataset = match optional_string_field(map, "dataset")? {
            Some(name) => name.parse()?,
            None => Dataset::IonicSeries,
        };
        let delimiter = match optional_string_field(map, "delimiter")? {
            Some(name) => name.parse()?,
            None => Delimiter::Comma,
        };

        Ok(ExportRequest {
            outcar_path,
            dataset,
            delimiter,
        })
    }
}

/// EIGENVAL/DOSCAR 元数据请求，至少需要一个来源
#[derive(Debug, Clone, PartialEq)]
pub struct ElectronicRequest {
    pub eigenval_path: Option<PathBuf>,
    pub doscar_path: Option<PathBuf>,
}

impl ElectronicRequest {
    pub fn from_value(raw: &Value) -> Result<Self> {
        let map = object(raw)?;
        let eigenval = optional_string_field(map, "eigenval_path")?;
        let doscar = optional_string_field(map, "doscar_path")?;

        if eigenval.is_none() && doscar.is_none() {
            return Err(VaspError::validation(
                "At least one of eigenval_path or doscar_path must be provided",
            ));
        }

        Ok(ElectronicRequest {
            eigenval_path: eigenval
                .map(|p| validate_file_path(&p, "eigenval_path", "EIGENVAL"))
                .transpose()?,
            doscar_path: doscar
                .map(|p| validate_file_path(&p, "doscar_path", "DOSCAR"))
                .transpose()?,
        })
    }
}

/// DOS 曲线请求
#[derive(Debug, Clone, PartialEq)]
pub struct DosProfileRequest {
    pub doscar_path: PathBuf,
    pub energy_window_ev: f64,
    pub max_points: usize,
}

impl DosProfileRequest {
    pub fn from_value(raw: &Value) -> Result<Self> {
        let map = object(raw)?;
        let defaults = AnalysisConfig::default();
        Ok(DosProfileRequest {
            doscar_path: validate_file_path(
                &string_field(map, "doscar_path")?,
                "doscar_path",
                "DOSCAR",
            )?,
            energy_window_ev: float_field(map, "energy_window_ev", defaults.dos_window_ev)?,
            max_points: count_field(map, "max_points", defaults.dos_max_points)?,
        })
    }
}

/// 批量请求（summarize / diagnose / insights 共用）
///
/// 路径不在这里校验，每个条目的失败记录在对应的行里。
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    pub outcar_paths: Vec<String>,
    pub energy_tolerance_ev: f64,
    pub force_tolerance_ev_per_a: f64,
    pub top_n: usize,
    pub fail_fast: bool,
    /// 0 = 自动
    pub jobs: usize,
}

impl BatchRequest {
    pub fn from_value(raw: &Value) -> Result<Self> {
        let map = object(raw)?;
        let defaults = AnalysisConfig::default();
        let jobs = match map.get("jobs") {
            None | Some(Value::Null) => defaults.jobs,
            Some(_) => count_field(map, "jobs", 1)?,
        };
        Ok(BatchRequest {
            outcar_paths: string_list_field(map, "outcar_paths")?,
            energy_tolerance_ev: float_field(
                map,
                "energy_tolerance_ev",
                defaults.energy_tolerance_ev,
            )?,
            force_tolerance_ev_per_a: float_field(
                map,
                "force_tolerance_ev_per_a",
                defaults.force_tolerance_ev_per_a,
            )?,
            top_n: count_field(map, "top_n", DEFAULT_TOP_N)?,
            fail_fast: bool_field(map, "fail_fast", defaults.fail_fast)?,
            jobs,
        })
    }
}

/// OUTCAR 发现请求
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoverRequest {
    pub root_dir: PathBuf,
    pub recursive: bool,
    pub max_runs: usize,
}

impl DiscoverRequest {
    pub fn from_value(raw: &Value) -> Result<Self> {
        let map = object(raw)?;
        Ok(DiscoverRequest {
            root_dir: validate_directory_path(
                &string_field(map, "root_dir")?,
                "root_dir",
                "Root directory",
            )?,
            recursive: bool_field(map, "recursive", false)?,
            max_runs: count_field(map, "max_runs", DEFAULT_MAX_RUNS)?,
        })
    }
}
