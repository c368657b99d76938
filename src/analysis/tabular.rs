//! # 表格导出
//!
//! 将收敛曲线或离子步序列写成分隔文本（含表头）。
//! 浮点数以完整精度输出，缺失值输出为空字段。
//!
//! ## 依赖关系
//! - 被 `operations/outcar.rs` 和 CLI `export` 命令使用
//! - 使用 `csv` crate

use crate::error::{Result, VaspError};
use crate::models::{ConvergenceProfilePoint, IonicSeriesPoint};

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 字段分隔符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Delimiter::Comma => "comma",
            Delimiter::Semicolon => "semicolon",
            Delimiter::Tab => "tab",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Delimiter::Tab => "tsv",
            _ => "csv",
        }
    }
}

impl FromStr for Delimiter {
    type Err = VaspError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "comma" | "," => Ok(Delimiter::Comma),
            "semicolon" | ";" => Ok(Delimiter::Semicolon),
            "tab" | "\t" => Ok(Delimiter::Tab),
            other => Err(VaspError::invalid_field(
                "delimiter",
                format!(
                    "Unsupported delimiter '{}'; expected comma, semicolon or tab",
                    other
                ),
            )),
        }
    }
}

impl std::fmt::Display for Delimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 可导出的数据集
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    ConvergenceProfile,
    IonicSeries,
}

impl Dataset {
    pub fn as_str(self) -> &'static str {
        match self {
            Dataset::ConvergenceProfile => "convergence_profile",
            Dataset::IonicSeries => "ionic_series",
        }
    }

    pub fn filename_hint(self, delimiter: Delimiter) -> String {
        format!("{}.{}", self.as_str(), delimiter.extension())
    }
}

impl FromStr for Dataset {
    type Err = VaspError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "convergence_profile" => Ok(Dataset::ConvergenceProfile),
            "ionic_series" => Ok(Dataset::IonicSeries),
            other => Err(VaspError::UnsupportedOperation(format!(
                "dataset '{}' cannot be exported; expected convergence_profile or ionic_series",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 可写成一行表格的记录
pub trait TabularRecord {
    const DATASET: Dataset;

    fn headers() -> &'static [&'static str];

    /// 与 `headers()` 等长
    fn cells(&self) -> Vec<String>;
}

fn number(value: f64) -> String {
    value.to_string()
}

fn optional(value: Option<f64>) -> String {
    value.map(number).unwrap_or_default()
}

impl TabularRecord for ConvergenceProfilePoint {
    const DATASET: Dataset = Dataset::ConvergenceProfile;

    fn headers() -> &'static [&'static str] {
        &[
            "ionic_step",
            "total_energy_ev",
            "delta_energy_ev",
            "relative_energy_ev",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.ionic_step.to_string(),
            number(self.total_energy_ev),
            optional(self.delta_energy_ev),
            optional(self.relative_energy_ev),
        ]
    }
}

impl TabularRecord for IonicSeriesPoint {
    const DATASET: Dataset = Dataset::IonicSeries;

    fn headers() -> &'static [&'static str] {
        &[
            "ionic_step",
            "total_energy_ev",
            "delta_energy_ev",
            "relative_energy_ev",
            "max_force_ev_per_a",
            "external_pressure_kb",
            "fermi_energy_ev",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.ionic_step.to_string(),
            number(self.total_energy_ev),
            optional(self.delta_energy_ev),
            optional(self.relative_energy_ev),
            optional(self.max_force_ev_per_a),
            optional(self.external_pressure_kb),
            optional(self.fermi_energy_ev),
        ]
    }
}

/// 导出结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularExport {
    pub dataset: Dataset,
    pub delimiter: Delimiter,
    pub content: String,
    pub row_count: usize,
    pub filename_hint: String,
}

/// 写出分隔文本；`dataset` 必须与记录类型一致
pub fn export_tabular<R: TabularRecord>(
    points: &[R],
    dataset: Dataset,
    delimiter: Delimiter,
) -> Result<TabularExport> {
    if dataset != R::DATASET {
        return Err(VaspError::UnsupportedOperation(format!(
            "cannot export {} records as dataset '{}'",
            R::DATASET,
            dataset
        )));
    }

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter.as_byte())
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(R::headers())?;
    for point in points {
        wtr.write_record(point.cells())?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| VaspError::Other(format!("failed to flush tabular output: {}", e)))?;
    let content = String::from_utf8(bytes)
        .map_err(|e| VaspError::Other(format!("tabular output is not UTF-8: {}", e)))?;

    Ok(TabularExport {
        dataset,
        delimiter,
        content,
        row_count: points.len(),
        filename_hint: dataset.filename_hint(delimiter),
    })
}
