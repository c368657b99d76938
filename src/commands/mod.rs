//! # 命令执行模块
//!
//! 实现各子命令：校验路径、读取文件、调用库中的操作，再以表格或 JSON 输出。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/` 以及库中的 `operations/`, `batch/`, `validation/`, `utils/`
//! - 子模块: outcar, electronic, batch, plot

pub mod batch;
pub mod electronic;
pub mod outcar;
pub mod plot;

use crate::cli::{Cli, Commands};

use serde::Serialize;
use std::path::Path;

use vasplens::error::{internal_error, AppError};
use vasplens::validation::{read_text_lossy, validate_file_path, validate_outcar_path};
use vasplens::OpResult;

/// 执行命令
pub fn run(cli: Cli) -> OpResult<()> {
    let json = cli.json;
    match cli.command {
        Commands::Summary(args) => outcar::summary(args, json),
        Commands::Diagnose(args) => outcar::diagnose(args, json),
        Commands::Profile(args) => outcar::profile(args, json),
        Commands::Series(args) => outcar::series(args, json),
        Commands::Export(args) => outcar::export(args, json),
        Commands::Electronic(args) => electronic::electronic(args, json),
        Commands::Dos(args) => electronic::dos(args, json),
        Commands::Batch(args) => batch::batch(args, json),
        Commands::Discover(args) => batch::discover(args, json),
    }
}

/// 校验并读取 OUTCAR
fn read_outcar(path: &Path) -> OpResult<String> {
    let resolved = validate_outcar_path(&path.to_string_lossy())?;
    Ok(read_text_lossy(&resolved)?)
}

/// 校验并读取其他输入文件
fn read_input(path: &Path, field: &str, label: &str) -> OpResult<String> {
    let resolved = validate_file_path(&path.to_string_lossy(), field, label)?;
    Ok(read_text_lossy(&resolved)?)
}

/// 以缩进 JSON 输出到 stdout
fn print_json<T: Serialize>(value: &T) -> OpResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| internal_error(format!("failed to serialize output: {}", e)))?;
    println!("{}", text);
    Ok(())
}

/// 错误输出：JSON 模式下写 `{code, message, details?}`
pub fn report_error(err: &AppError, json: bool) {
    if json {
        println!("{}", err.to_mapping());
    } else {
        vasplens::utils::output::print_error(&err.to_string());
    }
}
