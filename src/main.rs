//! # vasplens - VASP 输出分析工具
//!
//! 单一可执行文件，封装 `vasplens` 库中的操作。
//!
//! ## 子命令
//! - `summary` / `diagnose` / `profile` / `series` / `export` - 单个 OUTCAR
//! - `electronic` / `dos` - EIGENVAL 与 DOSCAR
//! - `batch` / `discover` - 多个运行
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   └── commands/   (命令执行逻辑)
//!         └── vasplens 库 (operations, batch, validation, utils)
//! ```

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    env_logger::init_from_env(env_logger::Env::default().default_filter_or("warn"));

    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = commands::run(cli) {
        commands::report_error(&e, json);
        std::process::exit(1);
    }
}
