//! # 美化输出工具
//!
//! 提供统一的终端输出样式。状态行写到 stderr，
//! 这样 `--json` 模式下 stdout 只有结构化结果。
//!
//! ## 依赖关系
//! - 被 CLI `commands/` 模块使用
//! - 使用 `colored` crate

use colored::Colorize;

/// 打印成功消息
pub fn print_success(msg: &str) {
    eprintln!("{} {}", "[OK]".green().bold(), msg);
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    eprintln!("{} {}", "[*]".blue().bold(), msg);
}

/// 批量打印警告
pub fn print_warnings<S: AsRef<str>>(warnings: &[S]) {
    for warning in warnings {
        print_warning(warning.as_ref());
    }
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

/// 打印 `key: value` 形式的一行
pub fn print_field(key: &str, value: impl std::fmt::Display) {
    println!("  {:<28} {}", format!("{}:", key).dimmed(), value);
}

/// 可选数值的显示形式
pub fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "-".to_string(),
    }
}

/// 三态布尔的显示形式
pub fn fmt_flag(value: Option<bool>) -> String {
    match value {
        Some(true) => "yes".green().to_string(),
        Some(false) => "no".red().to_string(),
        None => "unknown".yellow().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_opt() {
        assert_eq!(fmt_opt(Some(-10.123456789), 4), "-10.1235");
        assert_eq!(fmt_opt(None, 4), "-");
    }

    #[test]
    fn test_fmt_flag_unknown() {
        colored::control::set_override(false);
        assert_eq!(fmt_flag(None), "unknown");
        assert_eq!(fmt_flag(Some(true)), "yes");
    }
}
