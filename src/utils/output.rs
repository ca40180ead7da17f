//! # 终端输出
//!
//! 用户可见的步骤、结果与失败列表统一走这里，诊断细节走 `log`。
//! 每条消息带一个着色标签前缀，例如 `[OK]`、`[WARN]`。
//!
//! ## 依赖关系
//! - 被所有 `commands/` 模块与 `main.rs` 使用
//! - 使用 `colored` crate

use colored::{ColoredString, Colorize};

/// 失败列表最多展示的条目数
const MAX_LISTED_FAILURES: usize = 10;

const RULE_WIDTH: usize = 60;

fn tagged(tag: ColoredString, msg: &str) {
    println!("{} {}", tag, msg);
}

pub fn print_success(msg: &str) {
    tagged("[OK]".green().bold(), msg);
}

/// 错误写到 stderr
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

pub fn print_warning(msg: &str) {
    tagged("[WARN]".yellow().bold(), msg);
}

pub fn print_info(msg: &str) {
    tagged("[*]".blue().bold(), msg);
}

/// 被关闭的处理步骤
pub fn print_skip(msg: &str) {
    tagged("[SKIP]".dimmed(), msg);
}

pub fn print_done(msg: &str) {
    tagged("[DONE]".green().bold(), msg);
}

/// 命令标题，上下各一条横线
pub fn print_header(title: &str) {
    let rule = "─".repeat(RULE_WIDTH);
    println!("\n{}\n  {}\n{}\n", rule.dimmed(), title.bold(), rule.dimmed());
}

pub fn print_separator() {
    println!("{}", "─".repeat(RULE_WIDTH).dimmed());
}

/// 列出批处理失败项 `(文件, 原因)`，超出部分只给计数
pub fn print_failures(failures: &[(String, String)]) {
    if failures.is_empty() {
        return;
    }

    print_warning(&format!("{} file(s) failed:", failures.len()));
    for (path, reason) in failures.iter().take(MAX_LISTED_FAILURES) {
        print_error(&format!("  {}: {}", path, reason));
    }
    if failures.len() > MAX_LISTED_FAILURES {
        print_warning(&format!(
            "  ... and {} more",
            failures.len() - MAX_LISTED_FAILURES
        ));
    }
}
