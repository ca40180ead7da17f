//! # xrdscan 命令行入口
//!
//! ## 子命令
//! - `build` - 从逐像素谱文件构建数据集
//! - `roi` - ROI 谱导出
//! - `image` - 通道范围图像
//! - `calibrate` - 标定曲线拟合
//! - `export` - 逐像素标定谱文件导出
//!
//! 日志默认级别为 `warn`，`-v` 提升到 `info`，`-vv` 到 `debug`，
//! 设置 `RUST_LOG` 时以其为准。

use clap::Parser;
use env_logger::{Builder, Env};
use xrdscan::cli::Cli;
use xrdscan::{commands, utils};

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();
    init_logger(cli.verbose);

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
