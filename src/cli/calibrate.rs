//! # calibrate 子命令 CLI 定义
//!
//! 由参考峰文件拟合二次标定曲线，打印系数与残差，可选导出完整标定表。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/calibrate.rs`

use crate::cli::dataset::DEFAULT_CALIBRATION_FILE;
use crate::xrd::calibration::DEFAULT_CHANNELS;

use clap::Args;
use std::path::PathBuf;

/// calibrate 子命令参数
#[derive(Args, Debug)]
pub struct CalibrateArgs {
    /// Reference file with one "channel angle" pair per line
    #[arg(default_value = DEFAULT_CALIBRATION_FILE)]
    pub file: PathBuf,

    /// Number of detector channels
    #[arg(short = 'n', long, default_value_t = DEFAULT_CHANNELS)]
    pub channels: usize,

    /// Write the channel-to-angle table as CSV
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
