//! # export 子命令 CLI 定义
//!
//! 将对齐后立方体按像素写成 `CFrame%04d.dat` 标定谱文件。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/export.rs`

use crate::cli::dataset::{DatasetArgs, DEFAULT_CALIBRATION_FILE};

use clap::Args;
use std::path::PathBuf;

/// export 子命令参数
#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Calibration reference file (channel angle per line)
    #[arg(short, long, env = "XRDSCAN_CALIBRATION", default_value = DEFAULT_CALIBRATION_FILE)]
    pub calibration: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "converted")]
    pub output: PathBuf,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, env = "XRDSCAN_JOBS", default_value_t = 0)]
    pub jobs: usize,

    /// Overwrite existing output files
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}
