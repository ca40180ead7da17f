//! # build 子命令 CLI 定义
//!
//! 读取扫描参数与 `[Ff]rame*.dat` 谱文件，对齐、估计基线后写入数据集文件。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/build.rs`

use crate::models::{FileOrder, RowOrder, ScanOrder};
use crate::xrd::align::{DEFAULT_HALF_WINDOW, DEFAULT_REFERENCE_CHANNEL};
use crate::xrd::baseline::{DEFAULT_HALF_WIDTH, DEFAULT_ITERATIONS};
use crate::xrd::builder::{DEFAULT_FRAME_PATTERN, DEFAULT_PARAMETERS_FILE};

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 文件序列方向
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum FileOrderArg {
    /// Lowest frame number becomes the first pixel
    Ascending,
    /// Highest frame number becomes the first pixel
    Descending,
}

impl std::fmt::Display for FileOrderArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOrderArg::Ascending => write!(f, "ascending"),
            FileOrderArg::Descending => write!(f, "descending"),
        }
    }
}

impl From<FileOrderArg> for FileOrder {
    fn from(arg: FileOrderArg) -> Self {
        match arg {
            FileOrderArg::Ascending => FileOrder::Ascending,
            FileOrderArg::Descending => FileOrder::Descending,
        }
    }
}

/// 行方向
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum RowOrderArg {
    /// Every row runs left to right
    Raster,
    /// Odd rows run right to left
    Serpentine,
}

impl std::fmt::Display for RowOrderArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowOrderArg::Raster => write!(f, "raster"),
            RowOrderArg::Serpentine => write!(f, "serpentine"),
        }
    }
}

impl From<RowOrderArg> for RowOrder {
    fn from(arg: RowOrderArg) -> Self {
        match arg {
            RowOrderArg::Raster => RowOrder::Raster,
            RowOrderArg::Serpentine => RowOrder::Serpentine,
        }
    }
}

/// build 子命令参数
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Directory containing the spectrum files and the scan parameters
    pub dir: PathBuf,

    /// Scan parameters file (relative to DIR unless absolute)
    #[arg(long, default_value = DEFAULT_PARAMETERS_FILE)]
    pub parameters: PathBuf,

    /// Glob pattern for spectrum files
    #[arg(short, long, default_value = DEFAULT_FRAME_PATTERN)]
    pub pattern: String,

    /// How the frame-number order maps onto scan pixels
    #[arg(long, value_enum, default_value_t = FileOrderArg::Descending)]
    pub file_order: FileOrderArg,

    /// Row direction of the scan
    #[arg(long, value_enum, default_value_t = RowOrderArg::Serpentine)]
    pub row_order: RowOrderArg,

    /// Lag correction between forward and backward rows, in pixels
    #[arg(short = 's', long, default_value_t = 0, allow_negative_numbers = true)]
    pub shift_y: isize,

    /// Channel the reference peak is aligned to
    #[arg(long, default_value_t = DEFAULT_REFERENCE_CHANNEL)]
    pub align_channel: usize,

    /// Half width of the alignment search window
    #[arg(long, default_value_t = DEFAULT_HALF_WINDOW)]
    pub align_window: usize,

    /// Skip peak alignment
    #[arg(long, default_value_t = false)]
    pub no_align: bool,

    /// Baseline padding half width
    #[arg(long, default_value_t = DEFAULT_HALF_WIDTH)]
    pub baseline_half_width: usize,

    /// Baseline refinement iterations
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: usize,

    /// Do not store a baseline cube (it is recomputed on load)
    #[arg(long, default_value_t = false)]
    pub no_baseline: bool,

    /// Output dataset file [default: DIR/data.xrd]
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl BuildArgs {
    pub fn scan_order(&self) -> ScanOrder {
        ScanOrder::new(self.file_order.into(), self.row_order.into())
    }
}
