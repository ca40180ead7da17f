//! # image 子命令 CLI 定义
//!
//! 按通道范围积分生成扫描图像：不给范围为全通道积分，
//! 一个范围为单色图，三个范围为 RGB 图。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/image.rs`

use crate::cli::dataset::DatasetArgs;
use crate::xrd::roi::RoiRect;

use clap::{Args, ValueEnum};
use std::ops::Range;
use std::path::PathBuf;

/// 图像输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG image
    Png,
    /// CSV with one line per scan row
    Csv,
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageFormat::Png => write!(f, "png"),
            ImageFormat::Csv => write!(f, "csv"),
        }
    }
}

/// 解析通道范围 `L-R`（左闭右开）
pub fn parse_channel_range(input: &str) -> Result<Range<usize>, String> {
    let invalid = || format!("Invalid channel range '{}'. Use LEFT-RIGHT, e.g. 718-730", input);

    let (left, right) = input.split_once('-').ok_or_else(invalid)?;
    let left: usize = left.trim().parse().map_err(|_| invalid())?;
    let right: usize = right.trim().parse().map_err(|_| invalid())?;
    if left >= right {
        return Err(format!("{} (LEFT must be below RIGHT)", invalid()));
    }
    Ok(left..right)
}

/// image 子命令参数
#[derive(Args, Debug)]
pub struct ImageArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Channel range LEFT-RIGHT; give none, one or three
    #[arg(short, long = "range", value_name = "L-R", value_parser = parse_channel_range)]
    pub ranges: Vec<Range<usize>>,

    /// Use the default single channel range 718-730
    #[arg(long, default_value_t = false, conflicts_with_all = ["ranges", "rgb"])]
    pub mono: bool,

    /// Use the default RGB channel ranges (445, 720, 1134; 12 channels each)
    #[arg(long, default_value_t = false, conflicts_with = "ranges")]
    pub rgb: bool,

    /// Project the baseline cube instead of the aligned cube
    #[arg(long, default_value_t = false)]
    pub baseline: bool,

    /// Crop to a region X,Y,W,H in pixel coordinates
    #[arg(long, value_name = "X,Y,W,H")]
    pub crop: Option<RoiRect>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = ImageFormat::Png)]
    pub format: ImageFormat,

    /// Pixel magnification for PNG output
    #[arg(long, default_value_t = 4)]
    pub scale: u32,

    /// Output file
    #[arg(short, long, default_value = "image.png")]
    pub output: PathBuf,
}
