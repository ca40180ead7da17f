//! # roi 子命令 CLI 定义
//!
//! 对一个或多个矩形区域聚合谱，导出为 CSV / XY 数据或 PNG / SVG 图表。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/roi.rs`

use crate::cli::dataset::{DatasetArgs, DEFAULT_CALIBRATION_FILE};
use crate::xrd::baseline::DEFAULT_SNIP_WINDOW;
use crate::xrd::export::RoiCurve;
use crate::xrd::roi::RoiRect;

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// ROI 输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum RoiFormat {
    /// CSV with channel, angle and all four curves
    Csv,
    /// Two-column text (angle, value) of one curve
    Xy,
    /// PNG chart of all ROIs
    Png,
    /// SVG chart of all ROIs
    Svg,
}

impl std::fmt::Display for RoiFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoiFormat::Csv => write!(f, "csv"),
            RoiFormat::Xy => write!(f, "xy"),
            RoiFormat::Png => write!(f, "png"),
            RoiFormat::Svg => write!(f, "svg"),
        }
    }
}

/// XY 导出的曲线
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum CurveArg {
    Raw,
    Baseline,
    Snip,
    Subtracted,
}

impl std::fmt::Display for CurveArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", RoiCurve::from(*self).name())
    }
}

impl From<CurveArg> for RoiCurve {
    fn from(arg: CurveArg) -> Self {
        match arg {
            CurveArg::Raw => RoiCurve::Raw,
            CurveArg::Baseline => RoiCurve::Baseline,
            CurveArg::Snip => RoiCurve::Snip,
            CurveArg::Subtracted => RoiCurve::Subtracted,
        }
    }
}

/// roi 子命令参数
#[derive(Args, Debug)]
pub struct RoiArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    /// Region in pixel coordinates; repeatable [default: 32,32,12,12]
    #[arg(short, long = "roi", value_name = "X,Y,W,H")]
    pub rois: Vec<RoiRect>,

    /// Calibration reference file (channel angle per line)
    #[arg(short, long, env = "XRDSCAN_CALIBRATION", default_value = DEFAULT_CALIBRATION_FILE)]
    pub calibration: PathBuf,

    /// SNIP clipping window
    #[arg(long, default_value_t = DEFAULT_SNIP_WINDOW)]
    pub snip_m: usize,

    /// Scale every curve so the raw maximum is 1000
    #[arg(long, default_value_t = false)]
    pub normalize: bool,

    /// Average over pixels instead of summing (count per pixel)
    #[arg(long, default_value_t = false)]
    pub mean: bool,

    /// Also write the whole-map mean spectrum and its SNIP-subtracted mean
    #[arg(long, default_value_t = false)]
    pub full: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = RoiFormat::Csv)]
    pub format: RoiFormat,

    /// Curve written in XY format
    #[arg(long, value_enum, default_value_t = CurveArg::Subtracted)]
    pub curve: CurveArg,

    /// Output directory
    #[arg(short, long, default_value = "roi")]
    pub output: PathBuf,

    /// Chart width in pixels
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Chart height in pixels
    #[arg(long, default_value_t = 800)]
    pub height: u32,
}
