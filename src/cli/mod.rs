//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `build`: 从逐像素谱文件构建数据集
//! - `roi`: 导出 ROI 谱
//! - `image`: 导出通道范围图像
//! - `calibrate`: 拟合并检查标定曲线
//! - `export`: 导出逐像素标定谱文件
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: build, dataset, roi, image, calibrate, export

pub mod build;
pub mod calibrate;
pub mod dataset;
pub mod export;
pub mod image;
pub mod roi;

use clap::{ArgAction, Parser, Subcommand};

/// xrdscan - 栅格扫描 XRD 高光谱数据处理工具
#[derive(Parser)]
#[command(name = "xrdscan")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Processing toolkit for raster-scanned XRD hyperspectral maps", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Build an aligned, baseline-corrected dataset from per-pixel spectrum files
    Build(build::BuildArgs),

    /// Aggregate spectra over rectangular regions of interest
    Roi(roi::RoiArgs),

    /// Render integrated, single-range or RGB images of a dataset
    Image(image::ImageArgs),

    /// Fit a channel-to-angle calibration from reference peaks
    Calibrate(calibrate::CalibrateArgs),

    /// Write one calibrated ASCII spectrum per scan pixel
    Export(export::ExportArgs),
}
