//! # 数据集加载参数
//!
//! `roi` / `image` / `export` 共用的数据集文件与加载选项。
//!
//! ## 依赖关系
//! - 被 `cli/roi.rs`, `cli/image.rs`, `cli/export.rs` 展开使用
//! - 由 `commands/mod.rs` 的 `load_dataset` 消费

use crate::xrd::align::{PeakAligner, DEFAULT_HALF_WINDOW};
use crate::xrd::baseline::{BaselineEngine, DEFAULT_HALF_WIDTH, DEFAULT_ITERATIONS};

use clap::Args;
use std::path::PathBuf;

/// 默认标定文件
pub const DEFAULT_CALIBRATION_FILE: &str = "calibration.ini";

/// 数据集加载参数
#[derive(Args, Debug, Clone)]
pub struct DatasetArgs {
    /// Dataset file written by `xrdscan build`
    pub dataset: PathBuf,

    /// Re-detect alignment on the baseline cube at this channel and apply it to both cubes
    #[arg(short = 'z', long)]
    pub shift_z: Option<usize>,

    /// Half width of the --shift-z search window
    #[arg(long, default_value_t = DEFAULT_HALF_WINDOW)]
    pub align_window: usize,

    /// Baseline padding half width, used when the file carries no baseline
    #[arg(long, default_value_t = DEFAULT_HALF_WIDTH)]
    pub baseline_half_width: usize,

    /// Baseline refinement iterations, used when the file carries no baseline
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: usize,
}

impl DatasetArgs {
    pub fn engine(&self) -> BaselineEngine {
        BaselineEngine::new(self.baseline_half_width, self.iterations)
    }

    pub fn realigner(&self) -> Option<PeakAligner> {
        self.shift_z
            .map(|channel| PeakAligner::new(channel, self.align_window))
    }
}
