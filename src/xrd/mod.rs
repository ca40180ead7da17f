//! # XRD 扫描数据处理模块
//!
//! 从逐像素谱文件构建三维立方体，完成峰对齐、基线估计、标定与 ROI 聚合。
//!
//! ## 子模块
//! - `builder`: 读取谱文件并装配立方体
//! - `window`: 窗函数与矩统计
//! - `align`: 参考峰对齐
//! - `baseline`: 自适应基线与 SNIP
//! - `calibration`: 通道 → 角度标定
//! - `dataset`: 会话数据集
//! - `roi`: ROI 聚合与图像投影
//! - `store`: 数据集持久化
//! - `plot`: 图表生成
//! - `export`: 数据导出
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `parsers/`, `models/`, `batch/`

pub mod align;
pub mod baseline;
pub mod builder;
pub mod calibration;
pub mod dataset;
pub mod export;
pub mod plot;
pub mod roi;
pub mod store;
pub mod window;

pub use align::{align, apply_shifts, PeakAligner, ShiftMap};
pub use baseline::{estimate_baseline, snip, BaselineEngine};
pub use builder::{build_from_source, shift_rows, RawScan, ScanCubeBuilder};
pub use calibration::{fit_calibration, CalibrationModel};
pub use dataset::ScanDataset;
pub use roi::{
    aggregate_roi, project_channel_range, project_rgb, PixelRect, RoiOptions, RoiRect, RoiSet,
    RoiSpectrum,
};
pub use store::{load, save};
