//! # xrdscan - 栅格扫描 XRD 高光谱数据处理
//!
//! 将逐像素 XRD 谱文件重建为 `[row, col, channel]` 立方体，完成参考峰对齐、
//! 自适应基线估计、通道标定与 ROI 聚合。
//!
//! ## 依赖关系
//! ```text
//! lib.rs
//!   ├── xrd/        (立方体构建、对齐、基线、标定、ROI、存取、导出)
//!   │     ├── parsers/   (参数、谱、标定文件解析)
//!   │     ├── batch/     (文件收集与并行批处理)
//!   │     └── models/    (扫描几何)
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   ├── utils/      (终端输出)
//!   └── error.rs    (错误处理)
//! ```

pub mod batch;
pub mod cli;
pub mod commands;
pub mod error;
pub mod models;
pub mod parsers;
pub mod utils;
pub mod xrd;

pub use error::{Result, XrdError};
