//! # 批量处理模块
//!
//! 提供统一的文件收集与并行批处理能力。
//!
//! ## 功能
//! - 按模式收集文件，按帧编号排序
//! - 并行处理
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `xrd/builder.rs`, `xrd/export.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::{frame_index, FileCollector};
pub use runner::{BatchResult, BatchRunner, ProcessResult};
