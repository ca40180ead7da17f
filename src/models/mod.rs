//! # 数据模型模块
//!
//! 定义扫描几何与扫描顺序等纯数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/` 和 `xrd/` 使用
//! - 子模块: geometry

pub mod geometry;

pub use geometry::{FileOrder, RowOrder, ScanGeometry, ScanOrder};
