//! # 解析器模块
//!
//! 提供扫描参数、单像素谱与标定参考点三类文本输入的解析器。
//!
//! ## 依赖关系
//! - 被 `xrd/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: parameters, spectrum, calibration

pub mod calibration;
pub mod parameters;
pub mod spectrum;

pub use calibration::parse_calibration_file;
pub use parameters::{parse_parameters_file, ScanParameters};
pub use spectrum::parse_spectrum_file;
