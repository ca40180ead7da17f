//! # 标定参考点文件解析器
//!
//! 两列文本：`channel angle`，每行一个参考峰。
//!
//! ## 依赖关系
//! - 被 `xrd/calibration.rs` 使用
//! - 使用 `parsers/spectrum.rs` 的两列解析

use crate::error::{XrdError, Result};
use crate::parsers::spectrum::parse_xy_content;

use std::fs;
use std::path::Path;

/// 读取标定参考点
pub fn parse_calibration_file(path: &Path) -> Result<Vec<(f64, f64)>> {
    if !path.exists() {
        return Err(XrdError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| XrdError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_xy_content(&content, &path.display().to_string())
}
