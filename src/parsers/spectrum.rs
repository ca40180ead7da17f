//! # 单像素谱文件解析器
//!
//! 每个扫描像素对应一个两列文本文件：
//! ```text
//! 0    12
//! 1    15
//! ...  ...
//! 1279 9
//! ```
//! 第一列为通道号，第二列为计数。空行与 `#` 注释行被跳过。
//!
//! ## 依赖关系
//! - 被 `xrd/builder.rs` 使用
//! - 被 `parsers/calibration.rs` 复用两列解析

use crate::error::{XrdError, Result};
use std::fs;
use std::path::Path;

/// 读取谱文件，返回强度序列
pub fn parse_spectrum_file(path: &Path) -> Result<Vec<f64>> {
    let content = fs::read_to_string(path).map_err(|e| XrdError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let intensities = parse_spectrum_content(&content, &path.display().to_string())?;
    if intensities.is_empty() {
        return Err(XrdError::EmptySpectrum {
            path: path.display().to_string(),
        });
    }
    Ok(intensities)
}

/// 从字符串内容解析强度列
pub fn parse_spectrum_content(content: &str, source: &str) -> Result<Vec<f64>> {
    Ok(parse_xy_content(content, source)?
        .into_iter()
        .map(|(_, y)| y)
        .collect())
}

/// 解析两列数值表
pub fn parse_xy_content(content: &str, source: &str) -> Result<Vec<(f64, f64)>> {
    let mut rows = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let malformed = || XrdError::MalformedRowError {
            path: source.to_string(),
            line: idx + 1,
            content: trimmed.to_string(),
        };

        let mut tokens = trimmed.split_whitespace();
        let x = tokens.next().ok_or_else(malformed)?;
        let y = tokens.next().ok_or_else(malformed)?;

        let x: f64 = x.parse().map_err(|_| malformed())?;
        let y: f64 = y.parse().map_err(|_| malformed())?;
        // `f64::from_str` 接受 "nan" / "inf"
        if !x.is_finite() || !y.is_finite() {
            return Err(malformed());
        }
        rows.push((x, y));
    }

    Ok(rows)
}
