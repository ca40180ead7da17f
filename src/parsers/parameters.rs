//! # 扫描参数文件解析器
//!
//! 解析采集软件写出的扫描参数文件（如 `Scanning_Parameters.txt`）。
//!
//! ## 格式说明
//! ```text
//! SAMPLE = painting_04          # key = value 行
//! EXPOSURE = 10
//! AXIS: X   STEP: 80            # 同一行的轴/步数
//! AXIS: Y                       # 或轴与步数分两行
//! STEP: 60
//! ```
//!
//! 轴名不区分大小写，`X` 给出宽度，`Y` 给出高度。
//!
//! ## 依赖关系
//! - 被 `xrd/builder.rs` 使用
//! - 使用 `models/geometry.rs`

use crate::error::{XrdError, Result};
use crate::models::ScanGeometry;

use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static AXIS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"AXIS:\s*(\S)").unwrap());
static STEP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"STEP:\s*(\d+)").unwrap());

/// 扫描参数
#[derive(Debug, Clone, Default)]
pub struct ScanParameters {
    /// key = value 条目（key 已转小写）
    pub entries: BTreeMap<String, String>,
    /// 各轴步数（轴名已转小写）
    pub steps: BTreeMap<String, usize>,
    /// 来源文件名，用于错误信息
    source: String,
}

impl ScanParameters {
    /// 查询 key = value 条目
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&key.to_lowercase()).map(|s| s.as_str())
    }

    /// 查询某轴步数
    pub fn step(&self, axis: &str) -> Option<usize> {
        self.steps.get(&axis.to_lowercase()).copied()
    }

    /// 从参数中提取扫描网格尺寸
    pub fn geometry(&self) -> Result<ScanGeometry> {
        let width = self.axis_size("x", "width")?;
        let height = self.axis_size("y", "height")?;
        Ok(ScanGeometry::new(width, height))
    }

    fn axis_size(&self, axis: &str, alias: &str) -> Result<usize> {
        let value = match self.step(axis) {
            Some(n) => Some(n),
            None => [alias, axis]
                .iter()
                .filter_map(|k| self.get(k))
                .find_map(|v| v.parse::<usize>().ok()),
        };

        match value {
            Some(0) => Err(XrdError::ConfigError {
                path: self.source.clone(),
                reason: format!("axis {} has zero steps", axis.to_uppercase()),
            }),
            Some(n) => Ok(n),
            None => Err(XrdError::ConfigError {
                path: self.source.clone(),
                reason: format!("missing step count for axis {}", axis.to_uppercase()),
            }),
        }
    }
}

/// 解析扫描参数文件
pub fn parse_parameters_file(path: &Path) -> Result<ScanParameters> {
    if !path.exists() {
        return Err(XrdError::ConfigError {
            path: path.display().to_string(),
            reason: "scan parameter file not found".to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| XrdError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(parse_parameters_content(&content, &path.display().to_string()))
}

/// 从字符串内容解析扫描参数
pub fn parse_parameters_content(content: &str, source: &str) -> ScanParameters {
    let mut params = ScanParameters {
        source: source.to_string(),
        ..Default::default()
    };
    let mut pending_axis: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            params
                .entries
                .insert(key.trim().to_lowercase(), value.trim().to_string());
            continue;
        }

        let axis = AXIS_RE
            .captures(line)
            .map(|c| c[1].to_lowercase());
        let step = STEP_RE
            .captures(line)
            .and_then(|c| c[1].parse::<usize>().ok());

        match (axis, step) {
            (Some(axis), Some(step)) => {
                params.steps.insert(axis, step);
                pending_axis = None;
            }
            (Some(axis), None) => pending_axis = Some(axis),
            (None, Some(step)) => {
                if let Some(axis) = pending_axis.take() {
                    params.steps.insert(axis, step);
                }
            }
            (None, None) => {}
        }
    }

    params
}
