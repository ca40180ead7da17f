//! # 文件收集器
//!
//! 根据输入目录和模式收集待处理文件列表。
//!
//! ## 功能
//! - glob 模式匹配（逗号分隔多模式）
//! - 按文件名中嵌入的编号排序（`Frame2.dat` 在 `frame10.dat` 之前）
//!
//! ## 依赖关系
//! - 被 `xrd/builder.rs` 调用
//! - 使用 `walkdir` 遍历目录，`glob` 匹配文件名

use crate::error::{XrdError, Result};

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 文件收集器
pub struct FileCollector {
    /// 输入目录
    input: PathBuf,
    /// 匹配模式列表
    patterns: Vec<String>,
}

impl FileCollector {
    /// 创建新的文件收集器
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: vec!["*".to_string()],
        }
    }

    /// 设置匹配模式（逗号分隔的多模式）
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.patterns = pattern
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if self.patterns.is_empty() {
            self.patterns = vec!["*".to_string()];
        }
        self
    }

    /// 收集所有匹配的文件（按路径字典序）
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        if !self.input.is_dir() {
            return Err(XrdError::DirectoryNotFound {
                path: self.input.display().to_string(),
            });
        }

        let patterns = self
            .patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p).map_err(|e| {
                    XrdError::InvalidArgument(format!("Invalid pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // 帧文件只在扫描目录顶层
        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .map(|name| patterns.iter().any(|p| p.matches(name)))
                    .unwrap_or(false)
            })
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        Ok(files)
    }

    /// 收集文件并按文件名嵌入编号升序排列
    pub fn collect_by_index(&self) -> Result<Vec<PathBuf>> {
        let files = self.collect()?;

        let mut indexed = files
            .into_iter()
            .map(|path| frame_index(&path).map(|index| (index, path)))
            .collect::<Result<Vec<_>>>()?;

        indexed.sort();
        Ok(indexed.into_iter().map(|(_, path)| path).collect())
    }
}

/// 提取文件名（不含扩展名）中的全部数字作为帧编号
///
/// 没有数字或数字串超出 `u64` 时报 `ConfigError`。
pub fn frame_index(path: &Path) -> Result<u64> {
    let config_error = |reason: String| XrdError::ConfigError {
        path: path.display().to_string(),
        reason,
    };

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    let digits: String = stem.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Err(config_error("file name carries no frame number".to_string()));
    }
    digits
        .parse()
        .map_err(|_| config_error(format!("frame number {} is out of range", digits)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_frame_index() {
        assert_eq!(frame_index(Path::new("/data/Frame0007.dat")).unwrap(), 7);
        assert_eq!(frame_index(Path::new("frame12.dat")).unwrap(), 12);
        assert!(matches!(
            frame_index(Path::new("Frame.dat")),
            Err(XrdError::ConfigError { .. })
        ));
    }

    #[test]
    fn test_frame_index_overflow_is_reported() {
        match frame_index(Path::new("Frame12345678901234567890.dat")) {
            Err(XrdError::ConfigError { path, reason }) => {
                assert!(path.ends_with("Frame12345678901234567890.dat"));
                assert!(reason.contains("out of range"));
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_overflowing_frame_name_fails_collection() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Frame1.dat"), "0 1\n").unwrap();
        fs::write(dir.path().join("Frame99999999999999999999.dat"), "0 1\n").unwrap();

        let result = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("Frame*.dat")
            .collect_by_index();
        assert!(matches!(result, Err(XrdError::ConfigError { .. })));
    }

    #[test]
    fn test_collect_by_index_ignores_case_and_padding() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Frame10.dat", "frame2.dat", "Frame001.dat", "notes.txt"] {
            fs::write(dir.path().join(name), "0 1\n").unwrap();
        }

        let files = FileCollector::new(dir.path().to_path_buf())
            .with_pattern("[Ff]rame*.dat")
            .collect_by_index()
            .unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Frame001.dat", "frame2.dat", "Frame10.dat"]);
    }

    #[test]
    fn test_missing_directory() {
        let result = FileCollector::new(PathBuf::from("/nonexistent/scan")).collect();
        assert!(matches!(result, Err(XrdError::DirectoryNotFound { .. })));
    }
}
