//! # 统一错误处理模块
//!
//! 定义 xrdscan 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误传播策略
//! - 数据读取与峰对齐错误：直接向上传播，调用方不得产出数据集
//! - 标定错误：由 `CalibrationModel::from_file_or_identity` 降级为恒等标定
//! - ROI 退化矩形：聚合时自动扩展为 1 像素
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// xrdscan 统一错误类型
#[derive(Error, Debug)]
pub enum XrdError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 输入数据完整性
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid scan configuration in {path}\nReason: {reason}")]
    ConfigError { path: String, reason: String },

    #[error("Expected {expected} spectrum files in {dir}, found {found}")]
    MissingFileError {
        dir: String,
        expected: usize,
        found: usize,
    },

    #[error("Malformed row in {path} at line {line}: '{content}'")]
    MalformedRowError {
        path: String,
        line: usize,
        content: String,
    },

    #[error("Spectrum {path} has {found} channels, expected {expected}")]
    InconsistentChannels {
        path: String,
        expected: usize,
        found: usize,
    },

    #[error("Spectrum file contains no data: {path}")]
    EmptySpectrum { path: String },

    // ─────────────────────────────────────────────────────────────
    // 数值处理错误
    // ─────────────────────────────────────────────────────────────
    #[error(
        "Alignment window {channel}±{half_window} does not fit into {n_channels} channels"
    )]
    ChannelRangeError {
        channel: usize,
        half_window: usize,
        n_channels: usize,
    },

    #[error("Shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("Calibration needs at least 3 reference points, found {found}")]
    InsufficientPointsError { found: usize },

    #[error("Calibration fit is singular: {reason}")]
    SingularFitError { reason: String },

    #[error("Region {rect} has zero extent on the scan grid")]
    DegenerateRegionError { rect: String },

    // ─────────────────────────────────────────────────────────────
    // 数据集存取
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to encode dataset {path}: {reason}")]
    EncodeError { path: String, reason: String },

    #[error("Failed to decode dataset {path}: {reason}")]
    DecodeError { path: String, reason: String },

    #[error("Not an xrdscan dataset file: {path}")]
    InvalidDatasetFile { path: String },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 导出错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Plot rendering failed: {0}")]
    PlotError(String),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, XrdError>;
