//! # 扫描几何与扫描顺序
//!
//! 描述二维栅格扫描的像素网格尺寸，以及蛇形扫描时文件顺序与行方向的约定。
//!
//! ## 依赖关系
//! - 被 `parsers/parameters.rs` 构建
//! - 被 `xrd/builder.rs`, `xrd/store.rs` 使用

use serde::{Deserialize, Serialize};

/// 扫描网格尺寸
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanGeometry {
    /// 快扫描轴像素数（列数）
    pub width: usize,
    /// 慢扫描轴像素数（行数）
    pub height: usize,
}

impl ScanGeometry {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// 像素总数，应等于读入的谱文件数
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

impl std::fmt::Display for ScanGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// 按文件编号排序后的文件序列如何映射到展平索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileOrder {
    /// 编号最小的文件为展平索引 0
    Ascending,
    /// 编号最大（最后采集）的文件为展平索引 0
    #[default]
    Descending,
}

/// 行内像素方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowOrder {
    /// 所有行保持读入顺序
    Raster,
    /// 奇数行（0 起）列顺序反转
    #[default]
    Serpentine,
}

/// 蛇形扫描顺序约定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanOrder {
    pub file_order: FileOrder,
    pub row_order: RowOrder,
}

impl ScanOrder {
    pub fn new(file_order: FileOrder, row_order: RowOrder) -> Self {
        Self {
            file_order,
            row_order,
        }
    }

    /// 不做任何重排：文件顺序即行主序像素顺序
    pub fn raw() -> Self {
        Self::new(FileOrder::Ascending, RowOrder::Raster)
    }
}

impl std::fmt::Display for ScanOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let files = match self.file_order {
            FileOrder::Ascending => "ascending",
            FileOrder::Descending => "descending",
        };
        let rows = match self.row_order {
            RowOrder::Raster => "raster",
            RowOrder::Serpentine => "serpentine",
        };
        write!(f, "files {}, rows {}", files, rows)
    }
}
