//! # 扫描数据立方体构建
//!
//! 从单像素谱文件目录与扫描参数文件重建 `[row, col, channel]` 三维立方体。
//!
//! ## 流程
//! 1. 读取扫描参数 → `ScanGeometry`
//! 2. 收集 `[Ff]rame*.dat`，按文件名编号升序排列
//! 3. 并行读取各谱文件（rayon），校验文件数与通道数
//! 4. 按 `ScanOrder` 决定是否整体反转文件序列、是否反转奇数行
//! 5. 行主序填充为 `(height, width, n_channels)`
//!
//! ## 依赖关系
//! - 被 `commands/build.rs` 调用
//! - 使用 `parsers/` 读取参数与谱文件
//! - 使用 `batch/collector.rs` 收集文件

use crate::batch::FileCollector;
use crate::error::{XrdError, Result};
use crate::models::{FileOrder, RowOrder, ScanGeometry, ScanOrder};
use crate::parsers;

use ndarray::{s, Array3, Axis};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// 默认扫描参数文件名
pub const DEFAULT_PARAMETERS_FILE: &str = "Scanning_Parameters.txt";

/// 默认谱文件匹配模式
pub const DEFAULT_FRAME_PATTERN: &str = "[Ff]rame*.dat";

/// 原始扫描数据
#[derive(Debug, Clone)]
pub struct RawScan {
    pub geometry: ScanGeometry,
    pub cube: Array3<f64>,
}

impl RawScan {
    pub fn n_channels(&self) -> usize {
        self.cube.len_of(Axis(2))
    }

    /// 应用行错位补偿，几何宽度随之增加
    pub fn with_row_shift(self, n: isize) -> Self {
        if n == 0 {
            return self;
        }
        let cube = shift_rows(&self.cube, n);
        let geometry = ScanGeometry::new(cube.len_of(Axis(1)), self.geometry.height);
        Self { geometry, cube }
    }
}

/// 立方体构建器
#[derive(Debug, Clone)]
pub struct ScanCubeBuilder {
    /// 谱文件所在目录
    dir: PathBuf,
    /// 扫描参数文件（相对于 `dir` 或绝对路径）
    parameters: PathBuf,
    /// 谱文件匹配模式
    pattern: String,
    /// 蛇形扫描顺序约定
    order: ScanOrder,
}

impl ScanCubeBuilder {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            parameters: PathBuf::from(DEFAULT_PARAMETERS_FILE),
            pattern: DEFAULT_FRAME_PATTERN.to_string(),
            order: ScanOrder::default(),
        }
    }

    pub fn with_parameters(mut self, parameters: impl Into<PathBuf>) -> Self {
        self.parameters = parameters.into();
        self
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = pattern.to_string();
        self
    }

    pub fn with_order(mut self, order: ScanOrder) -> Self {
        self.order = order;
        self
    }

    /// 扫描参数文件的实际路径
    pub fn parameters_path(&self) -> PathBuf {
        if self.parameters.is_absolute() {
            self.parameters.clone()
        } else {
            self.dir.join(&self.parameters)
        }
    }

    /// 读取全部源文件并构建立方体
    pub fn build(&self) -> Result<RawScan> {
        let params = parsers::parse_parameters_file(&self.parameters_path())?;
        let geometry = params.geometry()?;
        log::info!("scan geometry {} from {}", geometry, self.parameters_path().display());

        let files = FileCollector::new(self.dir.clone())
            .with_pattern(&self.pattern)
            .collect_by_index()?;

        if files.len() != geometry.pixel_count() {
            return Err(XrdError::MissingFileError {
                dir: self.dir.display().to_string(),
                expected: geometry.pixel_count(),
                found: files.len(),
            });
        }

        log::info!("reading {} spectrum files", files.len());
        let spectra = read_spectra(&files)?;
        let cube = assemble_cube(spectra, geometry, self.order)?;
        log::debug!("raw cube shape {:?} ({})", cube.shape(), self.order);

        Ok(RawScan { geometry, cube })
    }
}

/// 并行读取谱文件，保持输入顺序并校验通道数一致
fn read_spectra(files: &[PathBuf]) -> Result<Vec<Vec<f64>>> {
    let spectra = files
        .par_iter()
        .map(|path| parsers::parse_spectrum_file(path))
        .collect::<Result<Vec<_>>>()?;

    if let Some(first) = spectra.first() {
        let expected = first.len();
        for (path, spectrum) in files.iter().zip(&spectra) {
            if spectrum.len() != expected {
                return Err(XrdError::InconsistentChannels {
                    path: path.display().to_string(),
                    expected,
                    found: spectrum.len(),
                });
            }
        }
    }

    Ok(spectra)
}

/// 将按帧编号排好序的谱序列装配为立方体
pub fn assemble_cube(
    mut spectra: Vec<Vec<f64>>,
    geometry: ScanGeometry,
    order: ScanOrder,
) -> Result<Array3<f64>> {
    if spectra.len() != geometry.pixel_count() {
        return Err(XrdError::ShapeMismatch {
            expected: vec![geometry.pixel_count()],
            found: vec![spectra.len()],
        });
    }

    let n_channels = spectra.first().map(|s| s.len()).unwrap_or(0);

    if order.file_order == FileOrder::Descending {
        spectra.reverse();
    }

    let flat: Vec<f64> = spectra.into_iter().flatten().collect();
    let shape = (geometry.height, geometry.width, n_channels);
    let mut cube = Array3::from_shape_vec(shape, flat).map_err(|_| XrdError::ShapeMismatch {
        expected: vec![shape.0, shape.1, shape.2],
        found: vec![geometry.pixel_count()],
    })?;

    if order.row_order == RowOrder::Serpentine {
        for row in (1..geometry.height).step_by(2) {
            let reversed = cube.slice(s![row, ..;-1, ..]).to_owned();
            cube.index_axis_mut(Axis(0), row).assign(&reversed);
        }
    }

    Ok(cube)
}

/// 补偿蛇形扫描往返行之间的横向错位
///
/// `n > 0` 时奇数行右移 `n` 像素，`n < 0` 时偶数行右移 `|n|` 像素；
/// 宽度增加 `|n|`，空出的像素填 0。
pub fn shift_rows(cube: &Array3<f64>, n: isize) -> Array3<f64> {
    if n == 0 {
        return cube.clone();
    }

    let (height, width, channels) = cube.dim();
    let pad = n.unsigned_abs();
    let mut out = Array3::<f64>::zeros((height, width + pad, channels));

    for row in 0..height {
        let odd = row % 2 == 1;
        let shifted = (n > 0 && odd) || (n < 0 && !odd);
        let offset = if shifted { pad } else { 0 };
        out.slice_mut(s![row, offset..offset + width, ..])
            .assign(&cube.index_axis(Axis(0), row));
    }

    out
}

/// 从源目录构建原始立方体
pub fn build_from_source(dir: &Path, parameters: &Path, order: ScanOrder) -> Result<RawScan> {
    ScanCubeBuilder::new(dir)
        .with_parameters(parameters)
        .with_order(order)
        .build()
}
