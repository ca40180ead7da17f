//! # 感兴趣区域 (ROI) 聚合
//!
//! 将立方体按空间矩形归约为一维谱，或按通道范围归约为二维图像。
//!
//! ## 矩形吸附
//! - 边界取整：`x0 = round(x)`, `x1 = round(x + width)`，y 同理
//! - 裁剪到 `[0, W]` / `[0, H]`
//! - 零宽度的边向网格内部扩展 1 像素（严格模式报 `DegenerateRegionError`）
//!
//! ## ROI 谱
//! - raw：矩形内空间求和（或每像素平均）
//! - baseline：基线立方体同样归约
//! - snip：聚合基线的 SNIP
//! - subtracted：raw - snip
//! - 归一化：四条曲线统一乘以 `1000 / max(raw)`
//!
//! ## 缓存
//! `RoiSet` 中每个 ROI 以 (数据集版本, 吸附后的矩形, 选项) 为键缓存自己的谱。
//!
//! ## 依赖关系
//! - 被 `commands/roi.rs`, `commands/image.rs`, `xrd/export.rs` 使用
//! - 使用 `xrd/baseline.rs` 的 SNIP
//! - 使用 `xrd/dataset.rs` 的 `ScanDataset`

use crate::error::{XrdError, Result};
use crate::models::ScanGeometry;
use crate::xrd::baseline::{self, DEFAULT_SNIP_WINDOW};
use crate::xrd::dataset::ScanDataset;

use ndarray::{s, Array2, Array3, Axis, Zip};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// 归一化目标最大值
pub const NORMALIZATION: f64 = 1000.0;

/// 启动时的默认 ROI
pub const DEFAULT_ROI: RoiRect = RoiRect {
    x: 32.0,
    y: 32.0,
    width: 12.0,
    height: 12.0,
};

/// 默认单色图像通道范围
pub const DEFAULT_MONO_RANGE: Range<usize> = 718..730;

/// 默认 RGB 图像通道范围
pub const DEFAULT_RGB_RANGES: [Range<usize>; 3] = [445..457, 720..732, 1134..1146];

/// 像素坐标系中的浮点矩形
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 吸附到扫描网格后的半开区间 `[row0, row1) × [col0, col1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub row0: usize,
    pub row1: usize,
    pub col0: usize,
    pub col1: usize,
}

impl PixelRect {
    pub fn rows(&self) -> Range<usize> {
        self.row0..self.row1
    }

    pub fn cols(&self) -> Range<usize> {
        self.col0..self.col1
    }

    pub fn pixel_count(&self) -> usize {
        (self.row1 - self.row0) * (self.col1 - self.col0)
    }
}

impl fmt::Display for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows {}..{}, cols {}..{}",
            self.row0, self.row1, self.col0, self.col1
        )
    }
}

impl RoiRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 取整并裁剪后的边界，不处理退化
    fn bounds(&self, geometry: ScanGeometry) -> (usize, usize, usize, usize) {
        let axis = |start: f64, extent: f64, limit: usize| {
            let a = start.round().clamp(0.0, limit as f64) as usize;
            let b = (start + extent).round().clamp(0.0, limit as f64) as usize;
            (a.min(b), a.max(b))
        };
        let (col0, col1) = axis(self.x, self.width, geometry.width);
        let (row0, row1) = axis(self.y, self.height, geometry.height);
        (row0, row1, col0, col1)
    }

    /// 严格吸附：任一边长度为 0 时报错
    pub fn try_snap(&self, geometry: ScanGeometry) -> Result<PixelRect> {
        let (row0, row1, col0, col1) = self.bounds(geometry);
        if row0 == row1 || col0 == col1 {
            return Err(XrdError::DegenerateRegionError {
                rect: self.to_string(),
            });
        }
        Ok(PixelRect {
            row0,
            row1,
            col0,
            col1,
        })
    }

    /// 宽松吸附：零长度的边向网格内部扩展 1 像素
    pub fn snap(&self, geometry: ScanGeometry) -> PixelRect {
        match self.try_snap(geometry) {
            Ok(pixels) => pixels,
            Err(e) => {
                log::warn!("{}; expanding to one pixel", e);
                let (row0, row1) = {
                    let (a, b, _, _) = self.bounds(geometry);
                    expand(a, b, geometry.height)
                };
                let (col0, col1) = {
                    let (_, _, a, b) = self.bounds(geometry);
                    expand(a, b, geometry.width)
                };
                PixelRect {
                    row0,
                    row1,
                    col0,
                    col1,
                }
            }
        }
    }
}

fn expand(start: usize, end: usize, limit: usize) -> (usize, usize) {
    if start < end {
        (start, end)
    } else if end < limit {
        (start, end + 1)
    } else {
        (start.saturating_sub(1), end)
    }
}

impl fmt::Display for RoiRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x, self.y, self.width, self.height)
    }
}

impl FromStr for RoiRect {
    type Err = XrdError;

    /// 解析 `x,y,width,height`
    fn from_str(s: &str) -> Result<Self> {
        let values: Vec<f64> = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| XrdError::InvalidArgument(format!("invalid ROI '{}'", s)))?;

        match values.as_slice() {
            &[x, y, width, height] => Ok(Self::new(x, y, width, height)),
            _ => Err(XrdError::InvalidArgument(format!(
                "ROI '{}' must be x,y,width,height",
                s
            ))),
        }
    }
}

/// 聚合选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoiOptions {
    /// 归一化到最大值 1000
    pub normalize: bool,
    /// 每像素平均而非求和
    pub mean: bool,
    /// SNIP 窗口
    pub snip_m: usize,
}

impl Default for RoiOptions {
    fn default() -> Self {
        Self {
            normalize: false,
            mean: false,
            snip_m: DEFAULT_SNIP_WINDOW,
        }
    }
}

/// 单个 ROI 的四条谱
#[derive(Debug, Clone, PartialEq)]
pub struct RoiSpectrum {
    pub raw: Vec<f64>,
    pub baseline: Vec<f64>,
    pub snip: Vec<f64>,
    pub subtracted: Vec<f64>,
}

impl RoiSpectrum {
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

fn reduce_region(cube: &Array3<f64>, pixels: PixelRect, mean: bool) -> Vec<f64> {
    let region = cube.slice(s![pixels.rows(), pixels.cols(), ..]);
    let summed = region.sum_axis(Axis(0)).sum_axis(Axis(0));
    let scale = if mean {
        1.0 / pixels.pixel_count().max(1) as f64
    } else {
        1.0
    };
    summed.iter().map(|v| v * scale).collect()
}

/// 对已吸附的矩形聚合谱
///
/// 归一化时 raw、baseline、snip 三条曲线使用同一系数 `1000 / max(raw)`，
/// 与只缩放 raw 的旧版显示不同；这样 `subtracted = raw - snip` 在缩放前后一致。
pub fn aggregate(
    cube: &Array3<f64>,
    baseline_cube: &Array3<f64>,
    pixels: PixelRect,
    options: &RoiOptions,
) -> Result<RoiSpectrum> {
    if cube.dim() != baseline_cube.dim() {
        return Err(XrdError::ShapeMismatch {
            expected: cube.shape().to_vec(),
            found: baseline_cube.shape().to_vec(),
        });
    }
    let (height, width, _) = cube.dim();
    if pixels.row1 > height || pixels.col1 > width || pixels.pixel_count() == 0 {
        return Err(XrdError::DegenerateRegionError {
            rect: pixels.to_string(),
        });
    }

    let mut raw = reduce_region(cube, pixels, options.mean);
    let mut base = reduce_region(baseline_cube, pixels, options.mean);
    let mut snip = baseline::snip(&base, options.snip_m);

    if options.normalize {
        let peak = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if peak > 0.0 {
            let factor = NORMALIZATION / peak;
            for curve in [&mut raw, &mut base, &mut snip] {
                curve.iter_mut().for_each(|v| *v *= factor);
            }
        }
    }

    let subtracted = raw.iter().zip(&snip).map(|(r, s)| r - s).collect();

    Ok(RoiSpectrum {
        raw,
        baseline: base,
        snip,
        subtracted,
    })
}

/// 对数据集按浮点矩形聚合（宽松吸附）
pub fn aggregate_roi(
    dataset: &ScanDataset,
    rect: &RoiRect,
    options: &RoiOptions,
) -> Result<RoiSpectrum> {
    let pixels = rect.snap(dataset.geometry());
    aggregate(dataset.aligned(), dataset.baseline(), pixels, options)
}

/// 通道范围 `[left, right)` 积分后缩放到 0..=255
pub fn project(cube: &Array3<f64>, left: usize, right: usize) -> Array2<u8> {
    let (height, width, n_channels) = cube.dim();
    let right = right.min(n_channels);
    let left = left.min(right);

    let summed = cube.slice(s![.., .., left..right]).sum_axis(Axis(2));
    let peak = summed.iter().copied().fold(0.0_f64, f64::max);
    if peak <= 0.0 {
        return Array2::zeros((height, width));
    }
    summed.mapv(|v| (v / peak * 255.0).floor().clamp(0.0, 255.0) as u8)
}

pub fn project_channel_range(cube: &Array3<f64>, range: Range<usize>) -> Array2<u8> {
    project(cube, range.start, range.end)
}

/// 三个通道范围分别投影后叠成 `(H, W, 3)`
pub fn project_rgb(cube: &Array3<f64>, ranges: &[Range<usize>; 3]) -> Array3<u8> {
    let (height, width, _) = cube.dim();
    let mut image = Array3::<u8>::zeros((height, width, 3));
    for (k, range) in ranges.iter().enumerate() {
        image
            .index_axis_mut(Axis(2), k)
            .assign(&project_channel_range(cube, range.clone()));
    }
    image
}

/// 全通道积分强度图
pub fn integrated_image(cube: &Array3<f64>) -> Array2<u8> {
    project(cube, 0, cube.len_of(Axis(2)))
}

/// 全部像素的平均谱
pub fn mean_spectrum(cube: &Array3<f64>) -> Vec<f64> {
    let (height, width, n_channels) = cube.dim();
    if height * width == 0 {
        return vec![0.0; n_channels];
    }
    cube.sum_axis(Axis(0))
        .sum_axis(Axis(0))
        .iter()
        .map(|v| v / (height * width) as f64)
        .collect()
}

/// 全图平均谱及其 SNIP 扣除版本，两条曲线各自减去最小值
#[derive(Debug, Clone, PartialEq)]
pub struct FullSpectrum {
    /// `mean - min(mean)`
    pub mean: Vec<f64>,
    /// 逐像素扣除 SNIP 基线后的平均谱，同样平移到最小值为 0
    pub subtracted: Vec<f64>,
}

impl FullSpectrum {
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }
}

fn offset_to_zero(mut values: Vec<f64>) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    if min.is_finite() {
        values.iter_mut().for_each(|v| *v -= min);
    }
    values
}

/// 全图强度谱：平均谱与逐像素 SNIP 扣除后的平均谱
pub fn full_spectrum(cube: &Array3<f64>, snip_m: usize) -> FullSpectrum {
    let mut residual = Array3::<f64>::zeros(cube.dim());
    Zip::from(residual.lanes_mut(Axis(2)))
        .and(cube.lanes(Axis(2)))
        .par_for_each(|mut target, source| {
            let spectrum = source.to_vec();
            let clipped = baseline::snip(&spectrum, snip_m);
            for ((t, s), b) in target.iter_mut().zip(&spectrum).zip(&clipped) {
                *t = s - b;
            }
        });

    FullSpectrum {
        mean: offset_to_zero(mean_spectrum(cube)),
        subtracted: offset_to_zero(mean_spectrum(&residual)),
    }
}

/// 截取图像的矩形区域
pub fn crop<T: Clone>(image: &Array2<T>, pixels: PixelRect) -> Array2<T> {
    image.slice(s![pixels.rows(), pixels.cols()]).to_owned()
}

/// ROI 编号
pub type RoiId = usize;

#[derive(Debug, Clone)]
struct CacheEntry {
    revision: u64,
    pixels: PixelRect,
    options: RoiOptions,
    spectrum: RoiSpectrum,
}

/// 单个 ROI
#[derive(Debug, Clone)]
pub struct Roi {
    id: RoiId,
    rect: RoiRect,
    cache: Option<CacheEntry>,
}

impl Roi {
    pub fn id(&self) -> RoiId {
        self.id
    }

    pub fn rect(&self) -> RoiRect {
        self.rect
    }

    /// 缓存是否对当前数据集与选项有效
    pub fn is_cached_for(&self, dataset: &ScanDataset, options: &RoiOptions) -> bool {
        let pixels = self.rect.snap(dataset.geometry());
        self.cache.as_ref().is_some_and(|entry| {
            entry.revision == dataset.revision()
                && entry.pixels == pixels
                && entry.options == *options
        })
    }

    /// 取谱，缓存失效时重新聚合
    pub fn spectrum(&mut self, dataset: &ScanDataset, options: &RoiOptions) -> Result<RoiSpectrum> {
        if self.is_cached_for(dataset, options) {
            if let Some(entry) = &self.cache {
                return Ok(entry.spectrum.clone());
            }
        }

        let pixels = self.rect.snap(dataset.geometry());
        let spectrum = aggregate(dataset.aligned(), dataset.baseline(), pixels, options)?;
        log::debug!("roi {} aggregated over {}", self.id, pixels);

        self.cache = Some(CacheEntry {
            revision: dataset.revision(),
            pixels,
            options: *options,
            spectrum: spectrum.clone(),
        });
        Ok(spectrum)
    }
}

/// 会话持有的 ROI 集合
#[derive(Debug, Clone, Default)]
pub struct RoiSet {
    rois: Vec<Roi>,
    next_id: RoiId,
}

impl RoiSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 含默认 ROI 的集合
    pub fn with_default() -> Self {
        let mut set = Self::new();
        set.add(DEFAULT_ROI);
        set
    }

    pub fn add(&mut self, rect: RoiRect) -> RoiId {
        let id = self.next_id;
        self.next_id += 1;
        self.rois.push(Roi {
            id,
            rect,
            cache: None,
        });
        id
    }

    pub fn remove(&mut self, id: RoiId) -> bool {
        let before = self.rois.len();
        self.rois.retain(|roi| roi.id != id);
        self.rois.len() != before
    }

    pub fn set_rect(&mut self, id: RoiId, rect: RoiRect) -> bool {
        match self.rois.iter_mut().find(|roi| roi.id == id) {
            Some(roi) => {
                roi.rect = rect;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: RoiId) -> Option<&Roi> {
        self.rois.iter().find(|roi| roi.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Roi> {
        self.rois.iter()
    }

    pub fn len(&self) -> usize {
        self.rois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rois.is_empty()
    }

    /// 全部 ROI 的谱，按添加顺序
    pub fn spectra(
        &mut self,
        dataset: &ScanDataset,
        options: &RoiOptions,
    ) -> Result<Vec<(RoiId, RoiSpectrum)>> {
        self.rois
            .iter_mut()
            .map(|roi| Ok((roi.id, roi.spectrum(dataset, options)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x2x10 场景：通道 5 每像素 10，像素 (0,0) 额外 100
    fn scenario() -> Array3<f64> {
        let mut cube = Array3::<f64>::zeros((2, 2, 10));
        for r in 0..2 {
            for c in 0..2 {
                cube[[r, c, 5]] = 10.0;
            }
        }
        cube[[0, 0, 5]] += 100.0;
        cube
    }

    fn ramp_cube(height: usize, width: usize, channels: usize) -> Array3<f64> {
        Array3::from_shape_fn((height, width, channels), |(r, c, k)| {
            (r * 100 + c * 10 + k) as f64
        })
    }

    fn dataset(cube: Array3<f64>) -> ScanDataset {
        let (height, width, _) = cube.dim();
        let baseline = Array3::zeros(cube.dim());
        ScanDataset::new(ScanGeometry::new(width, height), cube, baseline, None).unwrap()
    }

    #[test]
    fn test_snap_rounds_and_clamps() {
        let geometry = ScanGeometry::new(10, 8);
        let pixels = RoiRect::new(1.4, 2.6, 3.2, 10.0).try_snap(geometry).unwrap();
        assert_eq!(
            pixels,
            PixelRect {
                row0: 3,
                row1: 8,
                col0: 1,
                col1: 5
            }
        );
    }

    #[test]
    fn test_degenerate_rect() {
        let geometry = ScanGeometry::new(4, 4);
        let rect = RoiRect::new(10.0, 10.0, 5.0, 5.0);
        assert!(matches!(
            rect.try_snap(geometry),
            Err(XrdError::DegenerateRegionError { .. })
        ));
        let pixels = rect.snap(geometry);
        assert_eq!(pixels.pixel_count(), 1);
        assert_eq!((pixels.row0, pixels.col0), (3, 3));

        let zero_width = RoiRect::new(1.0, 1.0, 0.0, 2.0).snap(geometry);
        assert_eq!(zero_width.cols(), 1..2);
        assert_eq!(zero_width.rows(), 1..3);
    }

    #[test]
    fn test_parse_rect() {
        let rect: RoiRect = "32, 32,12,12".parse().unwrap();
        assert_eq!(rect, DEFAULT_ROI);
        assert!("1,2,3".parse::<RoiRect>().is_err());
        assert!("a,b,c,d".parse::<RoiRect>().is_err());
    }

    #[test]
    fn test_full_rect_equals_total_sum() {
        let cube = ramp_cube(3, 4, 6);
        let data = dataset(cube.clone());
        let spectrum = aggregate_roi(&data, &RoiRect::new(0.0, 0.0, 4.0, 3.0), &RoiOptions::default()).unwrap();
        for k in 0..6 {
            let expected: f64 = cube.index_axis(Axis(2), k).sum();
            assert_eq!(spectrum.raw[k], expected);
        }
    }

    #[test]
    fn test_single_pixel_rect() {
        let cube = ramp_cube(3, 4, 6);
        let data = dataset(cube.clone());
        let spectrum = aggregate_roi(&data, &RoiRect::new(2.0, 1.0, 1.0, 1.0), &RoiOptions::default()).unwrap();
        let expected: Vec<f64> = cube.slice(s![1, 2, ..]).to_vec();
        assert_eq!(spectrum.raw, expected);
    }

    #[test]
    fn test_scenario_sum_and_mean() {
        let data = dataset(scenario());
        let full = RoiRect::new(0.0, 0.0, 2.0, 2.0);

        let summed = aggregate_roi(&data, &full, &RoiOptions::default()).unwrap();
        assert_eq!(summed.raw[5], 140.0);
        assert_eq!(summed.subtracted[5], 140.0);

        let options = RoiOptions {
            mean: true,
            ..Default::default()
        };
        let mean = aggregate_roi(&data, &full, &options).unwrap();
        assert_eq!(mean.raw[5], 35.0);
    }

    #[test]
    fn test_normalization_scales_all_curves() {
        let mut cube = scenario();
        cube.mapv_inplace(|v| v + 1.0);
        let baseline = Array3::from_elem(cube.dim(), 1.0);
        let options = RoiOptions {
            normalize: true,
            ..Default::default()
        };
        let pixels = RoiRect::new(0.0, 0.0, 2.0, 2.0).snap(ScanGeometry::new(2, 2));
        let spectrum = aggregate(&cube, &baseline, pixels, &options).unwrap();

        assert!((spectrum.raw[5] - NORMALIZATION).abs() < 1e-9);
        let factor = NORMALIZATION / 144.0;
        assert!((spectrum.baseline[0] - 4.0 * factor).abs() < 1e-9);
        assert!((spectrum.subtracted[0] - (4.0 - 4.0) * factor).abs() < 1e-9);
    }

    #[test]
    fn test_normalization_skipped_for_zero_signal() {
        let cube = Array3::<f64>::zeros((2, 2, 5));
        let options = RoiOptions {
            normalize: true,
            ..Default::default()
        };
        let pixels = RoiRect::new(0.0, 0.0, 2.0, 2.0).snap(ScanGeometry::new(2, 2));
        let spectrum = aggregate(&cube, &cube, pixels, &options).unwrap();
        assert!(spectrum.raw.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_projection() {
        let image = project_channel_range(&scenario(), 5..6);
        assert_eq!(image[[0, 0]], 255);
        assert_eq!(image[[1, 1]], (10.0_f64 / 110.0 * 255.0).floor() as u8);

        let zero = project_channel_range(&Array3::zeros((3, 2, 4)), 0..4);
        assert_eq!(zero.dim(), (3, 2));
        assert!(zero.iter().all(|v| *v == 0));

        // 超出通道轴的范围被裁剪
        let clipped = project(&scenario(), 8, 50);
        assert!(clipped.iter().all(|v| *v == 0));
    }

    #[test]
    fn test_rgb_and_integrated_image() {
        let cube = scenario();
        let rgb = project_rgb(&cube, &[0..5, 5..6, 6..10]);
        assert_eq!(rgb.dim(), (2, 2, 3));
        assert_eq!(rgb[[0, 0, 1]], 255);
        assert_eq!(rgb[[0, 0, 0]], 0);
        assert_eq!(integrated_image(&cube), project(&cube, 5, 6));
    }

    #[test]
    fn test_full_spectrum() {
        // 每像素：平坦背景 5，通道 5 处一个峰
        let mut cube = Array3::from_elem((2, 2, 12), 5.0);
        for r in 0..2 {
            for c in 0..2 {
                cube[[r, c, 5]] = 5.0 + 10.0 * (r * 2 + c + 1) as f64;
            }
        }

        let full = full_spectrum(&cube, 4);
        assert_eq!(full.len(), 12);
        assert_eq!(full.mean[0], 0.0);
        assert_eq!(full.mean[5], 25.0);

        // SNIP 削掉峰下的背景，扣除后只剩峰高
        assert_eq!(full.subtracted[0], 0.0);
        assert!((full.subtracted[5] - 25.0).abs() < 1e-9);
        assert!(full.subtracted.iter().all(|v| *v >= 0.0));
    }

    #[test]
    fn test_full_spectrum_of_empty_scan() {
        let full = full_spectrum(&Array3::zeros((0, 0, 4)), 24);
        assert_eq!(full.mean, vec![0.0; 4]);
        assert_eq!(full.subtracted, vec![0.0; 4]);
    }

    #[test]
    fn test_mean_spectrum_and_crop() {
        let cube = scenario();
        assert_eq!(mean_spectrum(&cube)[5], 35.0);

        let image = Array2::from_shape_fn((4, 5), |(r, c)| r * 5 + c);
        let pixels = RoiRect::new(1.0, 2.0, 3.0, 2.0).snap(ScanGeometry::new(5, 4));
        let cropped = crop(&image, pixels);
        assert_eq!(cropped.dim(), (2, 3));
        assert_eq!(cropped[[0, 0]], 11);
    }

    #[test]
    fn test_roi_cache_follows_rect_and_options() {
        let data = dataset(ramp_cube(4, 4, 8));
        let mut set = RoiSet::new();
        let id = set.add(RoiRect::new(0.0, 0.0, 2.0, 2.0));
        let options = RoiOptions::default();

        assert!(!set.get(id).unwrap().is_cached_for(&data, &options));
        let first = set.spectra(&data, &options).unwrap();
        assert!(set.get(id).unwrap().is_cached_for(&data, &options));

        let mean = RoiOptions {
            mean: true,
            ..options
        };
        assert!(!set.get(id).unwrap().is_cached_for(&data, &mean));

        assert!(set.set_rect(id, RoiRect::new(1.0, 1.0, 2.0, 2.0)));
        assert!(!set.get(id).unwrap().is_cached_for(&data, &options));
        let second = set.spectra(&data, &options).unwrap();
        assert_ne!(first[0].1, second[0].1);
    }

    #[test]
    fn test_roi_cache_invalidated_by_new_dataset() {
        let cube = ramp_cube(3, 3, 5);
        let first = dataset(cube.clone());
        let second = dataset(cube);
        let mut set = RoiSet::with_default();
        let options = RoiOptions::default();

        set.spectra(&first, &options).unwrap();
        let roi = set.iter().next().unwrap();
        assert!(roi.is_cached_for(&first, &options));
        assert!(!roi.is_cached_for(&second, &options));
    }

    #[test]
    fn test_remove_keeps_other_caches() {
        let data = dataset(ramp_cube(4, 4, 8));
        let mut set = RoiSet::new();
        let a = set.add(RoiRect::new(0.0, 0.0, 2.0, 2.0));
        let b = set.add(RoiRect::new(2.0, 2.0, 2.0, 2.0));
        let options = RoiOptions::default();
        let before = set.spectra(&data, &options).unwrap();

        assert!(set.remove(a));
        assert!(!set.remove(a));
        assert_eq!(set.len(), 1);
        assert!(set.get(b).unwrap().is_cached_for(&data, &options));

        let after = set.spectra(&data, &options).unwrap();
        assert_eq!(after, vec![before[1].clone()]);
    }
}
