//! # 图表生成
//!
//! 使用 `plotters` 库绘制 ROI 谱与扫描图像预览。
//!
//! ## 功能
//! - ROI 谱：每个 ROI 一种颜色，实线为 raw，淡色线为 SNIP 基线
//! - 全图强度谱：平均谱与 SNIP 扣除后的平均谱
//! - 横轴为标定角度（未标定时为通道号）
//! - 灰度 / RGB 扫描图像，按整数倍放大
//! - 谱图支持 PNG 和 SVG，图像仅 PNG
//!
//! ## 依赖关系
//! - 被 `commands/roi.rs`, `commands/image.rs` 调用
//! - 使用 `xrd/roi.rs` 的 `RoiSpectrum`
//! - 使用 `plotters` 渲染图表

use crate::error::{XrdError, Result};
use crate::xrd::calibration::CalibrationModel;
use crate::xrd::roi::{FullSpectrum, RoiId, RoiSpectrum};

use ndarray::{Array2, Array3};
use plotters::prelude::*;
use std::path::Path;

fn plot_error<E: std::fmt::Debug>(e: E) -> XrdError {
    XrdError::PlotError(format!("{:?}", e))
}

/// 图中的一条曲线
struct Series<'a> {
    /// 图例文字；`None` 表示不进图例
    label: Option<String>,
    values: &'a [f64],
    color: RGBAColor,
    width: u32,
}

/// 生成 ROI 谱图：每个 ROI 一种颜色，实线为 raw，淡色线为 SNIP 基线
pub fn generate_roi_plot(
    spectra: &[(RoiId, RoiSpectrum)],
    calibration: &CalibrationModel,
    output_path: &Path,
    title: &str,
    size: (u32, u32),
    use_svg: bool,
) -> Result<()> {
    let mut series = Vec::with_capacity(spectra.len() * 2);
    for (index, (id, spectrum)) in spectra.iter().enumerate() {
        let color = Palette99::pick(index).to_rgba();
        series.push(Series {
            label: Some(format!("ROI {}", id)),
            values: &spectrum.raw,
            color,
            width: 2,
        });
        series.push(Series {
            label: None,
            values: &spectrum.snip,
            color: color.mix(0.4),
            width: 1,
        });
    }
    render_chart(&series, calibration, output_path, title, size, use_svg)
}

/// 生成全图强度谱图：平均谱（红）与 SNIP 扣除后的平均谱（绿）
pub fn generate_full_plot(
    full: &FullSpectrum,
    calibration: &CalibrationModel,
    output_path: &Path,
    title: &str,
    size: (u32, u32),
    use_svg: bool,
) -> Result<()> {
    let series = [
        Series {
            label: Some("mean".to_string()),
            values: &full.mean,
            color: RGBColor(255, 166, 166).to_rgba(),
            width: 2,
        },
        Series {
            label: Some("mean - SNIP".to_string()),
            values: &full.subtracted,
            color: RGBColor(80, 190, 80).to_rgba(),
            width: 2,
        },
    ];
    render_chart(&series, calibration, output_path, title, size, use_svg)
}

fn render_chart(
    series: &[Series],
    calibration: &CalibrationModel,
    output_path: &Path,
    title: &str,
    size: (u32, u32),
    use_svg: bool,
) -> Result<()> {
    if use_svg {
        let root = SVGBackend::new(output_path, size).into_drawing_area();
        draw_chart(&root, series, calibration, title)?;
        root.present().map_err(plot_error)?;
    } else {
        let root = BitMapBackend::new(output_path, size).into_drawing_area();
        draw_chart(&root, series, calibration, title)?;
        root.present().map_err(plot_error)?;
    }
    Ok(())
}

/// 以标定角度（未标定时为通道号）为横轴绘制全部曲线
fn draw_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    series: &[Series],
    calibration: &CalibrationModel,
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_error)?;

    let n_channels = series.iter().map(|s| s.values.len()).max().unwrap_or(0);
    let axis: Vec<f64> = (0..n_channels)
        .map(|c| calibration.forward(c as f64))
        .collect();

    let (x_min, x_max) = match (axis.first(), axis.last()) {
        (Some(&a), Some(&b)) if a != b => (a.min(b), a.max(b)),
        _ => (0.0, 1.0),
    };
    let values = || series.iter().flat_map(|s| s.values.iter().copied());
    let y_max = values().fold(0.0_f64, f64::max);
    let y_min = values().fold(0.0_f64, f64::min);
    let y_max = if y_max > y_min { y_max * 1.05 } else { y_min + 1.0 };

    let x_desc = if calibration.is_calibrated() {
        "2θ (°)"
    } else {
        "Channel"
    };

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc("Intensity (counts)")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(plot_error)?;

    for line in series {
        let style = line.color.stroke_width(line.width);
        let drawn = chart
            .draw_series(LineSeries::new(
                axis.iter().copied().zip(line.values.iter().copied()),
                style,
            ))
            .map_err(plot_error)?;
        if let Some(label) = &line.label {
            drawn
                .label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
        }
    }

    if series.iter().any(|s| s.label.is_some()) {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(plot_error)?;
    }

    Ok(())
}

/// 生成灰度图像 PNG
pub fn generate_image_png(image: &Array2<u8>, output_path: &Path, scale: u32) -> Result<()> {
    let (height, width) = image.dim();
    draw_pixels(output_path, height, width, scale, |r, c| {
        let v = image[[r, c]];
        RGBColor(v, v, v)
    })
}

/// 生成 RGB 图像 PNG，输入形状 `(H, W, 3)`
pub fn generate_rgb_png(image: &Array3<u8>, output_path: &Path, scale: u32) -> Result<()> {
    let (height, width, depth) = image.dim();
    if depth != 3 {
        return Err(XrdError::ShapeMismatch {
            expected: vec![height, width, 3],
            found: image.shape().to_vec(),
        });
    }
    draw_pixels(output_path, height, width, scale, |r, c| {
        RGBColor(image[[r, c, 0]], image[[r, c, 1]], image[[r, c, 2]])
    })
}

fn draw_pixels<F>(output_path: &Path, height: usize, width: usize, scale: u32, color: F) -> Result<()>
where
    F: Fn(usize, usize) -> RGBColor,
{
    if height == 0 || width == 0 {
        return Err(XrdError::InvalidArgument("cannot render an empty image".to_string()));
    }
    let scale = scale.max(1);
    let size = (width as u32 * scale, height as u32 * scale);
    let root = BitMapBackend::new(output_path, size).into_drawing_area();
    root.fill(&BLACK).map_err(plot_error)?;

    for r in 0..height {
        for c in 0..width {
            let x0 = c as i32 * scale as i32;
            let y0 = r as i32 * scale as i32;
            root.draw(&Rectangle::new(
                [(x0, y0), (x0 + scale as i32, y0 + scale as i32)],
                color(r, c).filled(),
            ))
            .map_err(plot_error)?;
        }
    }

    root.present().map_err(plot_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn file_len(path: &Path) -> u64 {
        fs::metadata(path).map(|m| m.len()).unwrap_or(0)
    }

    fn roi_spectrum(peak: usize) -> RoiSpectrum {
        let raw: Vec<f64> = (0..64)
            .map(|c| 10.0 + if c == peak { 200.0 } else { 0.0 })
            .collect();
        let snip = vec![10.0; 64];
        let subtracted = raw.iter().zip(&snip).map(|(r, s)| r - s).collect();
        RoiSpectrum {
            raw,
            baseline: snip.clone(),
            snip,
            subtracted,
        }
    }

    #[test]
    fn test_gray_image_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");
        let image = Array2::from_shape_fn((3, 5), |(r, c)| (r * 50 + c * 10) as u8);
        generate_image_png(&image, &path, 4).unwrap();
        assert!(file_len(&path) > 0);
    }

    #[test]
    fn test_rgb_image_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.png");
        let image = Array3::from_shape_fn((4, 2, 3), |(r, c, k)| (r * 60 + c * 20 + k * 5) as u8);
        generate_rgb_png(&image, &path, 2).unwrap();
        assert!(file_len(&path) > 0);
    }

    #[test]
    fn test_roi_chart_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roi_spectra.png");
        let spectra = vec![(0, roi_spectrum(20)), (1, roi_spectrum(40))];
        generate_roi_plot(
            &spectra,
            &CalibrationModel::identity(64),
            &path,
            "ROI spectra",
            (640, 480),
            false,
        )
        .unwrap();
        assert!(file_len(&path) > 0);
    }

    #[test]
    fn test_full_chart_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full_spectrum.svg");
        let full = FullSpectrum {
            mean: (0..64).map(|c| (c % 7) as f64).collect(),
            subtracted: (0..64).map(|c| (c % 3) as f64).collect(),
        };
        generate_full_plot(
            &full,
            &CalibrationModel::identity(64),
            &path,
            "Full intensity",
            (640, 480),
            true,
        )
        .unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("<svg"));
    }

    #[test]
    fn test_empty_image_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let image = Array2::<u8>::zeros((0, 4));
        assert!(generate_image_png(&image, &dir.path().join("empty.png"), 4).is_err());
    }

    #[test]
    fn test_rgb_depth_checked() {
        let dir = tempfile::tempdir().unwrap();
        let image = Array3::<u8>::zeros((2, 2, 2));
        assert!(matches!(
            generate_rgb_png(&image, &dir.path().join("rgb.png"), 1),
            Err(XrdError::ShapeMismatch { .. })
        ));
    }
}
