//! # 数据导出
//!
//! 导出 ROI 谱、通道范围图像与逐像素标定谱文件。
//!
//! ## 支持格式
//! - ROI CSV: `channel, angle, raw, baseline, snip, subtracted`
//! - ROI XY: `# ` 注释头 + 两列 `"%.3f %.3f"`（角度或通道, 强度）
//! - 全图强度谱 CSV: `channel, angle, mean, subtracted`
//! - 图像 CSV: 每个扫描行一行，无表头
//! - 标定表 CSV: `channel, angle`
//! - 逐像素谱: `CFrame%04d.dat`，每行 `"%.4f %d"`（标定角度, 强度），
//!   按行主序像素编号，由 `BatchRunner` 并行写出
//!
//! ## 依赖关系
//! - 被 `commands/roi.rs`, `commands/image.rs`, `commands/calibrate.rs`, `commands/export.rs` 调用
//! - 使用 `xrd/roi.rs` 的 `RoiSpectrum`, `xrd/calibration.rs` 的标定轴
//! - 使用 `csv` 库写入 CSV 文件

use crate::batch::{BatchResult, BatchRunner, ProcessResult};
use crate::error::{XrdError, Result};
use crate::xrd::calibration::CalibrationModel;
use crate::xrd::dataset::ScanDataset;
use crate::xrd::roi::{FullSpectrum, RoiSpectrum};

use ndarray::{Array2, ArrayView1};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// ROI 谱中的一条曲线
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoiCurve {
    Raw,
    Baseline,
    Snip,
    #[default]
    Subtracted,
}

impl RoiCurve {
    pub fn values<'a>(&self, spectrum: &'a RoiSpectrum) -> &'a [f64] {
        match self {
            RoiCurve::Raw => &spectrum.raw,
            RoiCurve::Baseline => &spectrum.baseline,
            RoiCurve::Snip => &spectrum.snip,
            RoiCurve::Subtracted => &spectrum.subtracted,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RoiCurve::Raw => "raw",
            RoiCurve::Baseline => "baseline",
            RoiCurve::Snip => "snip",
            RoiCurve::Subtracted => "subtracted",
        }
    }
}

fn write_error(path: &Path) -> impl Fn(std::io::Error) -> XrdError + '_ {
    move |e| XrdError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    }
}

/// 导出 ROI 四条曲线为 CSV
pub fn roi_to_csv(
    spectrum: &RoiSpectrum,
    calibration: &CalibrationModel,
    output_path: &Path,
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record(["channel", "angle", "raw", "baseline", "snip", "subtracted"])?;

    for channel in 0..spectrum.len() {
        wtr.write_record(&[
            channel.to_string(),
            format!("{:.4}", calibration.forward(channel as f64)),
            format!("{:.4}", spectrum.raw[channel]),
            format!("{:.4}", spectrum.baseline[channel]),
            format!("{:.4}", spectrum.snip[channel]),
            format!("{:.4}", spectrum.subtracted[channel]),
        ])?;
    }

    wtr.flush().map_err(write_error(output_path))?;

    Ok(())
}

/// 导出 ROI 单条曲线为 XY 格式
///
/// 每行 `"{:.3} {:.3}"`。强度列保留三位小数而不是取整，
/// 平均模式与归一化后的值通常不是整数。
pub fn roi_to_xy(
    spectrum: &RoiSpectrum,
    curve: RoiCurve,
    calibration: &CalibrationModel,
    output_path: &Path,
) -> Result<()> {
    let file = File::create(output_path).map_err(write_error(output_path))?;
    let mut file = BufWriter::new(file);

    let x_name = if calibration.is_calibrated() {
        "angle"
    } else {
        "channel"
    };
    writeln!(file, "# Columns: {}, {}", x_name, curve.name()).map_err(write_error(output_path))?;

    for (channel, value) in curve.values(spectrum).iter().enumerate() {
        writeln!(file, "{:.3} {:.3}", calibration.forward(channel as f64), value)
            .map_err(write_error(output_path))?;
    }

    file.flush().map_err(write_error(output_path))?;
    Ok(())
}

/// 导出全图强度谱为 CSV
pub fn full_to_csv(
    full: &FullSpectrum,
    calibration: &CalibrationModel,
    output_path: &Path,
) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record(["channel", "angle", "mean", "subtracted"])?;
    for (channel, (mean, subtracted)) in full.mean.iter().zip(&full.subtracted).enumerate() {
        wtr.write_record(&[
            channel.to_string(),
            format!("{:.4}", calibration.forward(channel as f64)),
            format!("{:.4}", mean),
            format!("{:.4}", subtracted),
        ])?;
    }

    wtr.flush().map_err(write_error(output_path))?;
    Ok(())
}

/// 导出灰度图像为 CSV，每个扫描行一行
pub fn image_to_csv(image: &Array2<u8>, output_path: &Path) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(output_path)?;

    for row in image.rows() {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }

    wtr.flush().map_err(write_error(output_path))?;
    Ok(())
}

/// 导出完整标定表 `channel, angle`
pub fn calibration_to_csv(calibration: &CalibrationModel, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record(["channel", "angle"])?;
    for (channel, angle) in calibration.axis().iter().enumerate() {
        wtr.write_record(&[channel.to_string(), format!("{:.6}", angle)])?;
    }

    wtr.flush().map_err(write_error(output_path))?;
    Ok(())
}

/// 逐像素谱文件名
pub fn frame_file_name(index: usize) -> String {
    format!("CFrame{:04}.dat", index)
}

fn write_frame(path: &Path, axis: &[f64], spectrum: ArrayView1<f64>) -> Result<()> {
    let file = File::create(path).map_err(write_error(path))?;
    let mut file = BufWriter::new(file);
    for (angle, value) in axis.iter().zip(spectrum.iter()) {
        writeln!(file, "{:.4} {}", angle, *value as i64).map_err(write_error(path))?;
    }
    file.flush().map_err(write_error(path))?;
    Ok(())
}

/// 按标定轴并行写出全部像素的谱文件
pub fn write_frames(
    dataset: &ScanDataset,
    calibration: &CalibrationModel,
    output_dir: &Path,
    runner: &BatchRunner,
    overwrite: bool,
) -> Result<BatchResult> {
    fs::create_dir_all(output_dir).map_err(write_error(output_dir))?;

    let axis = calibration.axis();
    let cube = dataset.aligned();
    let (height, width, n_channels) = cube.dim();
    if axis.len() != n_channels {
        log::warn!(
            "calibration covers {} channels, dataset has {}",
            axis.len(),
            n_channels
        );
    }

    let items: Vec<(usize, PathBuf)> = (0..height * width)
        .map(|i| (i, output_dir.join(frame_file_name(i))))
        .collect();

    runner.run(items, |(index, path)| {
        let name = path.display().to_string();
        if path.exists() && !overwrite {
            return ProcessResult::Skipped(name);
        }
        let spectrum = cube.slice(ndarray::s![index / width, index % width, ..]);
        match write_frame(path, &axis, spectrum) {
            Ok(()) => ProcessResult::Success(name),
            Err(e) => ProcessResult::Failed(name, e.to_string()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScanGeometry;
    use ndarray::Array3;

    fn spectrum() -> RoiSpectrum {
        RoiSpectrum {
            raw: vec![10.0, 20.0, 30.0],
            baseline: vec![1.0, 2.0, 3.0],
            snip: vec![1.0, 1.5, 3.0],
            subtracted: vec![9.0, 18.5, 27.0],
        }
    }

    #[test]
    fn test_roi_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roi_0.csv");
        roi_to_csv(&spectrum(), &CalibrationModel::identity(3), &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["channel", "angle", "raw", "baseline", "snip", "subtracted"]
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[1][0], "1");
        assert_eq!(&rows[1][1], "1.0000");
        assert_eq!(&rows[1][5], "18.5000");
    }

    #[test]
    fn test_roi_xy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roi_0.dat");
        roi_to_xy(&spectrum(), RoiCurve::Raw, &CalibrationModel::identity(3), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "# Columns: channel, raw");
        assert_eq!(lines[1], "0.000 10.000");
        assert_eq!(lines[3], "2.000 30.000");

        roi_to_xy(&spectrum(), RoiCurve::Subtracted, &CalibrationModel::identity(3), &path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().nth(2), Some("1.000 18.500"));
    }

    #[test]
    fn test_full_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full.csv");
        let full = FullSpectrum {
            mean: vec![0.0, 2.5, 1.0],
            subtracted: vec![0.0, 1.25, 0.0],
        };
        full_to_csv(&full, &CalibrationModel::identity(3), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "channel,angle,mean,subtracted");
        assert_eq!(lines[2], "1,1.0000,2.5000,1.2500");
    }

    #[test]
    fn test_image_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.csv");
        let image = Array2::from_shape_fn((2, 3), |(r, c)| (r * 3 + c) as u8);
        image_to_csv(&image, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "0,1,2\n3,4,5\n");
    }

    #[test]
    fn test_calibration_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.csv");
        calibration_to_csv(&CalibrationModel::identity(4), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "channel,angle");
        assert_eq!(lines[3], "2,2.000000");
    }

    #[test]
    fn test_write_frames() {
        let dir = tempfile::tempdir().unwrap();
        let cube = Array3::from_shape_fn((2, 2, 3), |(r, c, k)| (r * 100 + c * 10 + k) as f64 + 0.7);
        let dataset = ScanDataset::new(ScanGeometry::new(2, 2), cube.clone(), cube, None).unwrap();
        let runner = BatchRunner::new(2).quiet();
        let calibration = CalibrationModel::identity(3);

        let result = write_frames(&dataset, &calibration, dir.path(), &runner, false).unwrap();
        assert_eq!(result.success, 4);

        let content = fs::read_to_string(dir.path().join("CFrame0002.dat")).unwrap();
        assert_eq!(content, "0.0000 100\n1.0000 101\n2.0000 102\n");

        let again = write_frames(&dataset, &calibration, dir.path(), &runner, false).unwrap();
        assert_eq!(again.skipped, 4);
        let forced = write_frames(&dataset, &calibration, dir.path(), &runner, true).unwrap();
        assert_eq!(forced.success, 4);
    }
}
