//! # roi 命令实现
//!
//! 对指定矩形聚合谱并导出。
//!
//! ## 功能
//! - 未给出 `--roi` 时使用默认区域 (32, 32, 12, 12)
//! - CSV / XY：每个 ROI 一个文件 `roi_<id>.csv` / `roi_<id>.dat`
//! - PNG / SVG：全部 ROI 画在同一张 `roi_spectra.*` 图中
//! - `--full`：另写全图强度谱 `full_spectrum.*`（平均谱与 SNIP 扣除后的平均谱）
//! - 终端打印每个 ROI 的吸附区域与峰位表
//!
//! ## 依赖关系
//! - 使用 `cli/roi.rs` 定义的参数
//! - 使用 `xrd/roi.rs`, `xrd/calibration.rs`, `xrd/export.rs`, `xrd/plot.rs`

use crate::cli::roi::{RoiArgs, RoiFormat};
use crate::commands::load_dataset;
use crate::error::{XrdError, Result};
use crate::utils::output;
use crate::xrd::export::{self, RoiCurve};
use crate::xrd::roi::{self, RoiId, RoiSpectrum};
use crate::xrd::{plot, CalibrationModel, RoiOptions, RoiSet, ScanDataset};

use std::fs;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

/// 执行 roi 命令
pub fn execute(args: RoiArgs) -> Result<()> {
    output::print_header("Region of interest spectra");

    let dataset = load_dataset(&args.dataset)?;
    let calibration = CalibrationModel::from_file_or_identity(&args.calibration, dataset.n_channels());
    if !calibration.is_calibrated() {
        output::print_warning(&format!(
            "No usable calibration at '{}', using channel numbers",
            args.calibration.display()
        ));
    }

    let mut rois = if args.rois.is_empty() {
        RoiSet::with_default()
    } else {
        let mut set = RoiSet::new();
        for rect in &args.rois {
            set.add(*rect);
        }
        set
    };

    let options = RoiOptions {
        normalize: args.normalize,
        mean: args.mean,
        snip_m: args.snip_m,
    };
    let spectra = rois.spectra(&dataset, &options)?;

    fs::create_dir_all(&args.output).map_err(|e| XrdError::FileWriteError {
        path: args.output.display().to_string(),
        source: e,
    })?;

    match args.format {
        RoiFormat::Csv | RoiFormat::Xy => {
            for (id, spectrum) in &spectra {
                let path = match args.format {
                    RoiFormat::Csv => {
                        let path = args.output.join(format!("roi_{}.csv", id));
                        export::roi_to_csv(spectrum, &calibration, &path)?;
                        path
                    }
                    _ => {
                        let path = args.output.join(format!("roi_{}.dat", id));
                        export::roi_to_xy(spectrum, RoiCurve::from(args.curve), &calibration, &path)?;
                        path
                    }
                };
                output::print_success(&format!("ROI {} -> {}", id, path.display()));
            }
        }
        RoiFormat::Png | RoiFormat::Svg => {
            let use_svg = args.format == RoiFormat::Svg;
            let path = args.output.join(format!("roi_spectra.{}", args.format));
            plot::generate_roi_plot(
                &spectra,
                &calibration,
                &path,
                &format!("ROI spectra: {}", args.dataset.dataset.display()),
                (args.width, args.height),
                use_svg,
            )?;
            output::print_success(&format!("Chart saved to '{}'", path.display()));
        }
    }

    if args.full {
        let path = write_full_spectrum(
            &dataset,
            &calibration,
            args.snip_m,
            args.format,
            &args.output,
            (args.width, args.height),
        )?;
        output::print_success(&format!("Full intensity -> {}", path.display()));
    }

    print_roi_table(&rois, &spectra, &calibration, &dataset);
    output::print_done(&format!("{} ROI(s) processed", spectra.len()));
    Ok(())
}

/// 写出全图强度谱；CSV / XY 格式都写 CSV 表，PNG / SVG 写图表
fn write_full_spectrum(
    dataset: &ScanDataset,
    calibration: &CalibrationModel,
    snip_m: usize,
    format: RoiFormat,
    output_dir: &Path,
    size: (u32, u32),
) -> Result<PathBuf> {
    let full = roi::full_spectrum(dataset.aligned(), snip_m);
    match format {
        RoiFormat::Csv | RoiFormat::Xy => {
            let path = output_dir.join("full_spectrum.csv");
            export::full_to_csv(&full, calibration, &path)?;
            Ok(path)
        }
        RoiFormat::Png | RoiFormat::Svg => {
            let path = output_dir.join(format!("full_spectrum.{}", format));
            plot::generate_full_plot(
                &full,
                calibration,
                &path,
                "Full intensity",
                size,
                format == RoiFormat::Svg,
            )?;
            Ok(path)
        }
    }
}

/// 打印 ROI 汇总表
fn print_roi_table(
    rois: &RoiSet,
    spectra: &[(RoiId, RoiSpectrum)],
    calibration: &CalibrationModel,
    dataset: &ScanDataset,
) {
    #[derive(Tabled)]
    struct RoiRow {
        #[tabled(rename = "ROI")]
        id: RoiId,
        #[tabled(rename = "Rect (x,y,w,h)")]
        rect: String,
        #[tabled(rename = "Pixels")]
        pixels: String,
        #[tabled(rename = "Peak channel")]
        peak_channel: usize,
        #[tabled(rename = "Peak 2θ (°)")]
        peak_angle: String,
        #[tabled(rename = "Max (subtracted)")]
        peak_value: String,
    }

    let rows: Vec<RoiRow> = spectra
        .iter()
        .filter_map(|(id, spectrum)| {
            let roi = rois.get(*id)?;
            let (peak_channel, peak_value) = spectrum
                .subtracted
                .iter()
                .copied()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (c, v)| {
                    if v > best.1 {
                        (c, v)
                    } else {
                        best
                    }
                });
            Some(RoiRow {
                id: *id,
                rect: roi.rect().to_string(),
                pixels: roi.rect().snap(dataset.geometry()).to_string(),
                peak_channel,
                peak_angle: format!("{:.3}", calibration.forward(peak_channel as f64)),
                peak_value: format!("{:.1}", peak_value),
            })
        })
        .collect();

    if !rows.is_empty() {
        println!("{}", Table::new(&rows));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScanGeometry;
    use ndarray::Array3;

    #[test]
    fn test_full_spectrum_csv_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut cube = Array3::from_elem((2, 3, 16), 4.0);
        cube[[1, 2, 8]] = 64.0;
        let dataset =
            ScanDataset::new(ScanGeometry::new(3, 2), cube.clone(), cube, None).unwrap();

        let path = write_full_spectrum(
            &dataset,
            &CalibrationModel::identity(16),
            6,
            RoiFormat::Xy,
            dir.path(),
            (400, 300),
        )
        .unwrap();

        assert_eq!(path, dir.path().join("full_spectrum.csv"));
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 17);
        assert_eq!(lines[0], "channel,angle,mean,subtracted");
        // 峰 60 被 6 个像素平均
        assert_eq!(lines[9], "8,8.0000,10.0000,10.0000");
    }
}
