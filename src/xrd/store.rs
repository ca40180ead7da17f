//! # 数据集持久化
//!
//! 将对齐后立方体、基线立方体、几何与平移表写入单个二进制文件。
//!
//! ## 文件格式
//! ```text
//! [0..8)   magic  "XRDSCAN\0"
//! [8..12)  u32 LE 格式版本 (1)
//! [12..)   bincode (serde, standard) 负载
//!          { geometry, aligned, baseline: Option, shifts: Option }
//! ```
//!
//! 读取时若负载不含基线，则用给定的 `BaselineEngine` 重新计算。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `xrd/dataset.rs`
//! - 使用 `bincode` + `serde` 编码

use crate::error::{XrdError, Result};
use crate::models::ScanGeometry;
use crate::xrd::align::ShiftMap;
use crate::xrd::baseline::BaselineEngine;
use crate::xrd::dataset::ScanDataset;

use ndarray::Array3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// 默认数据集文件名
pub const DEFAULT_DATASET_FILE: &str = "data.xrd";

const MAGIC: &[u8; 8] = b"XRDSCAN\0";
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct PayloadRef<'a> {
    geometry: ScanGeometry,
    aligned: &'a Array3<f64>,
    baseline: Option<&'a Array3<f64>>,
    shifts: Option<&'a ShiftMap>,
}

#[derive(Deserialize)]
struct Payload {
    geometry: ScanGeometry,
    aligned: Array3<f64>,
    baseline: Option<Array3<f64>>,
    shifts: Option<ShiftMap>,
}

/// 保存完整数据集
pub fn save(dataset: &ScanDataset, path: &Path) -> Result<()> {
    save_parts(
        path,
        dataset.geometry(),
        dataset.aligned(),
        Some(dataset.baseline()),
        dataset.shifts(),
    )
}

/// 保存各组成部分；基线可省略
pub fn save_parts(
    path: &Path,
    geometry: ScanGeometry,
    aligned: &Array3<f64>,
    baseline: Option<&Array3<f64>>,
    shifts: Option<&ShiftMap>,
) -> Result<()> {
    let write_error = |e: std::io::Error| XrdError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    };

    let file = File::create(path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(MAGIC).map_err(write_error)?;
    writer
        .write_all(&FORMAT_VERSION.to_le_bytes())
        .map_err(write_error)?;

    let payload = PayloadRef {
        geometry,
        aligned,
        baseline,
        shifts,
    };
    let written = bincode::serde::encode_into_std_write(
        &payload,
        &mut writer,
        bincode::config::standard(),
    )
    .map_err(|e| XrdError::EncodeError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    writer.flush().map_err(write_error)?;

    log::info!("saved dataset {} ({} bytes)", path.display(), written + 12);
    Ok(())
}

/// 读取数据集，缺失的基线用 `engine` 重算
pub fn load(path: &Path, engine: &BaselineEngine) -> Result<ScanDataset> {
    if !path.exists() {
        return Err(XrdError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let file = File::open(path).map_err(|e| XrdError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut reader = BufReader::new(file);

    let mut header = [0u8; 12];
    if reader.read_exact(&mut header).is_err() || &header[..8] != MAGIC {
        return Err(XrdError::InvalidDatasetFile {
            path: path.display().to_string(),
        });
    }
    let version = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
    if version != FORMAT_VERSION {
        return Err(XrdError::DecodeError {
            path: path.display().to_string(),
            reason: format!("unsupported format version {}", version),
        });
    }

    let payload: Payload =
        bincode::serde::decode_from_std_read(&mut reader, bincode::config::standard()).map_err(
            |e| XrdError::DecodeError {
                path: path.display().to_string(),
                reason: e.to_string(),
            },
        )?;

    let baseline = match payload.baseline {
        Some(baseline) => baseline,
        None => {
            log::warn!(
                "{} has no baseline cube; recomputing",
                path.display()
            );
            engine.estimate(&payload.aligned)?
        }
    };

    ScanDataset::new(payload.geometry, payload.aligned, baseline, payload.shifts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_cube() -> Array3<f64> {
        Array3::from_shape_fn((3, 2, 40), |(r, c, k)| {
            5.0 + (r * 2 + c) as f64 + if k == 20 { 50.0 } else { 0.0 }
        })
    }

    #[test]
    fn test_round_trip_keeps_both_cubes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_DATASET_FILE);

        let cube = sample_cube();
        let baseline = cube.mapv(|v| v * 0.5);
        let shifts = ShiftMap::from_shape_fn((3, 2), |(r, c)| r as i64 - c as i64);
        let dataset =
            ScanDataset::new(ScanGeometry::new(2, 3), cube, baseline, Some(shifts)).unwrap();

        save(&dataset, &path).unwrap();
        let loaded = load(&path, &BaselineEngine::default()).unwrap();

        assert_eq!(loaded.geometry(), dataset.geometry());
        assert_eq!(loaded.aligned(), dataset.aligned());
        assert_eq!(loaded.baseline(), dataset.baseline());
        assert_eq!(loaded.shifts(), dataset.shifts());
        assert_ne!(loaded.revision(), dataset.revision());
    }

    #[test]
    fn test_missing_baseline_is_recomputed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.xrd");
        let cube = sample_cube();

        save_parts(&path, ScanGeometry::new(2, 3), &cube, None, None).unwrap();
        let engine = BaselineEngine::new(6, 1);
        let loaded = load(&path, &engine).unwrap();

        assert_eq!(loaded.baseline(), &engine.estimate(&cube).unwrap());
        assert!(loaded.shifts().is_none());
    }

    #[test]
    fn test_rejects_foreign_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("other.xrd");
        fs::write(&path, b"not a dataset at all").unwrap();
        assert!(matches!(
            load(&path, &BaselineEngine::default()),
            Err(XrdError::InvalidDatasetFile { .. })
        ));

        fs::write(&path, b"XRD").unwrap();
        assert!(matches!(
            load(&path, &BaselineEngine::default()),
            Err(XrdError::InvalidDatasetFile { .. })
        ));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.xrd");
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        fs::write(&path, bytes).unwrap();
        assert!(matches!(
            load(&path, &BaselineEngine::default()),
            Err(XrdError::DecodeError { .. })
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.xrd");
        let dataset = ScanDataset::new(
            ScanGeometry::new(2, 3),
            sample_cube(),
            sample_cube(),
            None,
        )
        .unwrap();
        save(&dataset, &path).unwrap();

        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();
        assert!(matches!(
            load(&path, &BaselineEngine::default()),
            Err(XrdError::DecodeError { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load(Path::new("/nonexistent/data.xrd"), &BaselineEngine::default()),
            Err(XrdError::FileNotFound { .. })
        ));
    }
}
