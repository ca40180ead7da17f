//! # 扫描数据集
//!
//! 会话持有的数据包：几何、对齐后立方体、基线立方体、平移表与版本号。
//!
//! 版本号来自进程级原子计数器，构造与每次修改（重新对齐、重算基线）时刷新，
//! ROI 缓存以此判断立方体是否已被替换。
//!
//! ## 依赖关系
//! - 被 `xrd/roi.rs`, `xrd/store.rs`, `commands/` 使用
//! - 使用 `xrd/align.rs`, `xrd/baseline.rs`, `xrd/builder.rs`

use crate::error::{XrdError, Result};
use crate::models::ScanGeometry;
use crate::xrd::align::{self, PeakAligner, ShiftMap};
use crate::xrd::baseline::BaselineEngine;
use crate::xrd::builder::RawScan;

use ndarray::{Array3, Axis, Zip};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// 对齐与基线处理后的扫描数据
#[derive(Debug, Clone)]
pub struct ScanDataset {
    geometry: ScanGeometry,
    aligned: Array3<f64>,
    baseline: Array3<f64>,
    shifts: Option<ShiftMap>,
    revision: u64,
}

impl ScanDataset {
    /// 组装数据集并校验形状
    pub fn new(
        geometry: ScanGeometry,
        aligned: Array3<f64>,
        baseline: Array3<f64>,
        shifts: Option<ShiftMap>,
    ) -> Result<Self> {
        let (height, width, _) = aligned.dim();
        if (geometry.height, geometry.width) != (height, width) {
            return Err(XrdError::ShapeMismatch {
                expected: vec![geometry.height, geometry.width],
                found: vec![height, width],
            });
        }
        if baseline.dim() != aligned.dim() {
            return Err(XrdError::ShapeMismatch {
                expected: aligned.shape().to_vec(),
                found: baseline.shape().to_vec(),
            });
        }
        if let Some(map) = &shifts {
            if map.dim() != (height, width) {
                return Err(XrdError::ShapeMismatch {
                    expected: vec![height, width],
                    found: map.shape().to_vec(),
                });
            }
        }

        Ok(Self {
            geometry,
            aligned,
            baseline,
            shifts,
            revision: next_revision(),
        })
    }

    /// 由原始扫描对齐（可选）并估计基线
    pub fn from_raw(
        raw: RawScan,
        aligner: Option<&PeakAligner>,
        engine: &BaselineEngine,
    ) -> Result<Self> {
        let (aligned, shifts) = match aligner {
            Some(aligner) => {
                let (aligned, shifts) = aligner.align(&raw.cube)?;
                (aligned, Some(shifts))
            }
            None => (raw.cube, None),
        };
        let baseline = engine.estimate(&aligned)?;
        Self::new(raw.geometry, aligned, baseline, shifts)
    }

    /// 在基线立方体上检测平移，并同时应用到两个立方体
    pub fn realign_from_baseline(&mut self, aligner: &PeakAligner) -> Result<ShiftMap> {
        let detected = aligner.detect(&self.baseline)?;
        self.aligned = align::apply_shifts(&self.aligned, &detected)?;
        self.baseline = align::apply_shifts(&self.baseline, &detected)?;

        let total = match self.shifts.take() {
            Some(mut previous) => {
                Zip::from(&mut previous)
                    .and(&detected)
                    .for_each(|p, &d| *p += d);
                previous
            }
            None => detected.clone(),
        };
        self.shifts = Some(total);
        self.touch();

        log::info!(
            "realigned on baseline at channel {}",
            aligner.reference_channel
        );
        Ok(detected)
    }

    /// 以新参数重算基线
    pub fn recompute_baseline(&mut self, engine: &BaselineEngine) -> Result<()> {
        self.baseline = engine.estimate(&self.aligned)?;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.revision = next_revision();
    }

    pub fn geometry(&self) -> ScanGeometry {
        self.geometry
    }

    pub fn aligned(&self) -> &Array3<f64> {
        &self.aligned
    }

    pub fn baseline(&self) -> &Array3<f64> {
        &self.baseline
    }

    pub fn shifts(&self) -> Option<&ShiftMap> {
        self.shifts.as_ref()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn n_channels(&self) -> usize {
        self.aligned.len_of(Axis(2))
    }
}
