//! # 参考峰对齐
//!
//! 逐像素检测参考峰相对公共通道的漂移，并循环平移整条谱以消除漂移。
//!
//! ## 算法
//! 1. 截取 `[channel - w, channel + w)` 子谱，两端各复制边缘值 `w` 个
//! 2. 与长度 `2w`、方差 8.1 的 Gaussian 窗做 valid 相关，取前 `2w` 个输出
//! 3. 最大值位置（首个最大值）减 `w` 得偏移 `f`
//! 4. `-w < f < w` 时整条谱循环平移 `-f`，否则保持不变并记录 0
//!
//! ## 依赖关系
//! - 被 `xrd/dataset.rs`, `commands/build.rs` 调用
//! - 使用 `xrd/window.rs` 的 Gaussian 窗
//! - 使用 `ndarray` 的 rayon 并行 `Zip`

use crate::error::{XrdError, Result};
use crate::xrd::window;

use ndarray::{Array2, Array3, ArrayView1, ArrayViewMut1, Axis, Zip};

/// 参考仪器上默认的参考峰通道
pub const DEFAULT_REFERENCE_CHANNEL: usize = 555;

/// 默认搜索半窗宽
pub const DEFAULT_HALF_WINDOW: usize = 24;

/// 相关窗方差
const WINDOW_VARIANCE: f64 = 8.1;

/// 逐像素平移量 (height, width)
pub type ShiftMap = Array2<i64>;

/// 参考峰对齐器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakAligner {
    /// 参考峰对齐到的通道
    pub reference_channel: usize,
    /// 搜索半窗宽
    pub half_window: usize,
}

impl Default for PeakAligner {
    fn default() -> Self {
        Self {
            reference_channel: DEFAULT_REFERENCE_CHANNEL,
            half_window: DEFAULT_HALF_WINDOW,
        }
    }
}

impl PeakAligner {
    pub fn new(reference_channel: usize, half_window: usize) -> Self {
        Self {
            reference_channel,
            half_window,
        }
    }

    fn validate(&self, n_channels: usize) -> Result<()> {
        let fits = self.half_window > 0
            && self.reference_channel >= self.half_window
            && self.reference_channel + self.half_window <= n_channels;
        if fits {
            Ok(())
        } else {
            Err(XrdError::ChannelRangeError {
                channel: self.reference_channel,
                half_window: self.half_window,
                n_channels,
            })
        }
    }

    fn correlation_window(&self) -> Vec<f64> {
        window::gaussian(2 * self.half_window, WINDOW_VARIANCE.sqrt())
    }

    /// 检测单条谱的偏移；偏移落在窗边界上时返回 None
    fn detect_offset(&self, spectrum: ArrayView1<f64>, win: &[f64]) -> Option<i64> {
        let w = self.half_window;
        let start = self.reference_channel - w;

        // 边缘复制填充后的子谱，长度 4w
        let padded: Vec<f64> = (0..4 * w)
            .map(|i| {
                let local = i.saturating_sub(w).min(2 * w - 1);
                spectrum[start + local]
            })
            .collect();

        let mut best = 0usize;
        let mut best_value = f64::NEG_INFINITY;
        for k in 0..2 * w {
            let value: f64 = padded[k..k + 2 * w]
                .iter()
                .zip(win)
                .map(|(a, b)| a * b)
                .sum();
            if value > best_value {
                best_value = value;
                best = k;
            }
        }

        let f = best as i64 - w as i64;
        let limit = w as i64;
        if -limit < f && f < limit {
            Some(f)
        } else {
            None
        }
    }

    /// 检测整个立方体的逐像素偏移
    pub fn detect(&self, cube: &Array3<f64>) -> Result<ShiftMap> {
        let (height, width, n_channels) = cube.dim();
        self.validate(n_channels)?;

        let win = self.correlation_window();
        let mut shifts = ShiftMap::zeros((height, width));

        Zip::from(&mut shifts)
            .and(cube.lanes(Axis(2)))
            .par_for_each(|shift, spectrum| {
                *shift = self.detect_offset(spectrum, &win).unwrap_or(0);
            });

        let rejected = shifts.iter().filter(|&&f| f == 0).count();
        log::debug!(
            "alignment at channel {}±{}: {} of {} pixels unshifted",
            self.reference_channel,
            self.half_window,
            rejected,
            height * width
        );

        Ok(shifts)
    }

    /// 检测并应用平移
    pub fn align(&self, cube: &Array3<f64>) -> Result<(Array3<f64>, ShiftMap)> {
        let shifts = self.detect(cube)?;
        let aligned = apply_shifts(cube, &shifts)?;
        Ok((aligned, shifts))
    }
}

/// 按平移表循环平移每条谱：`out[i] = in[(i + f) mod n]`
pub fn apply_shifts(cube: &Array3<f64>, shifts: &ShiftMap) -> Result<Array3<f64>> {
    let (height, width, _) = cube.dim();
    if shifts.dim() != (height, width) {
        return Err(XrdError::ShapeMismatch {
            expected: vec![height, width],
            found: shifts.shape().to_vec(),
        });
    }

    let mut out = Array3::<f64>::zeros(cube.dim());
    Zip::from(out.lanes_mut(Axis(2)))
        .and(cube.lanes(Axis(2)))
        .and(shifts)
        .par_for_each(|target, source, &f| roll_into(target, source, f));

    Ok(out)
}

fn roll_into(mut target: ArrayViewMut1<f64>, source: ArrayView1<f64>, f: i64) {
    let n = source.len() as i64;
    if n == 0 {
        return;
    }
    for (i, value) in target.iter_mut().enumerate() {
        let src = (i as i64 + f).rem_euclid(n) as usize;
        *value = source[src];
    }
}

/// 以默认半窗宽对齐到指定通道
pub fn align(cube: &Array3<f64>, reference_channel: usize) -> Result<(Array3<f64>, ShiftMap)> {
    PeakAligner::new(reference_channel, DEFAULT_HALF_WINDOW).align(cube)
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 200;
    const REF: usize = 100;

    fn peak_spectrum(center: f64) -> Vec<f64> {
        (0..N)
            .map(|c| {
                let z = (c as f64 - center) / 2.0;
                5.0 + 100.0 * (-0.5 * z * z).exp()
            })
            .collect()
    }

    fn drifted_cube(drifts: &[[i64; 3]; 2]) -> Array3<f64> {
        let mut cube = Array3::<f64>::zeros((2, 3, N));
        for r in 0..2 {
            for c in 0..3 {
                let spectrum = peak_spectrum(REF as f64 + drifts[r][c] as f64);
                for (k, v) in spectrum.into_iter().enumerate() {
                    cube[[r, c, k]] = v;
                }
            }
        }
        cube
    }

    fn peak_position(cube: &Array3<f64>, r: usize, c: usize) -> usize {
        let lane = cube.slice(ndarray::s![r, c, ..]);
        let mut best = 0;
        for k in 0..lane.len() {
            if lane[k] > lane[best] {
                best = k;
            }
        }
        best
    }

    #[test]
    fn test_detects_drift_and_rolls_peak_to_reference() {
        let cube = drifted_cube(&[[0, 3, -5], [7, -2, 10]]);
        let aligner = PeakAligner::new(REF, DEFAULT_HALF_WINDOW);
        let (aligned, shifts) = aligner.align(&cube).unwrap();

        assert_eq!(shifts.dim(), (2, 3));
        for r in 0..2 {
            for c in 0..3 {
                let pos = peak_position(&aligned, r, c) as i64;
                assert!((pos - REF as i64).abs() <= 1, "pixel ({}, {}) at {}", r, c, pos);
            }
        }
        assert!((shifts[[1, 2]] - 10).abs() <= 1);
        assert!((shifts[[0, 2]] + 5).abs() <= 1);
    }

    #[test]
    fn test_realignment_is_idempotent() {
        let cube = drifted_cube(&[[4, -3, 1], [-8, 6, 0]]);
        let aligner = PeakAligner::new(REF, DEFAULT_HALF_WINDOW);
        let (aligned, _) = aligner.align(&cube).unwrap();
        let (_, second) = aligner.align(&aligned).unwrap();
        assert!(second.iter().all(|f| f.abs() <= 1), "{:?}", second);
    }

    #[test]
    fn test_edge_maximum_is_rejected() {
        let mut cube = Array3::<f64>::zeros((1, 1, N));
        for k in 0..N {
            cube[[0, 0, k]] = 1000.0 - k as f64;
        }
        let (aligned, shifts) = PeakAligner::new(REF, 24).align(&cube).unwrap();
        assert_eq!(shifts[[0, 0]], 0);
        assert_eq!(aligned, cube);
    }

    #[test]
    fn test_window_outside_channels() {
        let cube = Array3::<f64>::zeros((1, 1, 50));
        let result = PeakAligner::new(40, 24).detect(&cube);
        match result {
            Err(XrdError::ChannelRangeError {
                channel,
                half_window,
                n_channels,
            }) => {
                assert_eq!((channel, half_window, n_channels), (40, 24, 50));
            }
            other => panic!("expected ChannelRangeError, got {:?}", other),
        }
        assert!(PeakAligner::new(10, 24).detect(&cube).is_err());
        assert!(PeakAligner::new(25, 0).detect(&cube).is_err());
    }

    #[test]
    fn test_apply_shifts_wraps_around() {
        let mut cube = Array3::<f64>::zeros((1, 1, 5));
        for k in 0..5 {
            cube[[0, 0, k]] = k as f64;
        }
        let shifts = ShiftMap::from_elem((1, 1), 2);
        let rolled = apply_shifts(&cube, &shifts).unwrap();
        let values: Vec<f64> = rolled.iter().copied().collect();
        assert_eq!(values, vec![2.0, 3.0, 4.0, 0.0, 1.0]);

        let wrong = ShiftMap::zeros((2, 1));
        assert!(matches!(
            apply_shifts(&cube, &wrong),
            Err(XrdError::ShapeMismatch { .. })
        ));
    }
}
