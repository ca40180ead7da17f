//! # 自适应基线估计
//!
//! 对立方体每个像素的谱估计缓变背景（基线），以及对一维聚合谱使用的 SNIP 基线。
//!
//! ## 自适应卷积算法
//! 1. 每条谱两端各复制边缘值 `half_width` 个
//! 2. 初始估计：与共享 Gaussian 窗（长度 `2*half_width - 1`，σ = 3）做 FFT 卷积，
//!    除以窗和
//! 3. 迭代 `iterations` 次：残差 `d = 谱 - 上次估计`，按像素计算超额峰度
//!    - 峰度 < 2：Gaussian 窗，σ = √std(d)
//!    - 否则（含方差为 0）：单侧指数窗，τ = 1
//!
//!    用该像素自己的窗重新卷积，并除以该窗的和
//! 4. 裁剪回原通道长度
//!
//! FFT 计划每次调用只规划一次，全部像素与迭代共享；每个像素的填充谱只变换一次。
//!
//! ## SNIP
//! 对 p = m-1 .. 1（递减），同时更新 `x[i] = min(x[i], (x[i-p] + x[i+p]) / 2)`。
//!
//! ## 依赖关系
//! - 被 `xrd/dataset.rs`, `xrd/roi.rs` 调用
//! - 使用 `xrd/window.rs` 的窗函数与峰度
//! - 使用 `rustfft` 做卷积，`ndarray` 的 rayon `Zip` 做逐像素并行

use crate::error::{XrdError, Result};
use crate::xrd::window;

use ndarray::{Array3, Axis, Zip};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// 默认半窗宽
pub const DEFAULT_HALF_WIDTH: usize = 48;

/// 默认迭代次数
pub const DEFAULT_ITERATIONS: usize = 2;

/// 默认 SNIP 窗口
pub const DEFAULT_SNIP_WINDOW: usize = 24;

/// 单像素卷积核
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kernel {
    /// 对称 Gaussian
    Gaussian { sigma: f64 },
    /// 单侧指数
    Exponential { tau: f64 },
}

impl Kernel {
    /// 生成指定长度的窗权重
    pub fn weights(&self, len: usize) -> Vec<f64> {
        match *self {
            Kernel::Gaussian { sigma } => window::gaussian(len, sigma),
            Kernel::Exponential { tau } => window::one_sided_exponential(len, tau),
        }
    }
}

/// 自适应基线估计器
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineEngine {
    /// 填充宽度，卷积窗长度为 `2 * half_width - 1`
    pub half_width: usize,
    /// 细化迭代次数
    pub iterations: usize,
    /// 初始 Gaussian 窗 σ
    pub initial_sigma: f64,
    /// 峰度判据阈值
    pub kurtosis_threshold: f64,
    /// 指数窗衰减常数
    pub tau: f64,
}

impl Default for BaselineEngine {
    fn default() -> Self {
        Self {
            half_width: DEFAULT_HALF_WIDTH,
            iterations: DEFAULT_ITERATIONS,
            initial_sigma: 3.0,
            kurtosis_threshold: 2.0,
            tau: 1.0,
        }
    }
}

impl BaselineEngine {
    pub fn new(half_width: usize, iterations: usize) -> Self {
        Self {
            half_width,
            iterations,
            ..Default::default()
        }
    }

    fn kernel_len(&self) -> usize {
        2 * self.half_width - 1
    }

    /// 按残差统计量为单个像素选择卷积核
    pub fn select_kernel(&self, residual: &[f64]) -> Kernel {
        match window::excess_kurtosis(residual) {
            Some(k) if k < self.kurtosis_threshold => Kernel::Gaussian {
                sigma: window::std_dev(residual).sqrt(),
            },
            _ => Kernel::Exponential { tau: self.tau },
        }
    }

    /// 估计整个立方体的基线
    pub fn estimate(&self, cube: &Array3<f64>) -> Result<Array3<f64>> {
        let (height, width, n_channels) = cube.dim();
        self.validate(n_channels)?;

        let conv = FftConvolver::new(n_channels, self.half_width);
        let initial = conv.kernel_spectrum(&window::gaussian(self.kernel_len(), self.initial_sigma));

        log::info!(
            "estimating baseline for {} pixels (half width {}, {} iterations)",
            height * width,
            self.half_width,
            self.iterations
        );

        let mut baseline = Array3::<f64>::zeros(cube.dim());
        Zip::from(baseline.lanes_mut(Axis(2)))
            .and(cube.lanes(Axis(2)))
            .par_for_each(|mut target, source| {
                let spectrum = source.to_vec();
                let estimate = self.refine(&conv, &initial, &spectrum);
                for (t, v) in target.iter_mut().zip(estimate) {
                    *t = v;
                }
            });

        Ok(baseline)
    }

    /// 估计单条谱的基线
    #[cfg(test)]
    fn estimate_spectrum(&self, spectrum: &[f64]) -> Result<Vec<f64>> {
        self.validate(spectrum.len())?;
        let conv = FftConvolver::new(spectrum.len(), self.half_width);
        let initial = conv.kernel_spectrum(&window::gaussian(self.kernel_len(), self.initial_sigma));
        Ok(self.refine(&conv, &initial, spectrum))
    }

    fn validate(&self, n_channels: usize) -> Result<()> {
        if self.half_width == 0 {
            return Err(XrdError::InvalidArgument(
                "baseline half width must be positive".to_string(),
            ));
        }
        if n_channels == 0 {
            return Err(XrdError::InvalidArgument(
                "cannot estimate a baseline without channels".to_string(),
            ));
        }
        Ok(())
    }

    fn refine(&self, conv: &FftConvolver, initial: &KernelSpectrum, spectrum: &[f64]) -> Vec<f64> {
        let signal = conv.transform_padded(spectrum);

        let mut estimate = vec![0.0; spectrum.len()];
        conv.convolve(&signal, initial, &mut estimate);

        let mut residual = vec![0.0; spectrum.len()];
        for _ in 0..self.iterations {
            for ((d, s), x) in residual.iter_mut().zip(spectrum).zip(&estimate) {
                *d = s - x;
            }
            let kernel = self.select_kernel(&residual);
            let kernel = conv.kernel_spectrum(&kernel.weights(self.kernel_len()));
            conv.convolve(&signal, &kernel, &mut estimate);
        }

        estimate
    }
}

/// 频域中的卷积核及其权重和
struct KernelSpectrum {
    fft: Vec<Complex<f64>>,
    sum: f64,
}

/// 固定长度的 FFT 循环卷积器
struct FftConvolver {
    n_channels: usize,
    half_width: usize,
    len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl FftConvolver {
    fn new(n_channels: usize, half_width: usize) -> Self {
        let len = n_channels + 2 * half_width;
        let mut planner = FftPlanner::<f64>::new();
        Self {
            n_channels,
            half_width,
            len,
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
        }
    }

    /// 边缘复制填充后做正变换
    fn transform_padded(&self, spectrum: &[f64]) -> Vec<Complex<f64>> {
        let last = self.n_channels - 1;
        let mut buffer: Vec<Complex<f64>> = (0..self.len)
            .map(|i| {
                let idx = i.saturating_sub(self.half_width).min(last);
                Complex::new(spectrum[idx], 0.0)
            })
            .collect();
        self.forward.process(&mut buffer);
        buffer
    }

    /// 零填充到卷积长度后做正变换
    fn kernel_spectrum(&self, weights: &[f64]) -> KernelSpectrum {
        let mut buffer = vec![Complex::new(0.0, 0.0); self.len];
        for (b, &w) in buffer.iter_mut().zip(weights) {
            b.re = w;
        }
        self.forward.process(&mut buffer);
        KernelSpectrum {
            fft: buffer,
            sum: weights.iter().sum(),
        }
    }

    /// 频域相乘、逆变换、裁剪并按窗和归一化
    fn convolve(&self, signal: &[Complex<f64>], kernel: &KernelSpectrum, out: &mut [f64]) {
        let mut buffer: Vec<Complex<f64>> = signal
            .iter()
            .zip(&kernel.fft)
            .map(|(a, b)| a * b)
            .collect();
        self.inverse.process(&mut buffer);

        let offset = 2 * self.half_width - 1;
        let scale = 1.0 / (self.len as f64 * kernel.sum);
        for (i, value) in out.iter_mut().enumerate() {
            *value = buffer[offset + i].re * scale;
        }
    }
}

/// 以默认参数估计立方体基线
pub fn estimate_baseline(cube: &Array3<f64>) -> Result<Array3<f64>> {
    BaselineEngine::default().estimate(cube)
}

/// SNIP 基线：窗口从 `m - 1` 递减到 1 的迭代削峰
pub fn snip(spectrum: &[f64], m: usize) -> Vec<f64> {
    let mut x = spectrum.to_vec();
    let mut previous = x.clone();
    let len = x.len();

    for p in (1..m).rev() {
        if 2 * p >= len {
            continue;
        }
        previous.copy_from_slice(&x);
        for i in p..len - p {
            let average = 0.5 * (previous[i - p] + previous[i + p]);
            x[i] = previous[i].min(average);
        }
    }

    x
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: usize = 300;

    /// 平坦背景 + 稀疏正峰
    fn peaked_spectrum(background: f64, peaks: &[(f64, f64)]) -> Vec<f64> {
        (0..N)
            .map(|c| {
                background
                    + peaks
                        .iter()
                        .map(|&(center, height)| {
                            let z = (c as f64 - center) / 1.5;
                            height * (-0.5 * z * z).exp()
                        })
                        .sum::<f64>()
            })
            .collect()
    }

    #[test]
    fn test_constant_spectrum_is_preserved() {
        let engine = BaselineEngine::default();
        let baseline = engine.estimate_spectrum(&vec![7.0; N]).unwrap();
        assert_eq!(baseline.len(), N);
        for v in baseline {
            assert!((v - 7.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_initial_pass_is_centered() {
        let engine = BaselineEngine::new(48, 0);
        let ramp: Vec<f64> = (0..N).map(|c| 2.0 * c as f64 + 1.0).collect();
        let baseline = engine.estimate_spectrum(&ramp).unwrap();
        for c in 47..N - 48 {
            assert!((baseline[c] - ramp[c]).abs() < 1e-6, "channel {}", c);
        }
    }

    #[test]
    fn test_unit_half_width_is_identity() {
        let engine = BaselineEngine::new(1, 2);
        let spectrum = peaked_spectrum(10.0, &[(100.0, 50.0)]);
        let baseline = engine.estimate_spectrum(&spectrum).unwrap();
        for (b, s) in baseline.iter().zip(&spectrum) {
            assert!((b - s).abs() < 1e-9);
        }
    }

    #[test]
    fn test_kernel_selection() {
        let engine = BaselineEngine::default();

        let mut spiky = vec![0.0; 200];
        spiky[50] = 40.0;
        assert_eq!(engine.select_kernel(&spiky), Kernel::Exponential { tau: 1.0 });

        let flat_noise: Vec<f64> = (0..200).map(|i| if i % 2 == 0 { 4.0 } else { -4.0 }).collect();
        match engine.select_kernel(&flat_noise) {
            Kernel::Gaussian { sigma } => assert!((sigma - 2.0).abs() < 1e-12),
            other => panic!("expected Gaussian kernel, got {:?}", other),
        }

        assert_eq!(
            engine.select_kernel(&[0.0; 32]),
            Kernel::Exponential { tau: 1.0 }
        );
    }

    #[test]
    fn test_cube_baseline_sum_bounded_by_signal() {
        let mut cube = Array3::<f64>::zeros((2, 2, N));
        let spectra = [
            peaked_spectrum(20.0, &[(80.0, 200.0), (190.0, 120.0)]),
            peaked_spectrum(15.0, &[(150.0, 300.0)]),
            peaked_spectrum(30.0, &[]),
            peaked_spectrum(5.0, &[(60.0, 50.0), (120.0, 80.0), (240.0, 400.0)]),
        ];
        for (idx, spectrum) in spectra.iter().enumerate() {
            for (k, v) in spectrum.iter().enumerate() {
                cube[[idx / 2, idx % 2, k]] = *v;
            }
        }

        let baseline = estimate_baseline(&cube).unwrap();
        assert_eq!(baseline.dim(), cube.dim());

        for r in 0..2 {
            for c in 0..2 {
                let b: f64 = baseline.slice(ndarray::s![r, c, ..]).sum();
                let s: f64 = cube.slice(ndarray::s![r, c, ..]).sum();
                assert!(b <= s * 1.01, "pixel ({}, {}): {} > {}", r, c, b, s);
                assert!(b.is_finite());
            }
        }
    }

    #[test]
    fn test_zero_half_width_rejected() {
        let cube = Array3::<f64>::zeros((1, 1, 10));
        assert!(BaselineEngine::new(0, 2).estimate(&cube).is_err());
        let empty = Array3::<f64>::zeros((1, 1, 0));
        assert!(BaselineEngine::default().estimate(&empty).is_err());
    }

    #[test]
    fn test_snip_never_exceeds_spectrum() {
        let spectrum = peaked_spectrum(10.0, &[(50.0, 100.0), (51.0, 20.0), (200.0, 60.0)]);
        let baseline = snip(&spectrum, 24);
        for (b, s) in baseline.iter().zip(&spectrum) {
            assert!(b <= s);
        }
        // 峰被削平到背景附近
        assert!(baseline[50] < 15.0);
    }

    #[test]
    fn test_snip_monotone_in_window() {
        let spectrum: Vec<f64> = (0..120)
            .map(|i| 5.0 + ((i * 37) % 11) as f64 + if i == 60 { 80.0 } else { 0.0 })
            .collect();
        let mut previous = snip(&spectrum, 1);
        assert_eq!(previous, spectrum);
        for m in 2..40 {
            let current = snip(&spectrum, m);
            for (c, p) in current.iter().zip(&previous) {
                assert!(c <= p, "window {}", m);
            }
            previous = current;
        }
    }

    #[test]
    fn test_snip_short_spectrum() {
        let spectrum = vec![3.0, 9.0, 1.0];
        assert_eq!(snip(&spectrum, 10), vec![3.0, 2.0, 1.0]);
        assert_eq!(snip(&[], 5), Vec::<f64>::new());
    }
}
