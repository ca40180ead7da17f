//! # 通道 → 角度标定
//!
//! 由参考峰 `(channel, angle)` 最小二乘拟合二次曲线 `angle = a·c² + b·c + c0`，
//! 并提供正向与反向查询。
//!
//! ## 拟合
//! - 通道先按最大绝对值缩放，再用 SVD 求解（`nalgebra`），最后换算回原系数
//! - 少于 3 个点：`InsufficientPointsError`
//! - 参考点含 NaN / inf，或设计矩阵秩 < 3（如通道重复）：`SingularFitError`
//!
//! ## 反向查询
//! 在 `[0, n_channels - 1]` 上每 0.25 通道采样正向曲线，构建单调分段三次
//! Hermite 插值（Fritsch–Carlson PCHIP），区间外用边界三次多项式外推。
//! 二次曲线顶点落在区间内时，在第一个非单调采样处截断并记录警告。
//!
//! ## 降级
//! 参考文件缺失或拟合失败时退化为 `{(1,1),(2,2),(3,3)}` 的恒等标定，
//! `is_calibrated()` 为 false。
//!
//! ## 依赖关系
//! - 被 `xrd/roi.rs`, `xrd/export.rs`, `commands/` 使用
//! - 使用 `parsers/calibration.rs` 读取参考点

use crate::error::{XrdError, Result};
use crate::parsers;

use nalgebra::{DMatrix, DVector};
use std::path::Path;

/// 参考仪器的通道数
pub const DEFAULT_CHANNELS: usize = 1280;

/// 反向插值的采样步长（通道）
const INVERSE_STEP: f64 = 0.25;

/// 恒等标定的参考点
const IDENTITY_POINTS: [(f64, f64); 3] = [(1.0, 1.0), (2.0, 2.0), (3.0, 3.0)];

/// 二次标定模型
#[derive(Debug, Clone)]
pub struct CalibrationModel {
    /// `[a, b, c0]`
    coefficients: [f64; 3],
    reference_points: Vec<(f64, f64)>,
    n_channels: usize,
    calibrated: bool,
    inverse: Pchip,
}

impl CalibrationModel {
    /// 最小二乘拟合
    pub fn fit(points: &[(f64, f64)], n_channels: usize) -> Result<Self> {
        if points.len() < 3 {
            return Err(XrdError::InsufficientPointsError {
                found: points.len(),
            });
        }
        if let Some(&(channel, angle)) = points
            .iter()
            .find(|(c, a)| !c.is_finite() || !a.is_finite())
        {
            return Err(XrdError::SingularFitError {
                reason: format!("non-finite reference point ({}, {})", channel, angle),
            });
        }

        let coefficients = solve_quadratic(points)?;
        let inverse = build_inverse(&coefficients, n_channels)?;

        log::debug!(
            "calibration a={:.6e} b={:.6e} c={:.6e} from {} points",
            coefficients[0],
            coefficients[1],
            coefficients[2],
            points.len()
        );

        Ok(Self {
            coefficients,
            reference_points: points.to_vec(),
            n_channels,
            calibrated: true,
            inverse,
        })
    }

    /// 恒等标定（未标定状态）
    pub fn identity(n_channels: usize) -> Self {
        let coefficients = [0.0, 1.0, 0.0];
        let inverse = Pchip::new(
            vec![0.0, n_channels.saturating_sub(1).max(1) as f64],
            vec![0.0, n_channels.saturating_sub(1).max(1) as f64],
        );
        Self {
            coefficients,
            reference_points: IDENTITY_POINTS.to_vec(),
            n_channels,
            calibrated: false,
            inverse,
        }
    }

    /// 读取参考文件并拟合；任何失败都降级为恒等标定
    pub fn from_file_or_identity(path: &Path, n_channels: usize) -> Self {
        let fitted = parsers::parse_calibration_file(path)
            .and_then(|points| Self::fit(&points, n_channels));
        match fitted {
            Ok(model) => {
                log::info!("calibration loaded from {}", path.display());
                model
            }
            Err(e) => {
                log::warn!("{}; falling back to channel numbers", e);
                Self::identity(n_channels)
            }
        }
    }

    /// 通道 → 角度
    pub fn forward(&self, channel: f64) -> f64 {
        let [a, b, c] = self.coefficients;
        (a * channel + b) * channel + c
    }

    /// 角度 → 通道
    pub fn inverse(&self, angle: f64) -> f64 {
        self.inverse.evaluate(angle)
    }

    /// 全部通道对应的角度轴
    pub fn axis(&self) -> Vec<f64> {
        (0..self.n_channels).map(|c| self.forward(c as f64)).collect()
    }

    pub fn coefficients(&self) -> [f64; 3] {
        self.coefficients
    }

    pub fn reference_points(&self) -> &[(f64, f64)] {
        &self.reference_points
    }

    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }
}

/// 拟合标定曲线
pub fn fit_calibration(points: &[(f64, f64)], n_channels: usize) -> Result<CalibrationModel> {
    CalibrationModel::fit(points, n_channels)
}

fn solve_quadratic(points: &[(f64, f64)]) -> Result<[f64; 3]> {
    let scale = points
        .iter()
        .map(|(c, _)| c.abs())
        .fold(0.0_f64, f64::max)
        .max(1.0);

    let n = points.len();
    let design = DMatrix::from_fn(n, 3, |i, j| {
        let t = points[i].0 / scale;
        match j {
            0 => t * t,
            1 => t,
            _ => 1.0,
        }
    });
    let target = DVector::from_iterator(n, points.iter().map(|(_, angle)| *angle));

    let svd = design.svd(true, true);
    let largest = svd.singular_values.max();
    let tolerance = largest * 1e-9;
    let rank = svd.rank(tolerance);
    if rank < 3 {
        return Err(XrdError::SingularFitError {
            reason: format!("design matrix has rank {} (repeated channels?)", rank),
        });
    }

    let solution = svd
        .solve(&target, tolerance)
        .map_err(|e| XrdError::SingularFitError {
            reason: e.to_string(),
        })?;

    Ok([
        solution[0] / (scale * scale),
        solution[1] / scale,
        solution[2],
    ])
}

/// 以正向曲线的单调采样构建反向插值
fn build_inverse(coefficients: &[f64; 3], n_channels: usize) -> Result<Pchip> {
    let [a, b, c] = *coefficients;
    let forward = |ch: f64| (a * ch + b) * ch + c;

    let upper = n_channels.saturating_sub(1).max(1) as f64;
    let count = (upper / INVERSE_STEP).round() as usize + 1;

    let mut channels = Vec::with_capacity(count);
    let mut angles = Vec::with_capacity(count);
    let mut direction = 0.0;

    for k in 0..count {
        let ch = k as f64 * INVERSE_STEP;
        let angle = forward(ch);
        if let Some(&last) = angles.last() {
            let step: f64 = angle - last;
            if direction == 0.0 {
                direction = step.signum();
            }
            if step == 0.0 || step.signum() != direction {
                log::warn!(
                    "calibration curve is not monotone beyond channel {:.2}; inverse truncated",
                    ch - INVERSE_STEP
                );
                break;
            }
        }
        channels.push(ch);
        angles.push(angle);
    }

    if angles.len() < 2 {
        return Err(XrdError::SingularFitError {
            reason: "calibration curve is flat".to_string(),
        });
    }

    if direction < 0.0 {
        channels.reverse();
        angles.reverse();
    }

    Ok(Pchip::new(angles, channels))
}

/// Fritsch–Carlson 单调三次 Hermite 插值
#[derive(Debug, Clone)]
struct Pchip {
    x: Vec<f64>,
    y: Vec<f64>,
    slopes: Vec<f64>,
}

impl Pchip {
    /// `x` 必须严格递增且至少两个点
    fn new(x: Vec<f64>, y: Vec<f64>) -> Self {
        let n = x.len();
        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        let delta: Vec<f64> = (0..n - 1).map(|k| (y[k + 1] - y[k]) / h[k]).collect();

        let mut slopes = vec![0.0; n];
        if n == 2 {
            slopes[0] = delta[0];
            slopes[1] = delta[0];
        } else {
            for k in 1..n - 1 {
                if delta[k - 1] * delta[k] > 0.0 {
                    let w1 = 2.0 * h[k] + h[k - 1];
                    let w2 = h[k] + 2.0 * h[k - 1];
                    slopes[k] = (w1 + w2) / (w1 / delta[k - 1] + w2 / delta[k]);
                }
            }
            slopes[0] = end_slope(h[0], h[1], delta[0], delta[1]);
            slopes[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
        }

        Self { x, y, slopes }
    }

    fn evaluate(&self, at: f64) -> f64 {
        let n = self.x.len();
        let k = self.x.partition_point(|&v| v <= at).clamp(1, n - 1) - 1;

        let h = self.x[k + 1] - self.x[k];
        let t = (at - self.x[k]) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * self.y[k] + h10 * h * self.slopes[k] + h01 * self.y[k + 1] + h11 * h * self.slopes[k + 1]
    }
}

/// 三点端点导数，保持形状
fn end_slope(h0: f64, h1: f64, d0: f64, d1: f64) -> f64 {
    let slope = ((2.0 * h0 + h1) * d0 - h0 * d1) / (h0 + h1);
    if slope.signum() != d0.signum() {
        0.0
    } else if d0.signum() != d1.signum() && slope.abs() > 3.0 * d0.abs() {
        3.0 * d0
    } else {
        slope
    }
}
