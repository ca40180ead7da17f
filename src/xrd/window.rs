//! # 卷积窗函数与矩统计
//!
//! ## 窗函数
//! - Gaussian: w[n] = exp(-½ ((n - (M-1)/2) / σ)²), n = 0..M
//! - 单侧指数: w[n] = exp(-(n - c) / τ)，n ≥ c = (M-1)/2；n < c 时为 0
//!
//! ## 统计量
//! - 总体标准差
//! - 超额峰度（Fisher 定义，有偏估计）: m4 / m2² - 3
//!
//! ## 依赖关系
//! - 被 `xrd/align.rs`, `xrd/baseline.rs` 使用
//! - 纯数值函数，无外部依赖

/// 对称 Gaussian 窗
pub fn gaussian(len: usize, sigma: f64) -> Vec<f64> {
    let center = (len as f64 - 1.0) / 2.0;
    (0..len)
        .map(|n| {
            let z = (n as f64 - center) / sigma;
            (-0.5 * z * z).exp()
        })
        .collect()
}

/// 单侧指数窗，从窗中心开始向高索引衰减
pub fn one_sided_exponential(len: usize, tau: f64) -> Vec<f64> {
    let center = (len.saturating_sub(1)) / 2;
    (0..len)
        .map(|n| {
            if n < center {
                0.0
            } else {
                (-((n - center) as f64) / tau).exp()
            }
        })
        .collect()
}

/// 平均值
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// 总体标准差
pub fn std_dev(values: &[f64]) -> f64 {
    central_moment(values, 2).sqrt()
}

/// 超额峰度；方差为 0 时返回 None
pub fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    let m2 = central_moment(values, 2);
    if m2 <= f64::EPSILON * f64::EPSILON || !m2.is_finite() {
        return None;
    }
    let m4 = central_moment(values, 4);
    Some(m4 / (m2 * m2) - 3.0)
}

fn central_moment(values: &[f64], order: i32) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mu = mean(values);
    values.iter().map(|v| (v - mu).powi(order)).sum::<f64>() / values.len() as f64
}
