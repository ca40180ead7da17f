//! # calibrate 命令实现
//!
//! 拟合参考峰标定曲线，打印系数与每个参考点的残差。
//!
//! ## 依赖关系
//! - 使用 `cli/calibrate.rs` 定义的参数
//! - 使用 `parsers/calibration.rs`, `xrd/calibration.rs`, `xrd/export.rs`

use crate::cli::calibrate::CalibrateArgs;
use crate::commands::SummaryRow;
use crate::error::Result;
use crate::parsers;
use crate::utils::output;
use crate::xrd::{export, fit_calibration};

use tabled::{Table, Tabled};

/// 执行 calibrate 命令
pub fn execute(args: CalibrateArgs) -> Result<()> {
    output::print_header("Channel calibration");

    let points = parsers::parse_calibration_file(&args.file)?;
    output::print_info(&format!(
        "Read {} reference point(s) from '{}'",
        points.len(),
        args.file.display()
    ));

    let model = fit_calibration(&points, args.channels)?;
    let [a, b, c] = model.coefficients();

    let summary = vec![
        SummaryRow::new("a (c²)", format!("{:.6e}", a)),
        SummaryRow::new("b (c)", format!("{:.6e}", b)),
        SummaryRow::new("c0", format!("{:.6}", c)),
        SummaryRow::new("Channels", args.channels),
        SummaryRow::new(
            "Range (°)",
            format!(
                "{:.4} .. {:.4}",
                model.forward(0.0),
                model.forward(args.channels.saturating_sub(1) as f64)
            ),
        ),
    ];
    println!("{}", Table::new(&summary));

    #[derive(Tabled)]
    struct PointRow {
        #[tabled(rename = "Channel")]
        channel: String,
        #[tabled(rename = "2θ ref (°)")]
        angle: String,
        #[tabled(rename = "2θ fit (°)")]
        fitted: String,
        #[tabled(rename = "Residual")]
        residual: String,
    }

    let rows: Vec<PointRow> = model
        .reference_points()
        .iter()
        .map(|&(channel, angle)| {
            let fitted = model.forward(channel);
            PointRow {
                channel: format!("{:.2}", channel),
                angle: format!("{:.4}", angle),
                fitted: format!("{:.4}", fitted),
                residual: format!("{:+.2e}", angle - fitted),
            }
        })
        .collect();
    println!("{}", Table::new(&rows));

    if let Some(path) = &args.output {
        export::calibration_to_csv(&model, path)?;
        output::print_success(&format!("Calibration table saved to '{}'", path.display()));
    }

    output::print_done("Calibration fitted");
    Ok(())
}
