//! # build 命令实现
//!
//! 从逐像素谱文件构建数据集文件。
//!
//! ## 流程
//! 1. 读取扫描参数与谱文件，装配原始立方体
//! 2. 可选行错位补偿
//! 3. 参考峰对齐（`--no-align` 跳过）
//! 4. 自适应基线估计（`--no-baseline` 跳过，读取时重算）
//! 5. 写入 `.xrd` 数据集文件并打印汇总
//!
//! ## 依赖关系
//! - 使用 `cli/build.rs` 定义的参数
//! - 使用 `xrd/builder.rs`, `xrd/align.rs`, `xrd/dataset.rs`, `xrd/store.rs`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::cli::build::BuildArgs;
use crate::commands::SummaryRow;
use crate::error::{XrdError, Result};
use crate::utils::{output, progress};
use crate::xrd::store::{self, DEFAULT_DATASET_FILE};
use crate::xrd::{BaselineEngine, PeakAligner, ScanCubeBuilder, ScanDataset};

use tabled::Table;

/// 执行 build 命令
pub fn execute(args: BuildArgs) -> Result<()> {
    output::print_header("Building scan dataset");

    if !args.dir.is_dir() {
        return Err(XrdError::DirectoryNotFound {
            path: args.dir.display().to_string(),
        });
    }

    let order = args.scan_order();
    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| args.dir.join(DEFAULT_DATASET_FILE));

    let spinner = progress::create_spinner("Reading spectrum files");
    let raw = ScanCubeBuilder::new(&args.dir)
        .with_parameters(&args.parameters)
        .with_pattern(&args.pattern)
        .with_order(order)
        .build();
    spinner.finish_and_clear();
    let raw = raw?.with_row_shift(args.shift_y);

    output::print_info(&format!(
        "Read {} spectra with {} channels ({})",
        raw.geometry,
        raw.n_channels(),
        order
    ));

    let aligner = if args.no_align {
        output::print_skip("Peak alignment disabled");
        None
    } else {
        Some(PeakAligner::new(args.align_channel, args.align_window))
    };
    let engine = BaselineEngine::new(args.baseline_half_width, args.iterations);

    let mut summary = vec![
        SummaryRow::new("Geometry", raw.geometry),
        SummaryRow::new("Channels", raw.n_channels()),
        SummaryRow::new("Scan order", order),
        SummaryRow::new("Row shift", args.shift_y),
    ];

    if args.no_baseline {
        let (aligned, shifts) = match &aligner {
            Some(aligner) => {
                let (aligned, shifts) = aligner.align(&raw.cube)?;
                (aligned, Some(shifts))
            }
            None => (raw.cube.clone(), None),
        };
        if let Some(shifts) = &shifts {
            summary.push(shift_row(shifts));
        }
        summary.push(SummaryRow::new("Baseline", "not stored"));

        store::save_parts(&output_path, raw.geometry, &aligned, None, shifts.as_ref())?;
    } else {
        let spinner = progress::create_spinner("Aligning and estimating baseline");
        let dataset = ScanDataset::from_raw(raw, aligner.as_ref(), &engine);
        spinner.finish_and_clear();
        let dataset = dataset?;

        if let Some(shifts) = dataset.shifts() {
            summary.push(shift_row(shifts));
        }
        summary.push(SummaryRow::new(
            "Baseline",
            format!(
                "half width {}, {} iteration(s)",
                engine.half_width, engine.iterations
            ),
        ));

        store::save(&dataset, &output_path)?;
    }

    summary.push(SummaryRow::new("Output", output_path.display()));
    println!("{}", Table::new(&summary));

    output::print_done(&format!("Dataset written to '{}'", output_path.display()));
    Ok(())
}

fn shift_row(shifts: &crate::xrd::ShiftMap) -> SummaryRow {
    let moved = shifts.iter().filter(|&&f| f != 0).count();
    SummaryRow::new(
        "Aligned pixels",
        format!("{} of {} shifted", moved, shifts.len()),
    )
}
