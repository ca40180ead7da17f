//! # export 命令实现
//!
//! 并行写出逐像素标定谱文件 `CFrame%04d.dat`。
//!
//! ## 依赖关系
//! - 使用 `cli/export.rs` 定义的参数
//! - 使用 `batch/runner.rs` 并行执行
//! - 使用 `xrd/export.rs` 写出文件

use crate::batch::BatchRunner;
use crate::cli::export::ExportArgs;
use crate::commands::load_dataset;
use crate::error::Result;
use crate::utils::output;
use crate::xrd::{export, CalibrationModel};

/// 执行 export 命令
pub fn execute(args: ExportArgs) -> Result<()> {
    output::print_header("Exporting calibrated frames");

    let dataset = load_dataset(&args.dataset)?;
    let calibration = CalibrationModel::from_file_or_identity(&args.calibration, dataset.n_channels());
    if !calibration.is_calibrated() {
        output::print_warning(&format!(
            "No usable calibration at '{}', writing channel numbers",
            args.calibration.display()
        ));
    }

    let runner = BatchRunner::new(args.jobs).with_label("Writing frames");
    output::print_info(&format!(
        "Writing {} frame(s) to '{}' with {} job(s)",
        dataset.geometry().pixel_count(),
        args.output.display(),
        runner.jobs()
    ));

    let result = export::write_frames(&dataset, &calibration, &args.output, &runner, args.overwrite)?;

    output::print_separator();
    output::print_success(&format!(
        "Export complete: {} written, {} skipped, {} failed",
        result.success, result.skipped, result.failed
    ));

    output::print_failures(&result.failures);

    Ok(())
}
