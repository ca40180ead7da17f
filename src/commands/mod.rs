//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `xrd/`, `utils/`
//! - 子模块: build, roi, image, calibrate, export

pub mod build;
pub mod calibrate;
pub mod export;
pub mod image;
pub mod roi;

use crate::cli::dataset::DatasetArgs;
use crate::cli::Commands;
use crate::error::Result;
use crate::utils::{output, progress};
use crate::xrd::{store, ScanDataset};

use tabled::Tabled;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Build(args) => build::execute(args),
        Commands::Roi(args) => roi::execute(args),
        Commands::Image(args) => image::execute(args),
        Commands::Calibrate(args) => calibrate::execute(args),
        Commands::Export(args) => export::execute(args),
    }
}

/// 汇总表的一行
#[derive(Tabled)]
pub(crate) struct SummaryRow {
    #[tabled(rename = "Property")]
    pub property: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl SummaryRow {
    pub fn new(property: &str, value: impl ToString) -> Self {
        Self {
            property: property.to_string(),
            value: value.to_string(),
        }
    }
}

/// 读取数据集，按需在基线上重新对齐
pub(crate) fn load_dataset(args: &DatasetArgs) -> Result<ScanDataset> {
    let spinner = progress::create_spinner(&format!("Loading {}", args.dataset.display()));
    let loaded = store::load(&args.dataset, &args.engine());
    spinner.finish_and_clear();
    let mut dataset = loaded?;

    output::print_info(&format!(
        "Loaded {} ({} pixels, {} channels)",
        args.dataset.display(),
        dataset.geometry(),
        dataset.n_channels()
    ));

    if let Some(aligner) = args.realigner() {
        let shifts = dataset.realign_from_baseline(&aligner)?;
        let moved = shifts.iter().filter(|&&f| f != 0).count();
        output::print_info(&format!(
            "Realigned {} pixel(s) on the baseline at channel {}",
            moved, aligner.reference_channel
        ));
    }

    Ok(dataset)
}
