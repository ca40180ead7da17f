//! # image 命令实现
//!
//! 通道范围积分图像：全通道、单色或 RGB，输出 PNG 或 CSV。
//!
//! ## 依赖关系
//! - 使用 `cli/image.rs` 定义的参数
//! - 使用 `xrd/roi.rs` 的投影与裁剪
//! - 使用 `xrd/plot.rs`, `xrd/export.rs` 写出

use crate::cli::image::{ImageArgs, ImageFormat};
use crate::commands::load_dataset;
use crate::error::{XrdError, Result};
use crate::utils::output;
use crate::xrd::roi::{self, DEFAULT_MONO_RANGE, DEFAULT_RGB_RANGES};
use crate::xrd::{export, plot};

use ndarray::{s, Array3};
use std::ops::Range;

/// 执行 image 命令
pub fn execute(args: ImageArgs) -> Result<()> {
    output::print_header("Channel-range image");

    let dataset = load_dataset(&args.dataset)?;
    let cube = if args.baseline {
        dataset.baseline()
    } else {
        dataset.aligned()
    };
    let pixels = args.crop.map(|rect| rect.snap(dataset.geometry()));

    let ranges: Vec<Range<usize>> = if args.rgb {
        DEFAULT_RGB_RANGES.to_vec()
    } else if args.mono {
        vec![DEFAULT_MONO_RANGE]
    } else {
        args.ranges.clone()
    };

    match ranges.as_slice() {
        [] | [_] => {
            let image = match ranges.first() {
                Some(range) => {
                    output::print_info(&format!("Channels {}..{}", range.start, range.end));
                    roi::project_channel_range(cube, range.clone())
                }
                None => {
                    output::print_info("Integrated intensity over all channels");
                    roi::integrated_image(cube)
                }
            };
            let image = match pixels {
                Some(p) => roi::crop(&image, p),
                None => image,
            };

            match args.format {
                ImageFormat::Png => plot::generate_image_png(&image, &args.output, args.scale)?,
                ImageFormat::Csv => export::image_to_csv(&image, &args.output)?,
            }
        }
        [r, g, b] => {
            if args.format == ImageFormat::Csv {
                return Err(XrdError::InvalidArgument(
                    "CSV output supports a single channel range".to_string(),
                ));
            }
            output::print_info(&format!(
                "RGB channels {}..{}, {}..{}, {}..{}",
                r.start, r.end, g.start, g.end, b.start, b.end
            ));
            let image = roi::project_rgb(cube, &[r.clone(), g.clone(), b.clone()]);
            let image: Array3<u8> = match pixels {
                Some(p) => image.slice(s![p.rows(), p.cols(), ..]).to_owned(),
                None => image,
            };
            plot::generate_rgb_png(&image, &args.output, args.scale)?;
        }
        other => {
            return Err(XrdError::InvalidArgument(format!(
                "expected 0, 1 or 3 channel ranges, got {}",
                other.len()
            )));
        }
    }

    output::print_done(&format!("Image saved to '{}'", args.output.display()));
    Ok(())
}
