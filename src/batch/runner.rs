//! # 批量执行器
//!
//! 并行执行批量处理任务（如逐像素导出 ASCII 谱文件）。
//!
//! 每个任务返回 `ProcessResult`，汇总为成功/跳过/失败计数与失败列表。
//!
//! ## 依赖关系
//! - 被 `xrd/export.rs` 调用
//! - 使用 `utils/progress.rs` 创建进度条
//! - 使用 `rayon` 进行并行计算

use crate::error::{XrdError, Result};
use crate::utils::progress;

use rayon::prelude::*;

/// 单个任务的结果，携带任务标识（通常是输出路径）
#[derive(Debug, Clone)]
pub enum ProcessResult {
    Success(String),
    /// 目标已存在且未要求覆盖
    Skipped(String),
    /// (任务标识, 错误信息)
    Failed(String, String),
}

/// 批处理统计
#[derive(Debug, Default)]
pub struct BatchResult {
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
    /// 失败项 (任务标识, 错误信息)，按输入顺序
    pub failures: Vec<(String, String)>,
}

impl BatchResult {
    pub fn merge(&mut self, result: ProcessResult) {
        match result {
            ProcessResult::Success(_) => self.success += 1,
            ProcessResult::Skipped(_) => self.skipped += 1,
            ProcessResult::Failed(item, err) => {
                self.failed += 1;
                self.failures.push((item, err));
            }
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.skipped + self.failed
    }
}

impl FromIterator<ProcessResult> for BatchResult {
    fn from_iter<I: IntoIterator<Item = ProcessResult>>(iter: I) -> Self {
        let mut stats = Self::default();
        for result in iter {
            stats.merge(result);
        }
        stats
    }
}

/// 固定线程数的 rayon 批处理器
pub struct BatchRunner {
    jobs: usize,
    label: String,
    show_progress: bool,
}

impl BatchRunner {
    /// `jobs == 0` 时使用全部 CPU 核
    pub fn new(jobs: usize) -> Self {
        Self {
            jobs: if jobs == 0 { num_cpus::get() } else { jobs },
            label: "Processing".to_string(),
            show_progress: true,
        }
    }

    /// 进度条文字
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    /// 不显示进度条
    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 在独立线程池中处理全部任务；单个任务失败不会中断其余任务
    pub fn run<T, F>(&self, items: Vec<T>, processor: F) -> Result<BatchResult>
    where
        T: Sync,
        F: Fn(&T) -> ProcessResult + Sync + Send,
    {
        let pb = if self.show_progress {
            progress::create_progress_bar(items.len() as u64, &self.label)
        } else {
            indicatif::ProgressBar::hidden()
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| XrdError::Other(format!("cannot start {} worker threads: {}", self.jobs, e)))?;

        let results: Vec<ProcessResult> = pool.install(|| {
            items
                .par_iter()
                .map(|item| {
                    let result = processor(item);
                    pb.inc(1);
                    result
                })
                .collect()
        });
        pb.finish_and_clear();

        let stats: BatchResult = results.into_iter().collect();
        log::debug!(
            "{}: {} ok, {} skipped, {} failed on {} thread(s)",
            self.label,
            stats.success,
            stats.skipped,
            stats.failed,
            self.jobs
        );

        Ok(stats)
    }
}
